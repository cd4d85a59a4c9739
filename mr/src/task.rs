use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use crate::error::MapError;

/// How a map task lays out records inside each shard.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One `KeyValue` per emitted record, written as soon as it is routed.
    #[default]
    Streaming,
    /// One `KeyValues` per distinct key, written after the whole input is
    /// mapped. Costs memory proportional to the task's output.
    Grouped,
}

/// Everything needed to run one map task.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct MapTask {
    job_name: String,
    map_task: usize,
    input: PathBuf,
    n_reduce: NonZeroUsize,
}

impl MapTask {
    pub fn new(
        job_name: impl Into<String>,
        map_task: usize,
        input: impl Into<PathBuf>,
        n_reduce: NonZeroUsize,
    ) -> MapTask {
        MapTask {
            job_name: job_name.into(),
            map_task,
            input: input.into(),
            n_reduce,
        }
    }

    /// Reads a JSON task descriptor, as handed out by a scheduler.
    pub fn load(path: impl AsRef<Path>) -> Result<MapTask, MapError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| MapError::input_read(path, e))?;
        serde_json::from_str(&contents).map_err(|source| MapError::InvalidTask {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get_job_name(&self) -> &str {
        &self.job_name
    }

    pub fn get_map_task(&self) -> usize {
        self.map_task
    }

    pub fn get_input(&self) -> &Path {
        &self.input
    }

    pub fn get_n_reduce(&self) -> NonZeroUsize {
        self.n_reduce
    }
}
