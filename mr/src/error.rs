use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can abort a map task. None of these are retried here;
/// the caller decides whether to run the task again.
#[derive(Error)]
pub enum MapError {
    #[error("failed to read map input {}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write intermediate file {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("map function failed on {}", input.display())]
    MapFunction {
        input: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid map task descriptor {}", path.display())]
    InvalidTask {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("shard {shard} out of range for {n_reduce} reduce tasks")]
    ShardOutOfRange { shard: usize, n_reduce: usize },

    #[error("map task {map_task} panicked")]
    TaskPanicked { map_task: usize },
}

impl std::fmt::Debug for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(f, self)
    }
}

pub fn error_chain_fmt(
    f: &mut std::fmt::Formatter<'_>,
    e: &impl std::error::Error,
) -> std::fmt::Result {
    write!(f, "{}", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        write!(f, "\n  caused by: {}", cause)?;
        current = cause.source();
    }
    Ok(())
}

impl MapError {
    pub(crate) fn input_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MapError::InputRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MapError::OutputWrite {
            path: path.into(),
            source,
        }
    }
}
