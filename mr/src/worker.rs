use std::{
    cmp::Ordering,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use tracing::{debug, info, info_span, warn};

use crate::{
    codec::ShardSet,
    error::MapError,
    hash::shard_for,
    naming::{DirectoryNaming, ShardNaming},
    record::{group_by_key, KeyValue},
    task::{MapTask, OutputMode},
};

/// User map function: `(input name, input contents) -> records`.
pub type MapFn = fn(&str, &str) -> anyhow::Result<Vec<KeyValue>>;

/// Orders keys inside a shard in grouped mode.
pub type KeyOrder = fn(&str, &str) -> Ordering;

/// What a finished map task left behind, indexed by shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTaskOutput {
    pub files: Vec<PathBuf>,
    /// Values written to each shard: records when streaming, groups when
    /// grouped.
    pub records: Vec<usize>,
}

impl MapTaskOutput {
    pub fn total_records(&self) -> usize {
        self.records.iter().sum()
    }
}

// Worker runs map tasks with one map function and one naming scheme
#[derive(Clone)]
pub struct Worker<N = DirectoryNaming> {
    map_fn: MapFn,
    naming: N,
    mode: OutputMode,
    key_order: KeyOrder,
}

impl Worker<DirectoryNaming> {
    pub fn new(map_fn: MapFn) -> Self {
        Worker {
            map_fn,
            naming: DirectoryNaming::current(),
            mode: OutputMode::Streaming,
            key_order: str::cmp,
        }
    }
}

impl<N: ShardNaming> Worker<N> {
    pub fn with_naming<M: ShardNaming>(self, naming: M) -> Worker<M> {
        Worker {
            map_fn: self.map_fn,
            naming,
            mode: self.mode,
            key_order: self.key_order,
        }
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Only consulted in grouped mode.
    pub fn with_key_order(mut self, key_order: KeyOrder) -> Self {
        self.key_order = key_order;
        self
    }

    pub fn get_naming(&self) -> &N {
        &self.naming
    }

    pub fn get_output_mode(&self) -> OutputMode {
        self.mode
    }

    /// Runs one map task: read the input, map it, route every record to its
    /// shard and finalize all `n_reduce` shard files.
    pub fn do_map(&self, task: &MapTask) -> Result<MapTaskOutput, MapError> {
        let span = info_span!(
            "map_task",
            job = task.get_job_name(),
            map_task = task.get_map_task()
        );
        let _enter = span.enter();

        let result = self.run_map(task);
        match &result {
            Ok(output) => info!(
                "map task done: {} records into {} shards",
                output.total_records(),
                output.files.len()
            ),
            Err(e) => warn!("map task failed: {:?}", e),
        }
        result
    }

    fn run_map(&self, task: &MapTask) -> Result<MapTaskOutput, MapError> {
        let input = task.get_input();
        let n_reduce = task.get_n_reduce();
        info!(
            "map task started on {} with {} reduce shards",
            input.display(),
            n_reduce
        );

        let contents = fs::read_to_string(input).map_err(|e| MapError::input_read(input, e))?;
        let records = self.apply_map_fn(input, &contents)?;
        debug!("map function emitted {} records", records.len());

        let mut shards = ShardSet::create(
            &self.naming,
            task.get_job_name(),
            task.get_map_task(),
            n_reduce,
        )?;
        match self.mode {
            OutputMode::Streaming => write_streaming(&mut shards, records, n_reduce)?,
            OutputMode::Grouped => {
                write_grouped(&mut shards, records, n_reduce, self.key_order)?
            }
        }
        let counts = shards.finish()?;

        let files = (0..n_reduce.get())
            .map(|shard| {
                self.naming
                    .name_for(task.get_job_name(), task.get_map_task(), shard)
            })
            .collect::<Vec<_>>();
        for (file, count) in files.iter().zip(&counts) {
            debug!("{}: {} records", file.display(), count);
        }
        Ok(MapTaskOutput {
            files,
            records: counts,
        })
    }

    fn apply_map_fn(&self, input: &Path, contents: &str) -> Result<Vec<KeyValue>, MapError> {
        let name = input.to_string_lossy();
        (self.map_fn)(&name, contents).map_err(|source| MapError::MapFunction {
            input: input.to_path_buf(),
            source,
        })
    }
}

fn write_streaming(
    shards: &mut ShardSet,
    records: Vec<KeyValue>,
    n_reduce: NonZeroUsize,
) -> Result<(), MapError> {
    for kv in &records {
        shards.append(shard_for(&kv.key, n_reduce), kv)?;
    }
    Ok(())
}

fn write_grouped(
    shards: &mut ShardSet,
    records: Vec<KeyValue>,
    n_reduce: NonZeroUsize,
    key_order: KeyOrder,
) -> Result<(), MapError> {
    for group in group_by_key(records, key_order) {
        shards.append(shard_for(&group.key, n_reduce), &group)?;
    }
    Ok(())
}

/// Runs one streaming map task, writing `mrtmp.<job>-<map>-<shard>` files to
/// the working directory.
pub fn execute_map_task(
    job_name: &str,
    map_task: usize,
    input_path: impl Into<PathBuf>,
    n_reduce: NonZeroUsize,
    map_fn: MapFn,
) -> Result<MapTaskOutput, MapError> {
    let task = MapTask::new(job_name, map_task, input_path, n_reduce);
    Worker::new(map_fn).do_map(&task)
}
