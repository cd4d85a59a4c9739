//! Where intermediate files live.
//!
//! The reduce side recomputes the same names to find what the map side
//! wrote, so every implementation must be pure and injective over
//! `(job_name, map_task, shard)`.

use std::path::{Path, PathBuf};

/// Name of the intermediate file map task `map_task` writes for reduce task
/// `reduce_task`.
pub fn reduce_name(job_name: &str, map_task: usize, reduce_task: usize) -> String {
    format!("mrtmp.{}-{}-{}", job_name, map_task, reduce_task)
}

pub trait ShardNaming {
    fn name_for(&self, job_name: &str, map_task: usize, shard: usize) -> PathBuf;
}

impl<F> ShardNaming for F
where
    F: Fn(&str, usize, usize) -> PathBuf,
{
    fn name_for(&self, job_name: &str, map_task: usize, shard: usize) -> PathBuf {
        self(job_name, map_task, shard)
    }
}

/// `reduce_name` files under a single directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNaming {
    root: PathBuf,
}

impl DirectoryNaming {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryNaming { root: root.into() }
    }

    /// Names relative to the working directory.
    pub fn current() -> Self {
        DirectoryNaming::new(".")
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }
}

impl Default for DirectoryNaming {
    fn default() -> Self {
        DirectoryNaming::current()
    }
}

impl ShardNaming for DirectoryNaming {
    fn name_for(&self, job_name: &str, map_task: usize, shard: usize) -> PathBuf {
        self.root.join(reduce_name(job_name, map_task, shard))
    }
}
