//! Intermediate file encoding.
//!
//! A shard is a stream of JSON values separated by newlines, decodable one
//! value at a time. Writers stage into a temporary file next to the final
//! path and only rename it into place on `finish`, so a reader never sees a
//! half-written shard under its final name.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{error::MapError, naming::ShardNaming};

pub struct ShardWriter {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
    records: usize,
}

impl ShardWriter {
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let staged = tempfile::Builder::new()
            .prefix(".mrtmp-")
            .suffix(".partial")
            .tempfile_in(&dir)?;
        Ok(ShardWriter {
            path,
            writer: BufWriter::new(staged),
            records: 0,
        })
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn get_records(&self) -> usize {
        self.records
    }

    pub fn append<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    /// Flushes and syncs the staged file. Nothing is visible under the final
    /// path yet.
    fn seal(self) -> io::Result<SealedShard> {
        let staged = self.writer.into_inner().map_err(|e| e.into_error())?;
        staged.as_file().sync_all()?;
        Ok(SealedShard {
            path: self.path,
            staged,
            records: self.records,
        })
    }

    /// Seals the shard and moves it to its final path. Returns the number of
    /// values written.
    pub fn finish(self) -> io::Result<usize> {
        self.seal()?.persist()
    }
}

struct SealedShard {
    path: PathBuf,
    staged: NamedTempFile,
    records: usize,
}

impl SealedShard {
    fn persist(self) -> io::Result<usize> {
        self.staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(self.records)
    }
}

/// The `n_reduce` shard writers of one map task.
///
/// Dropping the set before `finish` discards every staged file.
pub struct ShardSet {
    shards: Vec<ShardWriter>,
}

impl ShardSet {
    pub fn create<N>(
        naming: &N,
        job_name: &str,
        map_task: usize,
        n_reduce: NonZeroUsize,
    ) -> Result<Self, MapError>
    where
        N: ShardNaming + ?Sized,
    {
        let mut shards = Vec::with_capacity(n_reduce.get());
        for shard in 0..n_reduce.get() {
            let path = naming.name_for(job_name, map_task, shard);
            let writer =
                ShardWriter::create(&path).map_err(|e| MapError::output_write(&path, e))?;
            shards.push(writer);
        }
        Ok(ShardSet { shards })
    }

    pub fn append<T: Serialize>(&mut self, shard: usize, record: &T) -> Result<(), MapError> {
        let n_reduce = self.shards.len();
        let writer = self
            .shards
            .get_mut(shard)
            .ok_or(MapError::ShardOutOfRange { shard, n_reduce })?;
        writer
            .append(record)
            .map_err(|e| MapError::output_write(writer.get_path(), e))
    }

    /// Seals every shard, then renames them all into place. Returns the
    /// number of values written per shard.
    pub fn finish(self) -> Result<Vec<usize>, MapError> {
        let mut sealed = Vec::with_capacity(self.shards.len());
        for writer in self.shards {
            let path = writer.get_path().to_path_buf();
            sealed.push(writer.seal().map_err(|e| MapError::output_write(path, e))?);
        }

        let mut records = Vec::with_capacity(sealed.len());
        for shard in sealed {
            let path = shard.path.clone();
            let count = shard
                .persist()
                .map_err(|e| MapError::output_write(&path, e))?;
            debug!("finalized {} with {} records", path.display(), count);
            records.push(count);
        }
        Ok(records)
    }
}

/// Incremental decoder over one shard file.
pub struct ShardReader<T> {
    inner: serde_json::StreamDeserializer<'static, serde_json::de::IoRead<BufReader<File>>, T>,
}

impl<T: DeserializeOwned> Iterator for ShardReader<T> {
    type Item = io::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|r| r.map_err(io::Error::from))
    }
}

pub fn read_shard<T: DeserializeOwned>(path: impl AsRef<Path>) -> io::Result<ShardReader<T>> {
    let file = File::open(path)?;
    let inner = serde_json::Deserializer::from_reader(BufReader::new(file)).into_iter::<T>();
    Ok(ShardReader { inner })
}
