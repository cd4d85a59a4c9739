//! Key to shard assignment.
//!
//! The hash is 32-bit FNV-1a with the sign bit cleared, which keeps shard
//! indexes identical across processes, machines and the other
//! implementations of this file format.

use std::num::NonZeroUsize;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

pub fn ihash(key: &str) -> u32 {
    let hash = key.as_bytes().iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    });
    hash & 0x7fff_ffff
}

/// Shard (reduce task index) a key belongs to, always in `[0, n_reduce)`.
pub fn shard_for(key: &str, n_reduce: NonZeroUsize) -> usize {
    ihash(key) as usize % n_reduce.get()
}
