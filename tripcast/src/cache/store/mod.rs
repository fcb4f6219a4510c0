//! Durable store implementations.
//!
//! - [`MemoryStore`]: process-local map with an optional byte quota
//! - [`FileStore`]: one file per key in a directory, survives restarts

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Bytes charged for one entry against a store quota.
pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}
