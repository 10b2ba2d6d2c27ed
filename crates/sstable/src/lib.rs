//! # SSTable
//!
//! The immutable on-disk run format and everything that touches it: the
//! binary layout ([`format`]), the in-memory cache/reader ([`SstCache`]),
//! the writer and the size-capped [`TableBuilder`], and the k-way
//! [`MergeIterator`] compaction streams through.
//!
//! ## File layout
//!
//! ```text
//! offset 0      u64 time_stamp | u64 count | u64 lower | u64 upper
//! offset 32     raw bloom filter bytes            (BLF_SIZE = 10240)
//! offset 10272  count x { u64 key, u32 offset }   (ascending keys)
//! ...           count x { value bytes, 0x00 }
//! ```
//!
//! All multi-byte fields are little-endian. `offset` is the absolute byte
//! position of the value within the same file. Values are read on demand --
//! only the header, the bloom filter, and the sparse index are ever resident
//! in memory.

pub mod cache;
pub mod format;
pub mod merge;
pub mod writer;

pub use cache::SstCache;
pub use format::SstHeader;
pub use merge::MergeIterator;
pub use writer::{SSTableWriter, TableBuilder};

use std::path::PathBuf;
use thiserror::Error;

/// Typed failure kinds for SSTable I/O.
///
/// These travel inside `anyhow::Error`; callers that care about the kind
/// (the engine treats read failures as fatal at boot) can `downcast_ref`.
#[derive(Debug, Error)]
pub enum SstError {
    /// Open/read/parse failure while loading or consulting a table.
    #[error("cannot read sstable {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    /// Directory or I/O failure while emitting a table.
    #[error("cannot write sstable into {dir}")]
    Write {
        dir: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
