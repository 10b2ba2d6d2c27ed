//! # Engine - StrataKV Storage Engine
//!
//! The central orchestrator tying together the [`memtable`] and [`sstable`]
//! crates into a complete LSM-tree key-value store over `u64` keys and
//! byte-string values.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌──────────────────────────────────────────────────┐
//! │                     ENGINE                       │
//! │                                                  │
//! │ write.rs → predict size → MemTable upsert        │
//! │              |                                   │
//! │              |  (next put would hit mem_max?)    │
//! │              |            yes                    │
//! │              v                                   │
//! │           flush() → one level-0 SSTable          │
//! │              |                                   │
//! │              v                                   │
//! │           check_level(0) → compact(L, L+1) …     │
//! │                                                  │
//! │ read.rs → MemTable → caches freshest→stalest     │
//! │            (first match wins)                    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module          | Purpose                                             |
//! |-----------------|-----------------------------------------------------|
//! | [`lib.rs`]      | `Engine` struct, constants, accessors, `Debug`, `Drop` |
//! | [`boot`]        | Cold start: level-directory scan, cache loading     |
//! | [`write`]       | `put()`, `del()`, `reset()`, internal `flush()`     |
//! | [`read`]        | `get()`, `scan()`                                   |
//! | [`compaction`]  | `check_level()` / `compact()`, tiering + leveling   |
//! | [`config`]      | Per-level `(max_files, policy)` table, memory budget |
//!
//! ## Freshness
//!
//! Deletions are tombstone writes, so the same key may exist in several
//! tiers at once and the engine must always believe the freshest one. The
//! active cache set is kept sorted by the freshness order (lower level,
//! then higher timestamp, then higher count is fresher) and the read path
//! walks it from freshest to stalest. Level 0 is tiered and its tables may
//! overlap, so a range hit there never short-circuits the walk -- only an
//! index hit does.

mod boot;
mod compaction;
mod config;
mod error;
mod read;
mod write;

pub use config::{Config, LevelLimit, Policy};
pub use error::EngineError;
pub use memtable::TOMBSTONE;

use anyhow::Result;
use memtable::MemTable;
use sstable::SstCache;
use std::path::{Path, PathBuf};

/// Memory-table byte budget: a `put` that would reach this size flushes
/// first. Also caps the size of every compaction output file.
pub const MEMORY_MAXSIZE: usize = 2 * 1024 * 1024;

/// The storage engine.
///
/// Single-threaded and cooperative: every public call runs to completion
/// before another begins; flush and compaction happen synchronously inside
/// `put`/`del`.
pub struct Engine {
    /// Data root holding the `level-N/` directories.
    pub(crate) data_dir: PathBuf,
    /// The mutable tier.
    pub(crate) mem: MemTable,
    /// Active cache set: the sole authority on which tables are live.
    /// Sorted ascending by freshness (stalest first); readers walk it in
    /// reverse.
    pub(crate) caches: Vec<SstCache>,
    /// Timestamp the next memtable will carry.
    pub(crate) cur_ts: u64,
    pub(crate) config: Config,
}

impl Engine {
    /// Opens the engine on `data_dir` with the default configuration.
    ///
    /// # Errors
    ///
    /// [`EngineError::DataRootMissing`] when the directory does not exist;
    /// any table that fails to load is fatal here.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        Self::open_with_config(data_dir, Config::default())
    }

    /// Opens the engine with an explicit [`Config`].
    pub fn open_with_config<P: AsRef<Path>>(data_dir: P, config: Config) -> Result<Self> {
        boot::boot(data_dir.as_ref(), config)
    }

    /// Timestamp of the current memtable.
    #[must_use]
    pub fn time_stamp(&self) -> u64 {
        self.cur_ts
    }

    /// Number of live tables across all levels.
    #[must_use]
    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }

    /// Number of live tables at one level.
    #[must_use]
    pub fn level_count(&self, level: usize) -> usize {
        self.caches.iter().filter(|c| c.level == level).count()
    }

    /// Current serialized size of the memtable in bytes.
    #[must_use]
    pub fn mem_byte_size(&self) -> usize {
        self.mem.byte_size()
    }

    /// Number of distinct keys in the memtable.
    #[must_use]
    pub fn mem_len(&self) -> u64 {
        self.mem.len()
    }

    /// The data root this engine was opened on.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut per_level: Vec<(usize, usize)> = Vec::new();
        for c in &self.caches {
            match per_level.iter_mut().find(|(l, _)| *l == c.level) {
                Some((_, n)) => *n += 1,
                None => per_level.push((c.level, 1)),
            }
        }
        per_level.sort_unstable();
        f.debug_struct("Engine")
            .field("data_dir", &self.data_dir)
            .field("cur_ts", &self.cur_ts)
            .field("mem_len", &self.mem.len())
            .field("mem_byte_size", &self.mem.byte_size())
            .field("caches", &self.caches.len())
            .field("per_level", &per_level)
            .finish()
    }
}

/// Best-effort flush on drop.
///
/// Remaining memtable contents are persisted so they survive the process;
/// errors are ignored because `Drop` cannot propagate them.
impl Drop for Engine {
    fn drop(&mut self) {
        if !self.mem.is_empty() {
            let _ = self.flush();
        }
    }
}

#[cfg(test)]
mod tests;
