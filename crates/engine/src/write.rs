//! Write path: `put()`, `del()`, `reset()`, `force_flush()`, and the
//! internal `flush()`.
//!
//! All mutations land in the memtable; the flush decision is made *before*
//! mutating, from the memtable's own prediction of its post-put serialized
//! size, so a flushed table never exceeds the memory budget.

use anyhow::{ensure, Context, Result};
use memtable::MemTable;
use sstable::format::LEVEL_PREFIX;
use sstable::SSTableWriter;
use std::fs;
use tracing::{debug, info};

use crate::{Engine, TOMBSTONE};

impl Engine {
    /// Inserts or updates a key.
    ///
    /// Flushes the memtable first when this put would bring its serialized
    /// size up to the memory budget.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure during an induced flush or
    /// compaction; the write itself cannot fail.
    pub fn put(&mut self, key: u64, value: Vec<u8>) -> Result<()> {
        ensure!(!value.is_empty(), "value must not be empty");
        // Values are stored null-terminated on disk; an embedded NUL would
        // truncate silently on read.
        ensure!(
            !value.contains(&0u8),
            "value must not contain NUL bytes"
        );

        if self.mem.predict_byte_size(key, &value) >= self.config.mem_max {
            self.flush()?;
        }
        self.mem.put(key, value);
        Ok(())
    }

    /// Deletes a key by writing a tombstone.
    ///
    /// Returns `true` iff a live value was visible somewhere in the store.
    /// A key that is absent -- or already tombstoned -- returns `false` and
    /// writes nothing.
    pub fn del(&mut self, key: u64) -> Result<bool> {
        if self.get(key)?.is_none() {
            return Ok(false);
        }
        self.put(key, TOMBSTONE.to_vec())?;
        Ok(true)
    }

    /// Drops every key-value pair and every table, returning the store to
    /// its freshly-created state.
    ///
    /// The data root itself is kept; the `level-N/` directories are
    /// removed.
    pub fn reset(&mut self) -> Result<()> {
        self.caches.clear();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_level_dir = path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LEVEL_PREFIX));
            if is_level_dir {
                fs::remove_dir_all(&path)
                    .with_context(|| format!("removing {}", path.display()))?;
            }
        }
        self.cur_ts = 1;
        self.mem = MemTable::new(1);
        info!(data_dir = %self.data_dir.display(), "store reset");
        Ok(())
    }

    /// Flushes the memtable now, regardless of its size. No-op when empty.
    pub fn force_flush(&mut self) -> Result<()> {
        self.flush()
    }

    /// Serializes the memtable into one level-0 table, installs a fresh
    /// memtable one timestamp later, and rebalances the levels.
    ///
    /// No-op when the memtable is empty: a value whose entry alone exceeds
    /// the memory budget trips the flush predicate before anything has been
    /// inserted, and there is nothing to persist yet.
    pub(crate) fn flush(&mut self) -> Result<()> {
        if self.mem.is_empty() {
            return Ok(());
        }
        let cache = SSTableWriter::write_from_memtable(&self.data_dir, &self.mem)?;
        debug!(
            path = %cache.path.display(),
            time_stamp = cache.header.time_stamp,
            count = cache.header.count,
            "flushed memtable"
        );

        self.caches.push(cache);
        self.caches.sort_by(sstable::SstCache::cmp_freshness);

        self.cur_ts = self.mem.time_stamp() + 1;
        self.mem = MemTable::new(self.cur_ts);

        self.check_level(0)
    }
}
