//! Table emission: one-shot writes for flush, and the size-capped
//! [`TableBuilder`] compaction streams into.

use anyhow::{Context, Result};
use bloom::BloomFilter;
use byteorder::{LittleEndian, WriteBytesExt};
use memtable::MemTable;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cache::SstCache;
use crate::format::{self, SstHeader};
use crate::SstError;

pub struct SSTableWriter {}

impl SSTableWriter {
    /// Serializes a memtable into exactly one table under `<root>/level-0/`,
    /// carrying the memtable's timestamp, count, range, and bloom filter.
    ///
    /// Returns the cache of the new table; the caller appends it to the
    /// active set.
    ///
    /// # Errors
    ///
    /// [`SstError::Write`] on directory or I/O failure. The memtable must
    /// not be empty.
    pub fn write_from_memtable(root: &Path, mem: &MemTable) -> Result<SstCache> {
        let entries: Vec<(u64, Vec<u8>)> = mem.iter().map(|(k, v)| (k, v.clone())).collect();
        Self::write_table(
            &format::level_dir(root, 0),
            0,
            mem.time_stamp(),
            &entries,
            mem.bloom(),
        )
    }

    /// Writes one table holding `entries` (ascending by key, non-empty)
    /// into `dir`, creating the directory if needed.
    ///
    /// Layout and offsets:
    ///
    /// ```text
    /// header | bloom | index | values
    /// offset(i) = 32 + BLF_SIZE + 12 * count + sum(len(v_j) + 1, j < i)
    /// ```
    pub fn write_table(
        dir: &Path,
        level: usize,
        time_stamp: u64,
        entries: &[(u64, Vec<u8>)],
        bloom: &BloomFilter,
    ) -> Result<SstCache> {
        debug_assert!(!entries.is_empty());
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));

        Self::write_table_inner(dir, level, time_stamp, entries, bloom).map_err(|source| {
            SstError::Write {
                dir: dir.to_path_buf(),
                source,
            }
            .into()
        })
    }

    fn write_table_inner(
        dir: &Path,
        level: usize,
        time_stamp: u64,
        entries: &[(u64, Vec<u8>)],
        bloom: &BloomFilter,
    ) -> Result<SstCache> {
        fs::create_dir_all(dir).context("creating level directory")?;
        let path = format::fresh_table_path(dir);

        let count = entries.len() as u64;
        let header = SstHeader {
            time_stamp,
            count,
            lower: entries[0].0,
            upper: entries[entries.len() - 1].0,
        };

        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut w = BufWriter::new(file);

        header.write_to(&mut w)?;
        bloom.write_to(&mut w)?;

        // Index entries, computing each value's absolute offset as we go.
        let mut indices = Vec::with_capacity(entries.len());
        let mut offset = format::value_base(count) as u32;
        for (key, value) in entries {
            w.write_u64::<LittleEndian>(*key)?;
            w.write_u32::<LittleEndian>(offset)?;
            indices.push((*key, offset));
            offset += value.len() as u32 + 1;
        }

        for (_, value) in entries {
            w.write_all(value)?;
            w.write_u8(0)?;
        }

        w.flush().context("flushing table")?;
        w.get_ref().sync_all()?;

        Ok(SstCache {
            level,
            header,
            bloom: bloom.clone(),
            indices,
            path,
        })
    }
}

/// Accumulates merged `(key, value)` pairs and cuts a new table whenever the
/// next pair would push the serialized size past the byte budget.
///
/// Every emitted table gets a bloom filter built from its own keys and the
/// single shared timestamp (compaction outputs all inherit the maximum input
/// timestamp).
pub struct TableBuilder {
    dir: PathBuf,
    level: usize,
    time_stamp: u64,
    max_bytes: usize,
    pending: Vec<(u64, Vec<u8>)>,
    byte_size: usize,
}

impl TableBuilder {
    /// Base serialized size of a table with no entries.
    const BASE_SIZE: usize = format::HEADER_SIZE + format::BLF_SIZE;

    pub fn new(dir: PathBuf, level: usize, time_stamp: u64, max_bytes: usize) -> Self {
        Self {
            dir,
            level,
            time_stamp,
            max_bytes,
            pending: Vec::new(),
            byte_size: Self::BASE_SIZE,
        }
    }

    /// Appends one pair. Keys must arrive in strictly ascending order.
    ///
    /// Returns the cache of a freshly cut table when the pair did not fit
    /// into the current one. A table always accepts at least one entry:
    /// a pair whose serialized size alone exceeds the budget gets an
    /// over-budget single-entry table rather than being dropped.
    pub fn append(&mut self, key: u64, value: Vec<u8>) -> Result<Option<SstCache>> {
        let entry_size = format::INDEX_ENTRY_SIZE + value.len() + 1;
        if self.pending.is_empty() || self.byte_size + entry_size <= self.max_bytes {
            self.byte_size += entry_size;
            self.pending.push((key, value));
            return Ok(None);
        }

        let cache = self.emit()?;
        self.byte_size = Self::BASE_SIZE + entry_size;
        self.pending.push((key, value));
        Ok(Some(cache))
    }

    /// Cuts a table from whatever is pending, or returns `None` when
    /// nothing is.
    pub fn finish(mut self) -> Result<Option<SstCache>> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.emit().map(Some)
    }

    fn emit(&mut self) -> Result<SstCache> {
        let mut bloom = BloomFilter::new();
        for &(key, _) in &self.pending {
            bloom.insert(key);
        }
        let entries = std::mem::take(&mut self.pending);
        SSTableWriter::write_table(&self.dir, self.level, self.time_stamp, &entries, &bloom)
    }
}
