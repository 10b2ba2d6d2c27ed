//! In-memory projection of one on-disk table.

use anyhow::{bail, Context, Result};
use bloom::BloomFilter;
use byteorder::{LittleEndian, ReadBytesExt};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{self, SstHeader};
use crate::SstError;

/// Everything the read path keeps resident for one table: the header, the
/// bloom filter, and the sparse index. Values stay on disk and are fetched
/// by [`read_at`](SstCache::read_at) per lookup.
///
/// Each cache exclusively owns its file: the engine's active set is the
/// sole authority on which tables are live, and a table adopted as
/// compaction input leaves the set before its file is unlinked.
#[derive(Debug, Clone)]
pub struct SstCache {
    /// The level whose directory holds the file.
    pub level: usize,
    pub header: SstHeader,
    pub bloom: BloomFilter,
    /// `(key, absolute value offset)`, ascending by key.
    pub indices: Vec<(u64, u32)>,
    /// Full path of the owned `.sst` file.
    pub path: PathBuf,
}

impl SstCache {
    /// Reads the header, bloom filter, and sparse index of the table at
    /// `path`. Values are not touched.
    ///
    /// # Errors
    ///
    /// Any open failure, short read, or count that cannot fit the file
    /// yields [`SstError::Read`]. The engine treats that as fatal at boot.
    pub fn load<P: AsRef<Path>>(path: P, level: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        Self::load_inner(&path, level).map_err(|source| {
            SstError::Read {
                path: path.clone(),
                source,
            }
            .into()
        })
    }

    fn load_inner(path: &Path, level: usize) -> Result<Self> {
        let file = File::open(path)?;
        let filesize = file.metadata()?.len();

        let fixed = (format::HEADER_SIZE + format::BLF_SIZE) as u64;
        if filesize < fixed {
            bail!("file too small ({filesize} bytes) to hold header and bloom filter");
        }

        let mut r = BufReader::new(file);
        let header = SstHeader::read_from(&mut r)?;
        if header.count > (filesize - fixed) / format::INDEX_ENTRY_SIZE as u64 {
            bail!("count {} does not fit in {filesize} bytes", header.count);
        }

        let bloom = BloomFilter::read_from(&mut r)?;

        let mut indices = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            let key = r.read_u64::<LittleEndian>()?;
            let offset = r.read_u32::<LittleEndian>()?;
            indices.push((key, offset));
        }

        Ok(Self {
            level,
            header,
            bloom,
            indices,
            path: path.to_path_buf(),
        })
    }

    /// Looks up `key` in the sparse index.
    ///
    /// Rejects on a range miss, then on a bloom miss (unless the
    /// `bloom-bypass` feature is on), then binary-searches for an exact
    /// match. Returns the value's absolute offset on a hit.
    #[must_use]
    pub fn search(&self, key: u64) -> Option<u32> {
        if key < self.header.lower || key > self.header.upper {
            return None;
        }
        if !cfg!(feature = "bloom-bypass") && !self.bloom.may_contain(key) {
            return None;
        }
        self.indices
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|i| self.indices[i].1)
    }

    /// Reads the value at `offset`: seek, then accumulate bytes up to the
    /// 0x00 terminator (excluded).
    ///
    /// Opens a fresh handle per call; the handle never outlives the read.
    pub fn read_at(&self, offset: u32) -> Result<Vec<u8>> {
        self.read_at_inner(offset).map_err(|source| {
            SstError::Read {
                path: self.path.clone(),
                source,
            }
            .into()
        })
    }

    fn read_at_inner(&self, offset: u32) -> Result<Vec<u8>> {
        let mut r = BufReader::new(File::open(&self.path)?);
        r.seek(SeekFrom::Start(u64::from(offset)))?;
        read_value(&mut r)
    }

    /// Bulk-reads the whole `(key, value)` list in index order. Used by
    /// compaction, which consumes every input table in full.
    pub fn read_all(&self) -> Result<Vec<(u64, Vec<u8>)>> {
        self.read_all_inner().map_err(|source| {
            SstError::Read {
                path: self.path.clone(),
                source,
            }
            .into()
        })
    }

    fn read_all_inner(&self) -> Result<Vec<(u64, Vec<u8>)>> {
        let mut out = Vec::with_capacity(self.indices.len());
        let Some(&(_, first_offset)) = self.indices.first() else {
            return Ok(out);
        };
        let mut r = BufReader::new(File::open(&self.path)?);
        r.seek(SeekFrom::Start(u64::from(first_offset)))?;
        for &(key, _) in &self.indices {
            out.push((key, read_value(&mut r)?));
        }
        Ok(out)
    }

    /// The freshness order of the active set.
    ///
    /// `a < b` iff `(b.level, a.ts, a.count) < (a.level, b.ts, b.count)`:
    /// lower level, then higher timestamp, then higher count is fresher
    /// (greater). Sorting ascending puts the stalest cache first; readers
    /// walk the set in reverse.
    #[must_use]
    pub fn cmp_freshness(a: &Self, b: &Self) -> Ordering {
        (b.level, a.header.time_stamp, a.header.count).cmp(&(
            a.level,
            b.header.time_stamp,
            b.header.count,
        ))
    }

    /// `true` when the key ranges of `self` and `other` intersect.
    #[must_use]
    pub fn overlaps(&self, lower: u64, upper: u64) -> bool {
        self.header.lower <= upper && self.header.upper >= lower
    }
}

/// Reads one null-terminated value from `r`.
fn read_value<R: BufRead>(r: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.read_until(0, &mut buf)
        .context("reading null-terminated value")?;
    match buf.pop() {
        Some(0) => Ok(buf),
        _ => bail!("value region ended without a 0x00 terminator"),
    }
}
