//! Binary layout constants and the 32-byte table header.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rand::Rng;
use std::io::{Read, Result as IoResult, Write};
use std::path::{Path, PathBuf};

pub use bloom::BLF_SIZE;

/// Serialized size of [`SstHeader`].
pub const HEADER_SIZE: usize = 32;

/// Serialized size of one sparse-index entry: `u64` key + `u32` offset.
pub const INDEX_ENTRY_SIZE: usize = 12;

/// File extension of every table.
pub const SST_SUFFIX: &str = "sst";

/// Directory-name prefix encoding level membership (`level-0`, `level-1`, ...).
pub const LEVEL_PREFIX: &str = "level-";

/// The fixed 32-byte header at the start of every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstHeader {
    /// Origin timestamp: the memtable's for a flush, the maximum input
    /// timestamp for a compaction output.
    pub time_stamp: u64,
    /// Number of `(key, offset)` index entries and of values.
    pub count: u64,
    /// Smallest key in the table.
    pub lower: u64,
    /// Largest key in the table.
    pub upper: u64,
}

impl SstHeader {
    pub fn write_to<W: Write>(&self, w: &mut W) -> IoResult<()> {
        w.write_u64::<LittleEndian>(self.time_stamp)?;
        w.write_u64::<LittleEndian>(self.count)?;
        w.write_u64::<LittleEndian>(self.lower)?;
        w.write_u64::<LittleEndian>(self.upper)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> IoResult<Self> {
        Ok(Self {
            time_stamp: r.read_u64::<LittleEndian>()?,
            count: r.read_u64::<LittleEndian>()?,
            lower: r.read_u64::<LittleEndian>()?,
            upper: r.read_u64::<LittleEndian>()?,
        })
    }
}

/// Absolute byte offset of the first value in a table holding `count`
/// entries.
#[must_use]
pub fn value_base(count: u64) -> u64 {
    (HEADER_SIZE + BLF_SIZE) as u64 + count * INDEX_ENTRY_SIZE as u64
}

/// The `level-N` directory under `root`.
#[must_use]
pub fn level_dir(root: &Path, level: usize) -> PathBuf {
    root.join(format!("{LEVEL_PREFIX}{level}"))
}

/// Picks a fresh `<six hex digits>.sst` path inside `dir`.
///
/// Tokens are random, not content-addressed; a collision within the
/// directory is resolved by drawing again.
#[must_use]
pub fn fresh_table_path(dir: &Path) -> PathBuf {
    let mut rng = rand::thread_rng();
    loop {
        let token: u32 = rng.gen_range(0..0x100_0000);
        let path = dir.join(format!("{token:06x}.{SST_SUFFIX}"));
        if !path.exists() {
            return path;
        }
    }
}
