//! # Bloom Filter
//!
//! A fixed-size probabilistic set over `u64` keys.
//!
//! A bloom filter can tell you with certainty that a key is **not** in the
//! set (no false negatives), but may occasionally report that a key **is**
//! in the set when it isn't (false positives). False positives only cost an
//! extra index lookup on the read path; false negatives would lose data, and
//! cannot occur.
//!
//! ## Usage in StrataKV
//!
//! Every SSTable embeds the 10 KiB filter built from its keys, and the
//! memory table maintains one incrementally as keys are inserted. Point
//! lookups consult the filter before touching the sparse index -- a negative
//! answer skips the table entirely.
//!
//! The filter is deliberately *fixed-size* so that it occupies a known byte
//! range in the SSTable layout: serialization is the raw bit array, nothing
//! more.

use murmur3::murmur3_x64_128;
use std::io::{self, Cursor, Read, Write};

/// Size of the filter's bit array in bytes. Fixed by the SSTable layout.
pub const BLF_SIZE: usize = 10240;

/// Total number of bits in the filter.
const NUM_BITS: u64 = (BLF_SIZE as u64) * 8;

/// Seed for the Murmur3 hash. Fixed so that filters written by one process
/// are readable by another.
const BLOOM_SEED: u32 = 1;

/// A bloom filter backed by a `BLF_SIZE`-byte bit array.
///
/// Each key sets/tests four bits, one per 32-bit lane of the 128-bit
/// Murmur3 hash of its little-endian encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct BloomFilter {
    bits: Vec<u8>,
}

impl BloomFilter {
    /// Creates an empty filter (all bits clear).
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: vec![0u8; BLF_SIZE],
        }
    }

    /// Inserts a key into the filter.
    pub fn insert(&mut self, key: u64) {
        for lane in hash_lanes(key) {
            let idx = u64::from(lane) % NUM_BITS;
            self.set_bit(idx);
        }
    }

    /// Returns `true` if the key **might** be in the set, `false` if it is
    /// **definitely not** in the set.
    #[must_use]
    pub fn may_contain(&self, key: u64) -> bool {
        hash_lanes(key).into_iter().all(|lane| {
            let idx = u64::from(lane) % NUM_BITS;
            self.get_bit(idx)
        })
    }

    /// Borrows the raw bit array.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Serializes the filter: the raw `BLF_SIZE` bytes, nothing else.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.bits)
    }

    /// Deserializes a filter by reading exactly `BLF_SIZE` bytes.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut filter = Self::new();
        r.read_exact(&mut filter.bits)?;
        Ok(filter)
    }

    fn set_bit(&mut self, idx: u64) {
        let byte = (idx / 8) as usize;
        let bit = (idx % 8) as u8;
        self.bits[byte] |= 1 << bit;
    }

    fn get_bit(&self, idx: u64) -> bool {
        let byte = (idx / 8) as usize;
        let bit = (idx % 8) as u8;
        (self.bits[byte] >> bit) & 1 == 1
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set: u32 = self.bits.iter().map(|b| b.count_ones()).sum();
        f.debug_struct("BloomFilter")
            .field("bytes", &BLF_SIZE)
            .field("bits_set", &set)
            .finish()
    }
}

/// The four 32-bit lanes of Murmur3-x64-128 over the key's 8 LE bytes.
fn hash_lanes(key: u64) -> [u32; 4] {
    let mut cursor = Cursor::new(key.to_le_bytes());
    // Reading from an in-memory buffer cannot fail.
    let h = murmur3_x64_128(&mut cursor, BLOOM_SEED).expect("hash of in-memory bytes");
    [h as u32, (h >> 32) as u32, (h >> 64) as u32, (h >> 96) as u32]
}
