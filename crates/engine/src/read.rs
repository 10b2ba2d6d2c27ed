//! Read path: `get()` and `scan()`.
//!
//! Point lookups consult the memtable first, then the cache set from
//! freshest to stalest; the first index hit wins. A tombstone hit at any
//! tier means "not found" -- it shadows every staler value. Level 0 is
//! tiered, so several level-0 tables may cover the probed key; the
//! freshness walk, not the range check, is what picks the right one.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::{Engine, TOMBSTONE};

/// Translates the tombstone literal to "not found".
fn live(value: Vec<u8>) -> Option<Vec<u8>> {
    (value != TOMBSTONE).then_some(value)
}

impl Engine {
    /// Looks up a key, returning the freshest live value.
    ///
    /// # Errors
    ///
    /// Returns an error if reading a table value fails.
    pub fn get(&self, key: u64) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.mem.get(key) {
            return Ok(live(value.to_vec()));
        }

        for cache in self.caches.iter().rev() {
            if let Some(offset) = cache.search(key) {
                return Ok(live(cache.read_at(offset)?));
            }
        }

        Ok(None)
    }

    /// Collects every live pair with key in `[lo, hi]`, ascending.
    ///
    /// Each key resolves exactly as `get` would: the memtable is seeded
    /// first, then each cache is replayed from freshest to stalest and only
    /// keys not yet claimed are read. Tombstones are filtered at the end so
    /// a fresh tombstone suppresses every staler value of its key.
    pub fn scan(&self, lo: u64, hi: u64) -> Result<Vec<(u64, Vec<u8>)>> {
        let mut merged: BTreeMap<u64, Vec<u8>> = BTreeMap::new();

        for (key, value) in self.mem.iter() {
            if key < lo {
                continue;
            }
            if key > hi {
                break;
            }
            merged.insert(key, value.clone());
        }

        for cache in self.caches.iter().rev() {
            let start = cache.indices.partition_point(|&(k, _)| k < lo);
            for &(key, offset) in &cache.indices[start..] {
                if key > hi {
                    break;
                }
                if !merged.contains_key(&key) {
                    merged.insert(key, cache.read_at(offset)?);
                }
            }
        }

        Ok(merged
            .into_iter()
            .filter(|(_, v)| v.as_slice() != TOMBSTONE)
            .collect())
    }
}
