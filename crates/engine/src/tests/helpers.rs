use crate::{Config, LevelLimit, Policy};
use anyhow::Result;
use bloom::BloomFilter;
use sstable::format::level_dir;
use sstable::{SSTableWriter, SstCache};
use std::fs;
use std::path::Path;

/// A configuration whose memtable budget holds only `extra` bytes of
/// entries past the fixed header + bloom base, so tests can force flushes
/// with a handful of puts.
pub fn small_config(extra: usize) -> Config {
    Config {
        mem_max: memtable::EMPTY_BYTE_SIZE + extra,
        ..Config::default()
    }
}

/// A two-level table: tiered level 0 feeding straight into the terminal
/// level.
pub fn two_level_config() -> Config {
    Config {
        mem_max: crate::MEMORY_MAXSIZE,
        levels: vec![
            LevelLimit {
                max_files: 2,
                policy: Policy::Tiering,
            },
            LevelLimit {
                max_files: usize::MAX,
                policy: Policy::Leveling,
            },
        ],
    }
}

/// Writes one table with the given pairs directly into `<root>/level-N/`,
/// bypassing the engine. Pairs must be sorted ascending by key.
pub fn preload_table(
    root: &Path,
    level: usize,
    ts: u64,
    entries: &[(u64, Vec<u8>)],
) -> Result<SstCache> {
    let mut bloom = BloomFilter::new();
    for &(k, _) in entries {
        bloom.insert(k);
    }
    SSTableWriter::write_table(&level_dir(root, level), level, ts, entries, &bloom)
}

/// Ascending `(key, value)` pairs `lo..=hi` with a value derived from `tag`.
pub fn keyed_entries(lo: u64, hi: u64, tag: &str) -> Vec<(u64, Vec<u8>)> {
    (lo..=hi)
        .map(|k| (k, format!("{tag}-{k}").into_bytes()))
        .collect()
}

/// Number of `.sst` files under every level directory of `root`.
pub fn count_sst_files(root: &Path) -> usize {
    let mut n = 0;
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            if let Ok(files) = fs::read_dir(&dir) {
                n += files
                    .flatten()
                    .filter(|f| {
                        f.path()
                            .extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e == "sst")
                    })
                    .count();
            }
        }
    }
    n
}
