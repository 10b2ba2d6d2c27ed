//! Cold start: scan the data root, load every table into a cache, and
//! recover the timestamp counter.
//!
//! There is no journal -- the immutable tables on disk are the entire
//! persistent state, and level membership is encoded purely by which
//! `level-N/` directory a file sits in.

use anyhow::{ensure, Context, Result};
use memtable::MemTable;
use sstable::format::{LEVEL_PREFIX, SST_SUFFIX};
use sstable::SstCache;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::{Config, Engine, EngineError};

pub(crate) fn boot(data_dir: &Path, config: Config) -> Result<Engine> {
    if !data_dir.is_dir() {
        return Err(EngineError::DataRootMissing(data_dir.to_path_buf()).into());
    }
    ensure!(
        config.mem_max > memtable::EMPTY_BYTE_SIZE,
        "memory budget {} cannot hold even an empty table ({} bytes)",
        config.mem_max,
        memtable::EMPTY_BYTE_SIZE
    );
    ensure!(!config.levels.is_empty(), "level table must not be empty");

    let mut caches = load_caches(data_dir)?;
    caches.sort_by(SstCache::cmp_freshness);

    // The next memtable must be fresher than everything on disk.
    let cur_ts = caches
        .iter()
        .map(|c| c.header.time_stamp)
        .max()
        .map_or(1, |ts| ts + 1);

    info!(
        data_dir = %data_dir.display(),
        tables = caches.len(),
        cur_ts,
        "engine booted"
    );

    Ok(Engine {
        data_dir: data_dir.to_path_buf(),
        mem: MemTable::new(cur_ts),
        caches,
        cur_ts,
        config,
    })
}

/// Loads a cache for every `*.sst` under every `level-N/` directory.
///
/// A file that fails to parse aborts the boot -- a table we cannot read is
/// a table whose data we would silently lose.
fn load_caches(data_dir: &Path) -> Result<Vec<SstCache>> {
    let mut caches = Vec::new();

    for entry in fs::read_dir(data_dir)
        .with_context(|| format!("scanning data root {}", data_dir.display()))?
    {
        let dir = entry?.path();
        let Some(level) = parse_level(&dir) else {
            continue;
        };

        for entry in
            fs::read_dir(&dir).with_context(|| format!("scanning {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == SST_SUFFIX) {
                let cache = SstCache::load(&path, level)?;
                debug!(
                    path = %path.display(),
                    level,
                    time_stamp = cache.header.time_stamp,
                    count = cache.header.count,
                    "loaded table"
                );
                caches.push(cache);
            }
        }
    }

    Ok(caches)
}

/// `<root>/level-7` → `Some(7)`; anything else → `None`.
fn parse_level(dir: &Path) -> Option<usize> {
    if !dir.is_dir() {
        return None;
    }
    dir.file_name()?
        .to_str()?
        .strip_prefix(LEVEL_PREFIX)?
        .parse()
        .ok()
}
