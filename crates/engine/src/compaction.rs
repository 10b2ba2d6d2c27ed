//! Size-triggered compaction between levels.
//!
//! `check_level(0)` runs after every flush and cascades: any level holding
//! more tables than its budget is merged into the next one, which may in
//! turn overflow, until the store settles.
//!
//! Selection follows the per-level policy. Out of a **tiered** level every
//! run moves (the level's runs overlap freely, so none can stay behind).
//! Out of a **leveled** level only the excess moves, oldest first. Into a
//! leveled level, every resident run the incoming key range touches is
//! pulled in as well -- greedily, expanding the range until nothing more
//! overlaps -- which is exactly what keeps that level non-overlapping.
//!
//! Inputs are merged freshest-first (descending timestamp, ties by larger
//! count), so the surviving value for a duplicated key is always the
//! freshest. Tombstones survive the merge everywhere except into the
//! terminal level, where nothing staler can exist and they are dropped.

use anyhow::Result;
use sstable::format::level_dir;
use sstable::{MergeIterator, SstCache, TableBuilder};
use std::fs;
use tracing::{info, warn};

use crate::{Engine, Policy, TOMBSTONE};

impl Engine {
    /// Rebalances `level` and everything below it.
    pub(crate) fn check_level(&mut self, level: usize) -> Result<()> {
        let Some(limit) = self.config.levels.get(level) else {
            return Ok(());
        };
        if self.level_count(level) <= limit.max_files || level + 1 >= self.config.levels.len() {
            return Ok(());
        }
        self.compact(level, level + 1)?;
        self.check_level(level + 1)
    }

    /// Merges the overfull level `from` into `to`.
    pub(crate) fn compact(&mut self, from: usize, to: usize) -> Result<()> {
        let inputs = self.take_inputs(from, to);
        debug_assert!(!inputs.is_empty(), "compaction selected no inputs");

        // Read every input in full before unlinking anything; an input file
        // must outlive the last read of its contents.
        let mut lists = Vec::with_capacity(inputs.len());
        for cache in &inputs {
            lists.push(cache.read_all()?);
        }
        for cache in &inputs {
            if let Err(e) = fs::remove_file(&cache.path) {
                warn!(path = %cache.path.display(), error = %e, "could not unlink input table");
            }
        }

        // Outputs inherit the maximum input timestamp (inputs are sorted
        // descending, so it is the first) -- freshness must strictly
        // increase toward lower levels.
        let shared_ts = inputs[0].header.time_stamp;
        let is_terminal = to == self.config.terminal_level();

        let mut builder = TableBuilder::new(
            level_dir(&self.data_dir, to),
            to,
            shared_ts,
            self.config.mem_max,
        );
        let mut produced = 0usize;
        for (key, value) in MergeIterator::new(lists) {
            if is_terminal && value.as_slice() == TOMBSTONE {
                continue;
            }
            if let Some(cache) = builder.append(key, value)? {
                produced += 1;
                self.caches.push(cache);
            }
        }
        if let Some(cache) = builder.finish()? {
            produced += 1;
            self.caches.push(cache);
        }

        self.caches.sort_by(SstCache::cmp_freshness);

        info!(
            from,
            to,
            inputs = inputs.len(),
            outputs = produced,
            time_stamp = shared_ts,
            "compacted"
        );
        Ok(())
    }

    /// Removes the compaction inputs from the active set and returns them
    /// sorted descending by (timestamp, count) -- freshest first, the order
    /// the merge consumes them in.
    fn take_inputs(&mut self, from: usize, to: usize) -> Vec<SstCache> {
        let from_limit = self.config.levels[from];

        // Which caches leave `from`.
        let mut selected: Vec<bool> = self
            .caches
            .iter()
            .map(|c| c.level == from)
            .collect();

        if from_limit.policy == Policy::Leveling {
            // Only the excess moves, oldest (smallest timestamp, then
            // smallest count) first.
            let mut candidates: Vec<usize> = (0..self.caches.len())
                .filter(|&i| selected[i])
                .collect();
            candidates.sort_by_key(|&i| {
                (self.caches[i].header.time_stamp, self.caches[i].header.count)
            });
            let excess = candidates.len().saturating_sub(from_limit.max_files);
            for &i in &candidates[excess..] {
                selected[i] = false;
            }
        }

        // Into a leveled target, pull in every resident run the incoming
        // key range touches, growing the range to a fixpoint.
        let to_is_leveling = self
            .config
            .levels
            .get(to)
            .is_some_and(|l| l.policy == Policy::Leveling);
        if to_is_leveling {
            let mut lower = u64::MAX;
            let mut upper = u64::MIN;
            for (i, cache) in self.caches.iter().enumerate() {
                if selected[i] {
                    lower = lower.min(cache.header.lower);
                    upper = upper.max(cache.header.upper);
                }
            }

            loop {
                let mut grew = false;
                for (i, cache) in self.caches.iter().enumerate() {
                    if !selected[i] && cache.level == to && cache.overlaps(lower, upper) {
                        selected[i] = true;
                        lower = lower.min(cache.header.lower);
                        upper = upper.max(cache.header.upper);
                        grew = true;
                    }
                }
                if !grew {
                    break;
                }
            }
        }

        let mut inputs = Vec::new();
        let mut kept = Vec::new();
        for (i, cache) in self.caches.drain(..).enumerate() {
            if selected[i] {
                inputs.push(cache);
            } else {
                kept.push(cache);
            }
        }
        self.caches = kept;

        inputs.sort_by(|a, b| {
            (b.header.time_stamp, b.header.count).cmp(&(a.header.time_stamp, a.header.count))
        });
        inputs
    }
}
