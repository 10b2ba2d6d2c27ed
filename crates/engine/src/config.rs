//! Per-level compaction policy and the memory budget.

use crate::MEMORY_MAXSIZE;

/// How a level accumulates tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Runs pile up independently; ranges may overlap. Compaction out of a
    /// tiered level takes every run.
    Tiering,
    /// Runs are kept non-overlapping. Compaction into a leveled level pulls
    /// in every resident run the incoming key range touches.
    Leveling,
}

/// One row of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelLimit {
    /// File budget: exceeding it triggers compaction into the next level.
    pub max_files: usize,
    pub policy: Policy,
}

/// Engine configuration.
///
/// The last row of `levels` is the terminal level: compaction into it
/// collapses tombstones, and its budget is conventionally unbounded so
/// nothing ever compacts out of it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Memory-table byte budget; also the size cap of compaction outputs.
    pub mem_max: usize,
    /// Level table, level 0 first.
    pub levels: Vec<LevelLimit>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mem_max: MEMORY_MAXSIZE,
            levels: vec![
                LevelLimit {
                    max_files: 2,
                    policy: Policy::Tiering,
                },
                LevelLimit {
                    max_files: 4,
                    policy: Policy::Leveling,
                },
                LevelLimit {
                    max_files: 8,
                    policy: Policy::Leveling,
                },
                LevelLimit {
                    max_files: 16,
                    policy: Policy::Leveling,
                },
                LevelLimit {
                    max_files: 32,
                    policy: Policy::Leveling,
                },
                LevelLimit {
                    max_files: usize::MAX,
                    policy: Policy::Leveling,
                },
            ],
        }
    }
}

impl Config {
    /// Index of the terminal level (the last row).
    #[must_use]
    pub fn terminal_level(&self) -> usize {
        self.levels.len() - 1
    }
}
