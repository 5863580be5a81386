//! Level to rank lookup.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::STARTING_LEVEL;

/// One contiguous band of levels sharing a rank name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub min_level: u32,
    pub max_level: u32,
    pub name: String,
}

impl RankEntry {
    #[must_use]
    pub fn new(min_level: u32, max_level: u32, name: impl Into<String>) -> Self {
        Self {
            min_level,
            max_level,
            name: name.into(),
        }
    }

    #[must_use]
    pub const fn contains(&self, level: u32) -> bool {
        level >= self.min_level && level <= self.max_level
    }
}

/// Errors raised when a rank table does not cover every reachable level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RankTableError {
    #[error("rank table is empty")]
    Empty,
    #[error("rank table must start at level 1 (starts at {min})")]
    MissingFloor { min: u32 },
    #[error("rank `{name}` has min level {min} above max level {max}")]
    InvertedRange { name: String, min: u32, max: u32 },
    #[error("rank table gap: no rank covers the levels between {after} and {next_min}")]
    Gap { after: u32, next_min: u32 },
    #[error("rank `{name}` starts at {min} but the previous rank ends at {previous_max}")]
    Overlap {
        name: String,
        min: u32,
        previous_max: u32,
    },
}

/// Ordered, gap-free rank table. Levels past the last entry clamp to its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RankEntry>", into = "Vec<RankEntry>")]
pub struct RankTable {
    entries: Vec<RankEntry>,
}

impl RankTable {
    /// Build a table after checking it covers levels 1..=max without holes.
    ///
    /// # Errors
    ///
    /// Returns a [`RankTableError`] describing the first coverage defect found.
    pub fn new(entries: Vec<RankEntry>) -> Result<Self, RankTableError> {
        validate_entries(&entries)?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    /// Rank name for `level`. Level 0 reads as level 1.
    #[must_use]
    pub fn rank_for(&self, level: u32) -> &str {
        let level = level.max(STARTING_LEVEL);
        self.entries
            .iter()
            .find(|entry| entry.contains(level))
            .or_else(|| self.entries.last())
            .map_or("", |entry| entry.name.as_str())
    }

    /// Highest level explicitly listed in the table.
    #[must_use]
    pub fn max_listed_level(&self) -> u32 {
        self.entries.last().map_or(STARTING_LEVEL, |e| e.max_level)
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            entries: default_entries(),
        }
    }
}

impl TryFrom<Vec<RankEntry>> for RankTable {
    type Error = RankTableError;

    fn try_from(entries: Vec<RankEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<RankTable> for Vec<RankEntry> {
    fn from(table: RankTable) -> Self {
        table.entries
    }
}

/// Check that entries start at level 1 and chain without gaps or overlaps.
///
/// # Errors
///
/// Returns the first [`RankTableError`] found while walking the entries in order.
pub fn validate_entries(entries: &[RankEntry]) -> Result<(), RankTableError> {
    let first = entries.first().ok_or(RankTableError::Empty)?;
    if first.min_level != STARTING_LEVEL {
        return Err(RankTableError::MissingFloor {
            min: first.min_level,
        });
    }

    let mut previous: Option<&RankEntry> = None;
    for entry in entries {
        if entry.min_level > entry.max_level {
            return Err(RankTableError::InvertedRange {
                name: entry.name.clone(),
                min: entry.min_level,
                max: entry.max_level,
            });
        }
        if let Some(prev) = previous {
            let expected = prev.max_level.saturating_add(1);
            if entry.min_level > expected {
                return Err(RankTableError::Gap {
                    after: prev.max_level,
                    next_min: entry.min_level,
                });
            }
            if entry.min_level < expected {
                return Err(RankTableError::Overlap {
                    name: entry.name.clone(),
                    min: entry.min_level,
                    previous_max: prev.max_level,
                });
            }
        }
        previous = Some(entry);
    }
    Ok(())
}

/// Rank bands shown on the status screen.
#[must_use]
pub fn default_entries() -> Vec<RankEntry> {
    vec![
        RankEntry::new(1, 5, "Aprendiz"),
        RankEntry::new(6, 10, "Rank E"),
        RankEntry::new(11, 20, "Rank D"),
        RankEntry::new(21, 35, "Rank C"),
        RankEntry::new(36, 45, "Rank B"),
        RankEntry::new(46, 55, "Rank A"),
        RankEntry::new(56, 70, "Rank S"),
        RankEntry::new(71, 85, "Rank S Internacional"),
        RankEntry::new(86, 100, "Monarca"),
    ]
}

/// Variant where Rank B starts at 41, leaving levels 36..=40 without a rank.
///
/// Rejected by [`RankTable::new`] with [`RankTableError::Gap`].
#[must_use]
pub fn legacy_gapped_entries() -> Vec<RankEntry> {
    let mut entries = default_entries();
    if let Some(rank_b) = entries.iter_mut().find(|e| e.name == "Rank B") {
        rank_b.min_level = 41;
    }
    entries
}
