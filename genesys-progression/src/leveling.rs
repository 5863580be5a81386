//! XP thresholds and level-up resolution.
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_QUADRATIC_BASE, DEFAULT_XP_PER_LEVEL, MAX_PROGRESS_PERCENT, STARTING_LEVEL,
};
use crate::error::ProgressionError;

/// XP needed to clear a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelCurve {
    /// Every level costs the same amount of XP.
    Flat { xp_per_level: u64 },
    /// Level `n` costs `base * n²` XP.
    Quadratic { base: u64 },
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::Flat {
            xp_per_level: DEFAULT_XP_PER_LEVEL,
        }
    }
}

impl LevelCurve {
    #[must_use]
    pub const fn quadratic() -> Self {
        Self::Quadratic {
            base: DEFAULT_QUADRATIC_BASE,
        }
    }

    /// XP required to advance from `level` to `level + 1`. Never zero.
    #[must_use]
    pub fn threshold(self, level: u32) -> u64 {
        let level = u64::from(level.max(STARTING_LEVEL));
        match self {
            Self::Flat { xp_per_level } => xp_per_level.max(1),
            Self::Quadratic { base } => base.max(1).saturating_mul(level).saturating_mul(level),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flat { .. } => "flat",
            Self::Quadratic { .. } => "quadratic",
        }
    }
}

/// Result of feeding XP through the level curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpOutcome {
    pub level: u32,
    pub xp: u64,
    pub leveled_up: bool,
    pub levels_gained: u32,
}

/// Add `gained` XP and roll over as many levels as the total pays for.
///
/// Leftover XP after each level-up carries into the next level, so a single
/// large grant can cross several levels without losing any of it. Flat curves
/// resolve in one division; quadratic thresholds grow with the level, so the
/// walk stays within the cube root of the total.
///
/// # Errors
///
/// Returns [`ProgressionError::XpOverflow`] when the total would not fit and
/// [`ProgressionError::LevelOverflow`] when it pays past the highest level.
pub fn advance_xp(
    curve: LevelCurve,
    level: u32,
    xp: u64,
    gained: u64,
) -> Result<XpOutcome, ProgressionError> {
    let start = level.max(STARTING_LEVEL);
    let total = xp
        .checked_add(gained)
        .ok_or(ProgressionError::XpOverflow { xp, gained })?;

    let (level, xp) = match curve {
        LevelCurve::Flat { .. } => {
            let per_level = curve.threshold(start);
            let reached = u32::try_from(total / per_level)
                .ok()
                .and_then(|levels| start.checked_add(levels))
                .ok_or(ProgressionError::LevelOverflow { level: start, xp: total })?;
            (reached, total % per_level)
        }
        LevelCurve::Quadratic { .. } => {
            let mut level = start;
            let mut xp = total;
            loop {
                let threshold = curve.threshold(level);
                if xp < threshold {
                    break;
                }
                xp -= threshold;
                level = level
                    .checked_add(1)
                    .ok_or(ProgressionError::LevelOverflow { level: start, xp: total })?;
            }
            (level, xp)
        }
    };

    let levels_gained = level - start;
    Ok(XpOutcome {
        level,
        xp,
        leveled_up: levels_gained > 0,
        levels_gained,
    })
}

/// Validated form of [`advance_xp`] for signed grants coming from callers.
///
/// # Errors
///
/// Returns [`ProgressionError::NegativeXp`] for negative grants,
/// [`ProgressionError::InvalidLevel`] for level 0, and the overflow errors of
/// [`advance_xp`]. State is untouched in every case.
pub fn apply_xp(
    curve: LevelCurve,
    level: u32,
    xp: u64,
    gained: i64,
) -> Result<XpOutcome, ProgressionError> {
    if level < STARTING_LEVEL {
        return Err(ProgressionError::InvalidLevel { level });
    }
    let gained =
        u64::try_from(gained).map_err(|_| ProgressionError::NegativeXp { amount: gained })?;
    advance_xp(curve, level, xp, gained)
}

/// Progress through the current level as a 0..=100 percentage.
#[must_use]
pub fn progress_percent(curve: LevelCurve, level: u32, xp: u64) -> u8 {
    let threshold = curve.threshold(level);
    let pct = xp.saturating_mul(MAX_PROGRESS_PERCENT) / threshold;
    u8::try_from(pct.min(MAX_PROGRESS_PERCENT)).unwrap_or(u8::MAX)
}
