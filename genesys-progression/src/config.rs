//! Tunable progression rules.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_ATTRIBUTE_POINTS_PER_LEVEL, DEFAULT_DAILY_FARM_CAP};
use crate::leveling::LevelCurve;
use crate::rank::{RankTable, RankTableError, validate_entries};
use crate::rewards::RewardTable;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{curve} level curve must cost at least 1 xp per level")]
    ZeroThreshold { curve: &'static str },
    #[error("daily farm cap must be at least 1")]
    ZeroFarmCap,
    #[error(transparent)]
    Ranks(#[from] RankTableError),
    #[error("progression config could not be parsed: {0}")]
    Parse(String),
}

/// Every rule the engine applies, with defaults for each field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default)]
    pub level_curve: LevelCurve,
    #[serde(default)]
    pub rewards: RewardTable,
    #[serde(default = "ProgressionConfig::default_daily_farm_cap")]
    pub daily_farm_cap: u64,
    #[serde(default = "ProgressionConfig::default_attribute_points_per_level")]
    pub attribute_points_per_level: u32,
    #[serde(default)]
    pub ranks: RankTable,
}

impl ProgressionConfig {
    const fn default_daily_farm_cap() -> u64 {
        DEFAULT_DAILY_FARM_CAP
    }

    const fn default_attribute_points_per_level() -> u32 {
        DEFAULT_ATTRIBUTE_POINTS_PER_LEVEL
    }

    /// Parse and validate a JSON configuration; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON (including rank tables
    /// with gaps) and the relevant variant for invariant violations.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration can drive the engine.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero_cost = match self.level_curve {
            LevelCurve::Flat { xp_per_level } => xp_per_level == 0,
            LevelCurve::Quadratic { base } => base == 0,
        };
        if zero_cost {
            return Err(ConfigError::ZeroThreshold {
                curve: self.level_curve.label(),
            });
        }
        if self.daily_farm_cap == 0 {
            return Err(ConfigError::ZeroFarmCap);
        }
        validate_entries(self.ranks.entries())?;
        Ok(())
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_curve: LevelCurve::default(),
            rewards: RewardTable::default(),
            daily_farm_cap: Self::default_daily_farm_cap(),
            attribute_points_per_level: Self::default_attribute_points_per_level(),
            ranks: RankTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::legacy_gapped_entries;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ProgressionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config = ProgressionConfig::from_json("{}").unwrap();
        assert_eq!(config, ProgressionConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = ProgressionConfig::from_json(
            r#"{
                "level_curve": {"kind": "quadratic", "base": 100},
                "daily_farm_cap": 90,
                "rewards": {"check_in": {"xp": 10, "coins": 1, "streak_qualifying": true}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.level_curve, LevelCurve::Quadratic { base: 100 });
        assert_eq!(config.daily_farm_cap, 90);
        assert_eq!(config.rewards.check_in.xp, 10);
        assert_eq!(config.rewards.workout, RewardTable::default().workout);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let flat_zero = ProgressionConfig {
            level_curve: LevelCurve::Flat { xp_per_level: 0 },
            ..ProgressionConfig::default()
        };
        assert_eq!(
            flat_zero.validate(),
            Err(ConfigError::ZeroThreshold { curve: "flat" })
        );

        let no_cap = ProgressionConfig {
            daily_farm_cap: 0,
            ..ProgressionConfig::default()
        };
        assert_eq!(no_cap.validate(), Err(ConfigError::ZeroFarmCap));
    }

    #[test]
    fn gapped_rank_table_fails_to_parse() {
        let ranks = serde_json::to_string(&legacy_gapped_entries()).unwrap();
        let json = format!(r#"{{"ranks": {ranks}}}"#);
        assert!(matches!(
            ProgressionConfig::from_json(&json),
            Err(ConfigError::Parse(msg)) if msg.contains("gap")
        ));
    }
}
