//! Mapping engine output onto document-store primitives.
//!
//! The store applies numeric changes as atomic increments and everything else
//! as plain field sets. [`StoreDelta::between`] splits a before/after pair along
//! that line so concurrent sessions never overwrite each other's coins or points.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::{
    FIELD_ATTRIBUTE_POINTS, FIELD_ATTRIBUTES, FIELD_COINS, FIELD_DAILY_FARM_TOTAL,
    FIELD_FARM_DATE, FIELD_LAST_ACTIVITY, FIELD_LAST_CHECK_IN, FIELD_LEVEL,
    FIELD_ONBOARDING_CLAIMED, FIELD_OWNED_ITEMS, FIELD_RANK, FIELD_STREAK_COUNT,
    FIELD_STREAK_SHIELDS, FIELD_XP,
};
use crate::state::{Attribute, UserProgression};

#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("progression record could not be converted: {0}")]
    Json(#[from] serde_json::Error),
    #[error("field `{path}` is not an object")]
    NotAnObject { path: String },
    #[error("field `{path}` is not numeric")]
    NotNumeric { path: String },
}

/// Field-level changes between two snapshots of the same user.
///
/// Keys are document field names; nested fields use dotted paths such as
/// `attributes.strength`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDelta {
    pub increments: BTreeMap<String, i64>,
    pub sets: BTreeMap<String, Value>,
}

impl StoreDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.increments.is_empty() && self.sets.is_empty()
    }

    /// Diff two snapshots into increments and sets.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::Json`] if a changed field cannot be serialized.
    pub fn between(before: &UserProgression, after: &UserProgression) -> Result<Self, DeltaError> {
        let mut delta = Self::default();

        if before.level == after.level {
            delta.increment(FIELD_XP, signed_diff(before.xp, after.xp));
        } else {
            delta.set(FIELD_LEVEL, &after.level)?;
            delta.set(FIELD_XP, &after.xp)?;
        }

        delta.increment(FIELD_COINS, signed_diff(before.coins, after.coins));
        delta.increment(
            FIELD_ATTRIBUTE_POINTS,
            signed_diff(
                u64::from(before.attribute_points),
                u64::from(after.attribute_points),
            ),
        );
        for attribute in Attribute::ALL {
            delta.increment(
                &format!("{FIELD_ATTRIBUTES}.{attribute}"),
                signed_diff(
                    u64::from(before.attributes.get(attribute)),
                    u64::from(after.attributes.get(attribute)),
                ),
            );
        }
        delta.increment(
            FIELD_STREAK_SHIELDS,
            signed_diff(
                u64::from(before.streak_shields),
                u64::from(after.streak_shields),
            ),
        );

        if before.farm_date == after.farm_date {
            delta.increment(
                FIELD_DAILY_FARM_TOTAL,
                signed_diff(before.daily_farm_total, after.daily_farm_total),
            );
        } else {
            delta.set(FIELD_DAILY_FARM_TOTAL, &after.daily_farm_total)?;
            delta.set(FIELD_FARM_DATE, &after.farm_date)?;
        }

        if before.rank != after.rank {
            delta.set(FIELD_RANK, &after.rank)?;
        }
        if before.streak_count != after.streak_count {
            delta.set(FIELD_STREAK_COUNT, &after.streak_count)?;
        }
        if before.last_activity_date != after.last_activity_date {
            delta.set(FIELD_LAST_ACTIVITY, &after.last_activity_date)?;
        }
        if before.last_check_in != after.last_check_in {
            delta.set(FIELD_LAST_CHECK_IN, &after.last_check_in)?;
        }
        if before.onboarding_claimed != after.onboarding_claimed {
            delta.set(FIELD_ONBOARDING_CLAIMED, &after.onboarding_claimed)?;
        }
        if before.owned_items != after.owned_items {
            delta.set(FIELD_OWNED_ITEMS, &after.owned_items)?;
        }

        Ok(delta)
    }

    /// Replay this delta onto `state`, the way the store would.
    ///
    /// Increments on a missing field start from zero and never drive a counter
    /// below zero.
    ///
    /// # Errors
    ///
    /// Returns a [`DeltaError`] if a path does not fit the record shape.
    pub fn apply_to(&self, state: &UserProgression) -> Result<UserProgression, DeltaError> {
        let mut doc = serde_json::to_value(state)?;

        for (path, value) in &self.sets {
            *slot(&mut doc, path)? = value.clone();
        }
        for (path, amount) in &self.increments {
            let field = slot(&mut doc, path)?;
            let current = match &*field {
                Value::Null => 0,
                Value::Number(n) => n.as_i64().ok_or_else(|| DeltaError::NotNumeric {
                    path: path.clone(),
                })?,
                _ => {
                    return Err(DeltaError::NotNumeric { path: path.clone() });
                }
            };
            *field = Value::from(current.saturating_add(*amount).max(0));
        }

        Ok(serde_json::from_value(doc)?)
    }

    fn increment(&mut self, field: &str, amount: i64) {
        if amount != 0 {
            self.increments.insert(field.to_string(), amount);
        }
    }

    fn set<T: Serialize>(&mut self, field: &str, value: &T) -> Result<(), DeltaError> {
        self.sets
            .insert(field.to_string(), serde_json::to_value(value)?);
        Ok(())
    }
}

fn signed_diff(before: u64, after: u64) -> i64 {
    let diff = i128::from(after) - i128::from(before);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}

fn slot<'a>(doc: &'a mut Value, path: &str) -> Result<&'a mut Value, DeltaError> {
    let mut current = doc;
    let mut walked = String::new();
    for segment in path.split('.') {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return Err(DeltaError::NotAnObject { path: walked });
        };
        current = map.entry(segment.to_string()).or_insert(Value::Null);
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ProgressionEngine;
    use crate::rewards::Action;
    use chrono::NaiveDate;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[test]
    fn check_in_maps_to_increments_and_sets() {
        let engine = ProgressionEngine::default();
        let before = engine.new_user();
        let after = engine.apply(&Action::CheckIn, &before, day(1)).unwrap().state;

        let delta = StoreDelta::between(&before, &after).unwrap();
        assert_eq!(delta.increments.get("xp"), Some(&100));
        assert_eq!(delta.increments.get("coins"), Some(&50));
        assert_eq!(delta.sets.get("streakCount"), Some(&json!(1)));
        assert_eq!(delta.sets.get("lastActivityDate"), Some(&json!("2025-07-01")));
        assert_eq!(delta.sets.get("lastCheckIn"), Some(&json!("2025-07-01")));
        assert!(!delta.sets.contains_key("level"));

        assert_eq!(delta.apply_to(&before).unwrap(), after);
    }

    #[test]
    fn level_up_sets_level_and_xp() {
        let engine = ProgressionEngine::default();
        let mut before = engine.new_user();
        before.xp = 950;
        let after = engine
            .apply(&Action::GrantXp { amount: 100 }, &before, day(2))
            .unwrap()
            .state;

        let delta = StoreDelta::between(&before, &after).unwrap();
        assert_eq!(delta.sets.get("level"), Some(&json!(2)));
        assert_eq!(delta.sets.get("xp"), Some(&json!(50)));
        assert_eq!(delta.increments.get("attributePoints"), Some(&1));
        assert_eq!(delta.apply_to(&before).unwrap(), after);
    }

    #[test]
    fn attribute_spending_uses_dotted_paths() {
        let mut before = UserProgression::default();
        before.attribute_points = 2;
        let mut after = before.clone();
        after.attribute_points = 1;
        after.attributes.endurance = 2;

        let delta = StoreDelta::between(&before, &after).unwrap();
        assert_eq!(delta.increments.get("attributePoints"), Some(&-1));
        assert_eq!(delta.increments.get("attributes.endurance"), Some(&1));
        assert_eq!(delta.apply_to(&before).unwrap(), after);
    }

    #[test]
    fn identical_snapshots_produce_no_delta() {
        let state = UserProgression::default();
        assert!(StoreDelta::between(&state, &state).unwrap().is_empty());
    }

    #[test]
    fn concurrent_increments_both_land() {
        let base = UserProgression::default();
        let mut phone = base.clone();
        phone.coins = 50;
        let mut tablet = base.clone();
        tablet.coins = 10;

        let phone_delta = StoreDelta::between(&base, &phone).unwrap();
        let tablet_delta = StoreDelta::between(&base, &tablet).unwrap();
        let merged = tablet_delta
            .apply_to(&phone_delta.apply_to(&base).unwrap())
            .unwrap();
        assert_eq!(merged.coins, 60);
    }

    #[test]
    fn increments_never_go_negative() {
        let delta = StoreDelta {
            increments: BTreeMap::from([("coins".to_string(), -500)]),
            sets: BTreeMap::new(),
        };
        let mut state = UserProgression::default();
        state.coins = 20;
        assert_eq!(delta.apply_to(&state).unwrap().coins, 0);
    }

    #[test]
    fn non_numeric_increment_is_an_error() {
        let delta = StoreDelta {
            increments: BTreeMap::from([("rank".to_string(), 1)]),
            sets: BTreeMap::new(),
        };
        assert!(matches!(
            delta.apply_to(&UserProgression::default()),
            Err(DeltaError::NotNumeric { path }) if path == "rank"
        ));
    }
}
