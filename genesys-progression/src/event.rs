//! Structured progression events for the caller to surface.
//!
//! Events are emitted in the order they happened during one engine call. The
//! presentation layer decides how to render them; `ui_key` and
//! `ui_surface_hint` are hints, not commands.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{
    UI_LEVEL_UP, UI_RANK_CHANGED, UI_RANK_REPAIRED, UI_REJECTED_PREFIX, UI_STREAK_EXTENDED,
    UI_STREAK_RESET, UI_STREAK_SHIELDED,
};
use crate::rewards::Rejection;

/// Ordered events from a single engine call. Most calls emit one or two.
pub type EventList = SmallVec<[ProgressionEvent; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressionEvent {
    Rejected {
        reason: Rejection,
    },
    StreakExtended {
        count: u32,
    },
    StreakReset {
        previous: u32,
    },
    /// Streak shields absorbed missed days during decay.
    StreakShielded {
        shields_used: u32,
    },
    LevelUp {
        from_level: u32,
        to_level: u32,
        /// Attribute points awarded for the levels gained.
        attribute_points: u32,
    },
    RankChanged {
        from: String,
        to: String,
    },
    /// The stored rank disagreed with the level and was recomputed.
    RankRepaired {
        stored: String,
        expected: String,
    },
}

/// Severity tier for a progression event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
}

/// Hint for how the UI should surface an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSurfaceHint {
    Log,
    Toast,
    Modal,
}

impl ProgressionEvent {
    #[must_use]
    pub const fn severity(&self) -> EventSeverity {
        match self {
            Self::Rejected { .. } | Self::StreakReset { .. } | Self::RankRepaired { .. } => {
                EventSeverity::Warning
            }
            Self::StreakExtended { .. }
            | Self::StreakShielded { .. }
            | Self::LevelUp { .. }
            | Self::RankChanged { .. } => EventSeverity::Info,
        }
    }

    #[must_use]
    pub const fn ui_surface_hint(&self) -> UiSurfaceHint {
        match self {
            Self::LevelUp { .. } | Self::RankChanged { .. } => UiSurfaceHint::Modal,
            Self::Rejected { .. }
            | Self::StreakExtended { .. }
            | Self::StreakReset { .. }
            | Self::StreakShielded { .. } => UiSurfaceHint::Toast,
            Self::RankRepaired { .. } => UiSurfaceHint::Log,
        }
    }

    /// i18n key for the presentation layer.
    #[must_use]
    pub fn ui_key(&self) -> String {
        match self {
            Self::Rejected { reason } => {
                format!("{UI_REJECTED_PREFIX}{}", reason.as_str().to_ascii_lowercase())
            }
            Self::StreakExtended { .. } => UI_STREAK_EXTENDED.to_string(),
            Self::StreakReset { .. } => UI_STREAK_RESET.to_string(),
            Self::StreakShielded { .. } => UI_STREAK_SHIELDED.to_string(),
            Self::LevelUp { .. } => UI_LEVEL_UP.to_string(),
            Self::RankChanged { .. } => UI_RANK_CHANGED.to_string(),
            Self::RankRepaired { .. } => UI_RANK_REPAIRED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ProgressionEvent::LevelUp {
            from_level: 3,
            to_level: 5,
            attribute_points: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "level_up");
        assert_eq!(json["to_level"], 5);

        let rejected = serde_json::to_value(ProgressionEvent::Rejected {
            reason: Rejection::DailyCapReached,
        })
        .unwrap();
        assert_eq!(rejected["reason"], "DAILY_CAP_REACHED");
    }

    #[test]
    fn surface_hints_follow_importance() {
        let level_up = ProgressionEvent::LevelUp {
            from_level: 1,
            to_level: 2,
            attribute_points: 1,
        };
        assert_eq!(level_up.ui_surface_hint(), UiSurfaceHint::Modal);
        assert_eq!(level_up.severity(), EventSeverity::Info);

        let repaired = ProgressionEvent::RankRepaired {
            stored: "Rank Z".into(),
            expected: "Aprendiz".into(),
        };
        assert_eq!(repaired.ui_surface_hint(), UiSurfaceHint::Log);
        assert_eq!(repaired.severity(), EventSeverity::Warning);
    }

    #[test]
    fn rejection_keys_embed_the_reason() {
        let event = ProgressionEvent::Rejected {
            reason: Rejection::InsufficientFunds,
        };
        assert_eq!(event.ui_key(), "progression.rejected.insufficient_funds");
    }
}
