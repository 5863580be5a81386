//! Daily streak continuity.
//!
//! All comparisons happen on calendar days supplied by the caller. The engine
//! never reads a clock, so "today" is whatever day the caller decided on.
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::state::UserProgression;

/// Effect of a qualifying action on the streak counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakActivity {
    pub delta: u32,
    /// The previous run is over; the counter restarts before `delta` applies.
    pub should_reset_first: bool,
}

/// What the decay pass did to a stored streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecayOutcome {
    Unaffected,
    Reset { previous: u32 },
    Shielded { shields_used: u32 },
}

/// Whole days from `last` to `today`; negative when `today` is earlier.
#[must_use]
pub fn days_between(last: NaiveDate, today: NaiveDate) -> i64 {
    today.signed_duration_since(last).num_days()
}

/// Streak after applying decay: more than one day without activity resets it.
#[must_use]
pub fn check_decay(last_activity: Option<NaiveDate>, streak: u32, today: NaiveDate) -> u32 {
    match last_activity {
        None => 0,
        Some(last) if days_between(last, today) > 1 => 0,
        Some(_) => streak,
    }
}

/// At most one increment per calendar day.
#[must_use]
pub fn record_activity(last_activity: Option<NaiveDate>, today: NaiveDate) -> StreakActivity {
    match last_activity.map(|last| days_between(last, today)) {
        None => StreakActivity {
            delta: 1,
            should_reset_first: true,
        },
        Some(elapsed) if elapsed <= 0 => StreakActivity {
            delta: 0,
            should_reset_first: false,
        },
        Some(1) => StreakActivity {
            delta: 1,
            should_reset_first: false,
        },
        Some(_) => StreakActivity {
            delta: 1,
            should_reset_first: true,
        },
    }
}

/// Run decay on `state`, spending streak shields to cover missed days when
/// enough are owned.
///
/// Each shield covers one missed day. Shields are all-or-nothing: if the user
/// owns fewer shields than missed days the streak resets and none are spent.
pub fn apply_decay(state: &mut UserProgression, today: NaiveDate) -> DecayOutcome {
    let Some(last) = state.last_activity_date else {
        return reset(state);
    };

    let elapsed = days_between(last, today);
    if elapsed < 0 {
        warn!(
            "activity date {last} is after the supplied day {today}; leaving streak untouched"
        );
        return DecayOutcome::Unaffected;
    }
    if elapsed <= 1 || state.streak_count == 0 {
        return DecayOutcome::Unaffected;
    }

    let missed = u32::try_from(elapsed - 1).unwrap_or(u32::MAX);
    if state.streak_shields >= missed {
        if let Some(yesterday) = today.pred_opt() {
            state.streak_shields -= missed;
            state.last_activity_date = Some(yesterday);
            return DecayOutcome::Shielded {
                shields_used: missed,
            };
        }
    }
    reset(state)
}

const fn reset(state: &mut UserProgression) -> DecayOutcome {
    if state.streak_count == 0 {
        return DecayOutcome::Unaffected;
    }
    let previous = state.streak_count;
    state.streak_count = 0;
    DecayOutcome::Reset { previous }
}
