//! Progression facade: the single entry point for applying actions.
//!
//! Every call runs the same fixed pipeline:
//!
//! 1. refresh (rank self-heal, streak decay, farm-day rollover, xp settle)
//! 2. reward ledger; a rejection stops here
//! 3. streak extension for qualifying actions
//! 4. xp through the level curve, with rank and attribute points on level-up
//! 5. coins and the remaining field deltas
//!
//! Decay runs before anything can extend the streak, so a stale streak is
//! never extended in the same call that should have reset it.
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ProgressionConfig};
use crate::error::ProgressionError;
use crate::event::{EventList, ProgressionEvent};
use crate::leveling::{XpOutcome, advance_xp, progress_percent};
use crate::rewards::{Action, Rejection, RewardGrant, RewardOutcome, apply_reward};
use crate::state::UserProgression;
use crate::streak::{DecayOutcome, apply_decay, record_activity};

/// Snapshot after the read-time normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refreshed {
    pub state: UserProgression,
    pub events: EventList,
}

/// New state plus the events to surface, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub state: UserProgression,
    pub events: EventList,
    pub rejection: Option<Rejection>,
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, ProgressionEvent::LevelUp { .. }))
    }
}

/// Pure, synchronous progression engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionEngine {
    config: ProgressionConfig,
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self {
            config: ProgressionConfig::default(),
        }
    }
}

impl ProgressionEngine {
    /// Build an engine around a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration fails validation.
    pub fn new(config: ProgressionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Record for a freshly created account.
    #[must_use]
    pub fn new_user(&self) -> UserProgression {
        UserProgression::new(&self.config.ranks)
    }

    #[must_use]
    pub fn rank_for(&self, level: u32) -> &str {
        self.config.ranks.rank_for(level)
    }

    #[must_use]
    pub fn xp_threshold(&self, level: u32) -> u64 {
        self.config.level_curve.threshold(level)
    }

    #[must_use]
    pub fn progress_percent(&self, state: &UserProgression) -> u8 {
        progress_percent(self.config.level_curve, state.level, state.xp)
    }

    /// Normalize a stored snapshot for `today`. Callers run this on every read.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::InvalidLevel`] for a record at level 0 and a
    /// level overflow error when stored XP pays past the highest level.
    pub fn refresh(
        &self,
        state: &UserProgression,
        today: NaiveDate,
    ) -> Result<Refreshed, ProgressionError> {
        if state.level == 0 {
            return Err(ProgressionError::InvalidLevel { level: state.level });
        }

        let mut state = state.clone();
        let mut events = EventList::new();

        self.heal_rank(&mut state, &mut events);

        match apply_decay(&mut state, today) {
            DecayOutcome::Unaffected => {}
            DecayOutcome::Reset { previous } => {
                debug!("streak of {previous} days lapsed before {today}");
                events.push(ProgressionEvent::StreakReset { previous });
            }
            DecayOutcome::Shielded { shields_used } => {
                debug!("{shields_used} streak shield(s) consumed on {today}");
                events.push(ProgressionEvent::StreakShielded { shields_used });
            }
        }

        roll_over_farm_day(&mut state, today);
        if let Some(day) = state.last_check_in.filter(|day| *day > today) {
            warn!("check-in date {day} is after the supplied day {today}; keeping it claimed");
        }

        self.settle_xp(&mut state, 0, &mut events)?;

        Ok(Refreshed { state, events })
    }

    /// Apply `action` to `state` as of `today`.
    ///
    /// Policy rejections come back as `Ok` with [`ActionOutcome::rejection`] set
    /// and a [`ProgressionEvent::Rejected`] event; only the refresh pass has
    /// touched the state in that case.
    ///
    /// # Errors
    ///
    /// Returns a [`ProgressionError`] for invalid input such as a negative XP
    /// grant or a level-0 record. No state change is reported on error.
    pub fn apply(
        &self,
        action: &Action,
        state: &UserProgression,
        today: NaiveDate,
    ) -> Result<ActionOutcome, ProgressionError> {
        let Refreshed {
            mut state,
            mut events,
        } = self.refresh(state, today)?;

        let grant = match apply_reward(&self.config, action, &state, today)? {
            RewardOutcome::Granted(grant) => grant,
            RewardOutcome::Rejected { reason } => {
                debug!("{} rejected on {today}: {reason}", action.kind());
                events.push(ProgressionEvent::Rejected { reason });
                return Ok(ActionOutcome {
                    state,
                    events,
                    rejection: Some(reason),
                });
            }
        };

        if grant.streak_qualifying {
            extend_streak(&mut state, today, &mut events);
        }

        self.settle_xp(&mut state, grant.xp, &mut events)?;
        apply_field_deltas(&mut state, &grant, today);

        debug!(
            "{} applied on {today}: +{} xp, {:+} coins",
            action.kind(),
            grant.xp,
            grant.coin_delta()
        );

        Ok(ActionOutcome {
            state,
            events,
            rejection: None,
        })
    }

    fn heal_rank(&self, state: &mut UserProgression, events: &mut EventList) {
        let expected = self.config.ranks.rank_for(state.level);
        if state.rank == expected {
            return;
        }
        warn!(
            "stored rank `{}` does not match level {} (expected `{expected}`); recomputing",
            state.rank, state.level
        );
        events.push(ProgressionEvent::RankRepaired {
            stored: std::mem::take(&mut state.rank),
            expected: expected.to_string(),
        });
        state.rank = expected.to_string();
    }

    fn settle_xp(
        &self,
        state: &mut UserProgression,
        gained: u64,
        events: &mut EventList,
    ) -> Result<(), ProgressionError> {
        let XpOutcome {
            level,
            xp,
            leveled_up,
            levels_gained,
        } = advance_xp(self.config.level_curve, state.level, state.xp, gained)?;

        let from_level = state.level;
        state.level = level;
        state.xp = xp;
        if !leveled_up {
            return Ok(());
        }

        let attribute_points = levels_gained.saturating_mul(self.config.attribute_points_per_level);
        state.attribute_points = state.attribute_points.saturating_add(attribute_points);
        info!("level up {from_level} -> {level} (+{attribute_points} attribute points)");
        events.push(ProgressionEvent::LevelUp {
            from_level,
            to_level: level,
            attribute_points,
        });

        let to_rank = self.config.ranks.rank_for(level);
        if state.rank != to_rank {
            events.push(ProgressionEvent::RankChanged {
                from: std::mem::take(&mut state.rank),
                to: to_rank.to_string(),
            });
            state.rank = to_rank.to_string();
        }
        Ok(())
    }
}

fn extend_streak(state: &mut UserProgression, today: NaiveDate, events: &mut EventList) {
    let activity = record_activity(state.last_activity_date, today);
    if activity.delta == 0 {
        return;
    }
    if activity.should_reset_first {
        state.streak_count = 0;
    }
    state.streak_count = state.streak_count.saturating_add(activity.delta);
    state.last_activity_date = Some(today);
    events.push(ProgressionEvent::StreakExtended {
        count: state.streak_count,
    });
}

fn roll_over_farm_day(state: &mut UserProgression, today: NaiveDate) {
    match state.farm_date {
        Some(day) if day == today => {}
        Some(day) if day > today => {
            warn!("farm date {day} is after the supplied day {today}; keeping its total");
        }
        Some(_) => {
            state.daily_farm_total = 0;
            state.farm_date = None;
        }
        None if state.daily_farm_total > 0 => state.daily_farm_total = 0,
        None => {}
    }
}

fn apply_field_deltas(state: &mut UserProgression, grant: &RewardGrant, today: NaiveDate) {
    state.coins = state
        .coins
        .saturating_add(grant.coins)
        .saturating_sub(grant.coin_cost);
    state.attribute_points = state
        .attribute_points
        .saturating_sub(grant.attribute_points_spent);
    if let Some(attribute) = grant.attribute {
        state.attributes.increment(attribute);
    }
    state.streak_shields = state.streak_shields.saturating_add(grant.streak_shields);
    if let Some(item) = &grant.owned_item {
        state.owned_items.insert(item.clone());
    }
    if grant.farm_units > 0 {
        if state.farm_date.is_none_or(|day| day < today) {
            state.daily_farm_total = 0;
            state.farm_date = Some(today);
        }
        state.daily_farm_total = state.daily_farm_total.saturating_add(grant.farm_units);
    }
    if grant.marks_check_in {
        state.last_check_in = Some(today);
    }
    if grant.marks_onboarding {
        state.onboarding_claimed = true;
    }
}
