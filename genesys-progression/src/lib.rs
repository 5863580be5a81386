//! GenesysFit Progression Engine
//!
//! Deterministic gamification core for the GenesysFit fitness app: XP and level
//! curve, rank table, daily streaks, and the reward ledger that decides what each
//! action is worth. Every screen goes through [`ProgressionEngine`]; none of them
//! reimplement level, rank or streak rules.
//!
//! The engine is a pure function over snapshots. It never reads a clock (the
//! caller passes `today`) and never performs I/O; persistence goes through the
//! [`ProgressionStore`] seam as [`StoreDelta`] increments and sets.

pub mod config;
pub mod constants;
pub mod delta;
pub mod engine;
pub mod error;
pub mod event;
pub mod leaderboard;
pub mod leveling;
pub mod rank;
pub mod rewards;
pub mod shop;
pub mod state;
pub mod streak;

use chrono::NaiveDate;
use thiserror::Error;

// Re-export commonly used types
pub use config::{ConfigError, ProgressionConfig};
pub use delta::{DeltaError, StoreDelta};
pub use engine::{ActionOutcome, ProgressionEngine, Refreshed};
pub use error::{ProgressionError, parse_day};
pub use event::{EventList, EventSeverity, ProgressionEvent, UiSurfaceHint};
pub use leaderboard::{LeaderboardEntry, Medal, Standing, top_n};
pub use leveling::{LevelCurve, XpOutcome, advance_xp, apply_xp, progress_percent};
pub use rank::{RankEntry, RankTable, RankTableError};
pub use rewards::{
    Action, ActionKind, Rejection, RewardGrant, RewardOutcome, RewardRule, RewardTable,
    apply_reward,
};
pub use shop::{ItemEffect, ShopCatalog, ShopItem};
pub use state::{Attribute, Attributes, UserProgression};
pub use streak::{DecayOutcome, StreakActivity, check_decay, record_activity};

/// Trait for abstracting the user document store.
/// Platform-specific implementations should provide this
pub trait ProgressionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the current record for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load_user(&self, user_id: &str) -> Result<Option<UserProgression>, Self::Error>;

    /// Create the record for a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn create_user(&self, user_id: &str, state: &UserProgression) -> Result<(), Self::Error>;

    /// Apply increments and field sets to an existing record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delta cannot be applied.
    fn apply_delta(&self, user_id: &str, delta: &StoreDelta) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum ServiceError<E>
where
    E: std::error::Error + 'static,
{
    #[error("progression store failed: {0}")]
    Store(#[source] E),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Delta(#[from] DeltaError),
    #[error("no progression record for user `{user_id}`")]
    UnknownUser { user_id: String },
    #[error("user `{user_id}` already has a progression record")]
    AccountExists { user_id: String },
}

/// Runs engine calls against a store: load, compute, persist the delta.
pub struct ProgressionService<S>
where
    S: ProgressionStore,
{
    engine: ProgressionEngine,
    store: S,
}

impl<S> ProgressionService<S>
where
    S: ProgressionStore,
{
    pub const fn new(engine: ProgressionEngine, store: S) -> Self {
        Self { engine, store }
    }

    pub const fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create the level-1 record for a newly authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AccountExists`] if the user already has a record,
    /// or [`ServiceError::Store`] if the store fails.
    pub fn create_account(&self, user_id: &str) -> Result<UserProgression, ServiceError<S::Error>> {
        if self.load(user_id)?.is_some() {
            return Err(ServiceError::AccountExists {
                user_id: user_id.to_string(),
            });
        }
        let state = self.engine.new_user();
        self.store
            .create_user(user_id, &state)
            .map_err(ServiceError::Store)?;
        Ok(state)
    }

    /// Current record with decay and rollover applied; the refresh is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownUser`] for a missing record, or the store,
    /// engine or delta error that stopped the read.
    pub fn snapshot(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Refreshed, ServiceError<S::Error>> {
        let stored = self.require(user_id)?;
        let refreshed = self.engine.refresh(&stored, today)?;
        self.persist(user_id, &stored, &refreshed.state)?;
        Ok(refreshed)
    }

    /// Apply an action for `user_id` and persist the result.
    ///
    /// Rejected actions still persist whatever the refresh pass changed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownUser`] for a missing record,
    /// [`ServiceError::Progression`] for invalid input, or the store error.
    pub fn perform(
        &self,
        user_id: &str,
        action: &Action,
        today: NaiveDate,
    ) -> Result<ActionOutcome, ServiceError<S::Error>> {
        let stored = self.require(user_id)?;
        let outcome = self.engine.apply(action, &stored, today)?;
        self.persist(user_id, &stored, &outcome.state)?;
        Ok(outcome)
    }

    fn load(&self, user_id: &str) -> Result<Option<UserProgression>, ServiceError<S::Error>> {
        self.store.load_user(user_id).map_err(ServiceError::Store)
    }

    fn require(&self, user_id: &str) -> Result<UserProgression, ServiceError<S::Error>> {
        self.load(user_id)?.ok_or_else(|| ServiceError::UnknownUser {
            user_id: user_id.to_string(),
        })
    }

    fn persist(
        &self,
        user_id: &str,
        before: &UserProgression,
        after: &UserProgression,
    ) -> Result<(), ServiceError<S::Error>> {
        let delta = StoreDelta::between(before, after)?;
        if delta.is_empty() {
            return Ok(());
        }
        self.store
            .apply_delta(user_id, &delta)
            .map_err(ServiceError::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStore {
        users: Rc<RefCell<HashMap<String, UserProgression>>>,
        writes: Rc<RefCell<usize>>,
    }

    impl ProgressionStore for MemoryStore {
        type Error = DeltaError;

        fn load_user(&self, user_id: &str) -> Result<Option<UserProgression>, Self::Error> {
            Ok(self.users.borrow().get(user_id).cloned())
        }

        fn create_user(&self, user_id: &str, state: &UserProgression) -> Result<(), Self::Error> {
            self.users
                .borrow_mut()
                .insert(user_id.to_string(), state.clone());
            Ok(())
        }

        fn apply_delta(&self, user_id: &str, delta: &StoreDelta) -> Result<(), Self::Error> {
            let mut users = self.users.borrow_mut();
            if let Some(state) = users.get_mut(user_id) {
                *state = delta.apply_to(state)?;
            }
            *self.writes.borrow_mut() += 1;
            Ok(())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn perform_persists_the_outcome() {
        let store = MemoryStore::default();
        let service = ProgressionService::new(ProgressionEngine::default(), store.clone());
        service.create_account("uid-1").unwrap();

        let outcome = service.perform("uid-1", &Action::CheckIn, day(1)).unwrap();
        let stored = store.load_user("uid-1").unwrap().expect("record exists");
        assert_eq!(stored, outcome.state);
        assert_eq!(stored.coins, 50);
    }

    #[test]
    fn rejected_actions_do_not_write() {
        let store = MemoryStore::default();
        let service = ProgressionService::new(ProgressionEngine::default(), store.clone());
        service.create_account("uid-1").unwrap();
        service.perform("uid-1", &Action::CheckIn, day(1)).unwrap();
        let writes = *store.writes.borrow();

        let again = service.perform("uid-1", &Action::CheckIn, day(1)).unwrap();
        assert_eq!(again.rejection, Some(Rejection::AlreadyClaimedToday));
        assert_eq!(*store.writes.borrow(), writes);
    }

    #[test]
    fn snapshot_persists_decay() {
        let store = MemoryStore::default();
        let service = ProgressionService::new(ProgressionEngine::default(), store.clone());
        service.create_account("uid-1").unwrap();
        service.perform("uid-1", &Action::CheckIn, day(1)).unwrap();

        let refreshed = service.snapshot("uid-1", day(5)).unwrap();
        assert_eq!(refreshed.state.streak_count, 0);
        assert_eq!(
            refreshed.events.as_slice(),
            &[ProgressionEvent::StreakReset { previous: 1 }]
        );
        let stored = store.load_user("uid-1").unwrap().expect("record exists");
        assert_eq!(stored.streak_count, 0);
    }

    #[test]
    fn account_lifecycle_errors() {
        let service = ProgressionService::new(ProgressionEngine::default(), MemoryStore::default());
        assert!(matches!(
            service.perform("ghost", &Action::CheckIn, day(1)),
            Err(ServiceError::UnknownUser { user_id }) if user_id == "ghost"
        ));
        service.create_account("uid-1").unwrap();
        assert!(matches!(
            service.create_account("uid-1"),
            Err(ServiceError::AccountExists { .. })
        ));
        assert!(matches!(
            service.perform("uid-1", &Action::GrantXp { amount: -5 }, day(1)),
            Err(ServiceError::Progression(ProgressionError::NegativeXp { amount: -5 }))
        ));
    }
}
