use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use genesys_progression::{
    DeltaError, LeaderboardEntry, ProgressionStore, StoreDelta, UserProgression,
};

/// In-process stand-in for the user document store.
///
/// Deltas are replayed field by field so scenarios exercise the same
/// increment/set contract a real backend would see.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Rc<RefCell<BTreeMap<String, UserProgression>>>,
    deltas: Rc<RefCell<Vec<(String, StoreDelta)>>>,
}

impl MemoryStore {
    pub fn user(&self, user_id: &str) -> Option<UserProgression> {
        self.users.borrow().get(user_id).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.deltas.borrow().len()
    }

    pub fn last_delta(&self) -> Option<StoreDelta> {
        self.deltas.borrow().last().map(|(_, delta)| delta.clone())
    }

    pub fn leaderboard_entries(&self) -> Vec<LeaderboardEntry> {
        self.users
            .borrow()
            .iter()
            .map(|(id, state)| LeaderboardEntry::from_progression(id, id, state))
            .collect()
    }
}

impl ProgressionStore for MemoryStore {
    type Error = DeltaError;

    fn load_user(&self, user_id: &str) -> Result<Option<UserProgression>, Self::Error> {
        Ok(self.user(user_id))
    }

    fn create_user(&self, user_id: &str, state: &UserProgression) -> Result<(), Self::Error> {
        self.users
            .borrow_mut()
            .insert(user_id.to_string(), state.clone());
        Ok(())
    }

    fn apply_delta(&self, user_id: &str, delta: &StoreDelta) -> Result<(), Self::Error> {
        let mut users = self.users.borrow_mut();
        let current = users.entry(user_id.to_string()).or_default();
        *current = delta.apply_to(current)?;
        self.deltas
            .borrow_mut()
            .push((user_id.to_string(), delta.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_recorded_and_applied() {
        let store = MemoryStore::default();
        store
            .create_user("uid", &UserProgression::default())
            .unwrap();
        let delta = StoreDelta {
            increments: BTreeMap::from([("coins".to_string(), 25)]),
            sets: BTreeMap::new(),
        };
        store.apply_delta("uid", &delta).unwrap();
        assert_eq!(store.user("uid").unwrap().coins, 25);
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.last_delta(), Some(delta));
    }

    #[test]
    fn leaderboard_reads_every_user() {
        let store = MemoryStore::default();
        store.create_user("a", &UserProgression::default()).unwrap();
        store.create_user("b", &UserProgression::default()).unwrap();
        assert_eq!(store.leaderboard_entries().len(), 2);
    }
}
