//! Ranking users against each other.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::state::UserProgression;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub level: u32,
    pub xp: u64,
    pub streak: u32,
}

impl LeaderboardEntry {
    #[must_use]
    pub fn from_progression(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        state: &UserProgression,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            level: state.level,
            xp: state.xp,
            streak: state.streak_count,
        }
    }

    /// Higher level first, then xp, then streak; user id breaks ties.
    fn standing_order(&self, other: &Self) -> Ordering {
        other
            .level
            .cmp(&self.level)
            .then_with(|| other.xp.cmp(&self.xp))
            .then_with(|| other.streak.cmp(&self.streak))
            .then_with(|| self.user_id.cmp(&other.user_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a 1-based podium position.
    #[must_use]
    pub const fn for_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based.
    pub position: usize,
    pub medal: Option<Medal>,
    pub entry: LeaderboardEntry,
}

/// The best `n` entries in standing order.
#[must_use]
pub fn top_n(entries: &[LeaderboardEntry], n: usize) -> Vec<Standing> {
    let mut sorted: Vec<&LeaderboardEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.standing_order(b));
    sorted
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, entry)| {
            let position = idx + 1;
            Standing {
                position,
                medal: Medal::for_position(position),
                entry: entry.clone(),
            }
        })
        .collect()
}
