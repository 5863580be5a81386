//! The persisted progression record of a single user.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::constants::{STARTING_ATTRIBUTE_VALUE, STARTING_LEVEL};
use crate::error::ProgressionError;
use crate::rank::RankTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Strength,
    Endurance,
    Intelligence,
}

impl Attribute {
    pub const ALL: [Self; 3] = [Self::Strength, Self::Endurance, Self::Intelligence];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Endurance => "endurance",
            Self::Intelligence => "intelligence",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ProgressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strength" => Ok(Self::Strength),
            "endurance" => Ok(Self::Endurance),
            "intelligence" => Ok(Self::Intelligence),
            _ => Err(ProgressionError::UnknownAttribute {
                name: s.to_string(),
            }),
        }
    }
}

/// Attribute scores; each starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default = "default_attribute")]
    pub strength: u32,
    #[serde(default = "default_attribute")]
    pub endurance: u32,
    #[serde(default = "default_attribute")]
    pub intelligence: u32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: STARTING_ATTRIBUTE_VALUE,
            endurance: STARTING_ATTRIBUTE_VALUE,
            intelligence: STARTING_ATTRIBUTE_VALUE,
        }
    }
}

impl Attributes {
    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Endurance => self.endurance,
            Attribute::Intelligence => self.intelligence,
        }
    }

    const fn slot_mut(&mut self, attribute: Attribute) -> &mut u32 {
        match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Endurance => &mut self.endurance,
            Attribute::Intelligence => &mut self.intelligence,
        }
    }

    pub const fn increment(&mut self, attribute: Attribute) {
        let slot = self.slot_mut(attribute);
        *slot = slot.saturating_add(1);
    }
}

const fn default_attribute() -> u32 {
    STARTING_ATTRIBUTE_VALUE
}

const fn default_level() -> u32 {
    STARTING_LEVEL
}

/// Progression fields of a user document.
///
/// Owned by the external store; the engine only ever returns new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgression {
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub attribute_points: u32,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub streak_count: u32,
    #[serde(default)]
    pub last_activity_date: Option<NaiveDate>,
    /// Farmable reward units collected on `farm_date`.
    #[serde(default)]
    pub daily_farm_total: u64,
    #[serde(default)]
    pub farm_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_check_in: Option<NaiveDate>,
    #[serde(default)]
    pub streak_shields: u32,
    #[serde(default)]
    pub onboarding_claimed: bool,
    #[serde(default)]
    pub owned_items: BTreeSet<String>,
}

impl UserProgression {
    /// Fresh account record: level 1, nothing earned yet.
    #[must_use]
    pub fn new(ranks: &RankTable) -> Self {
        Self {
            level: STARTING_LEVEL,
            xp: 0,
            rank: ranks.rank_for(STARTING_LEVEL).to_string(),
            coins: 0,
            attribute_points: 0,
            attributes: Attributes::default(),
            streak_count: 0,
            last_activity_date: None,
            daily_farm_total: 0,
            farm_date: None,
            last_check_in: None,
            streak_shields: 0,
            onboarding_claimed: false,
            owned_items: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn rank_in_sync(&self, ranks: &RankTable) -> bool {
        self.rank == ranks.rank_for(self.level)
    }

    /// Farm total that counts against `today`'s cap.
    ///
    /// A total stamped with a later day still counts, so winding the clock
    /// back never frees up the cap.
    #[must_use]
    pub fn farm_total_on(&self, today: NaiveDate) -> u64 {
        if self.farm_date.is_some_and(|day| day >= today) {
            self.daily_farm_total
        } else {
            0
        }
    }

    /// Whether the check-in for `today` is already spent. A check-in stamped
    /// with a later day counts as spent too.
    #[must_use]
    pub fn checked_in_on(&self, today: NaiveDate) -> bool {
        self.last_check_in.is_some_and(|day| day >= today)
    }

    #[must_use]
    pub fn owns(&self, item_id: &str) -> bool {
        self.owned_items.contains(item_id)
    }
}

impl Default for UserProgression {
    fn default() -> Self {
        Self::new(&RankTable::default())
    }
}
