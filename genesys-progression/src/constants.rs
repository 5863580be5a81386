//! Centralized balance and tuning constants for GenesysFit progression.
//!
//! These values are the defaults behind [`crate::ProgressionConfig`]. Keeping
//! them together means a reward or threshold change shows up in one reviewed
//! diff instead of being scattered across callers.

// Account defaults ---------------------------------------------------------
pub const STARTING_LEVEL: u32 = 1;
pub const STARTING_ATTRIBUTE_VALUE: u32 = 1;

// Level curve --------------------------------------------------------------
pub const DEFAULT_XP_PER_LEVEL: u64 = 1_000;
pub const DEFAULT_QUADRATIC_BASE: u64 = 100;
pub const DEFAULT_ATTRIBUTE_POINTS_PER_LEVEL: u32 = 1;
pub(crate) const MAX_PROGRESS_PERCENT: u64 = 100;

// Reward table -------------------------------------------------------------
pub const CHECK_IN_XP: u64 = 100;
pub const CHECK_IN_COINS: u64 = 50;
pub const WORKOUT_XP: u64 = 50;
pub const WORKOUT_COINS: u64 = 10;
pub const DIET_XP: u64 = 30;
pub const DIET_COINS: u64 = 5;
pub const FOOD_LOOKUP_XP: u64 = 5;
pub const FOOD_LOOKUP_COINS: u64 = 0;
pub const ONBOARDING_XP: u64 = 50;
pub const ONBOARDING_COINS: u64 = 10;

// Anti-abuse ---------------------------------------------------------------
/// Farmable XP a user may collect per calendar day.
pub const DEFAULT_DAILY_FARM_CAP: u64 = 500;

// Leaderboard --------------------------------------------------------------
pub const LEADERBOARD_SIZE: usize = 10;

// Document field keys ------------------------------------------------------
pub(crate) const FIELD_LEVEL: &str = "level";
pub(crate) const FIELD_XP: &str = "xp";
pub(crate) const FIELD_RANK: &str = "rank";
pub(crate) const FIELD_COINS: &str = "coins";
pub(crate) const FIELD_ATTRIBUTE_POINTS: &str = "attributePoints";
pub(crate) const FIELD_ATTRIBUTES: &str = "attributes";
pub(crate) const FIELD_STREAK_COUNT: &str = "streakCount";
pub(crate) const FIELD_LAST_ACTIVITY: &str = "lastActivityDate";
pub(crate) const FIELD_DAILY_FARM_TOTAL: &str = "dailyFarmTotal";
pub(crate) const FIELD_FARM_DATE: &str = "farmDate";
pub(crate) const FIELD_LAST_CHECK_IN: &str = "lastCheckIn";
pub(crate) const FIELD_STREAK_SHIELDS: &str = "streakShields";
pub(crate) const FIELD_ONBOARDING_CLAIMED: &str = "onboardingClaimed";
pub(crate) const FIELD_OWNED_ITEMS: &str = "ownedItems";

// Presentation keys --------------------------------------------------------
pub(crate) const UI_REJECTED_PREFIX: &str = "progression.rejected.";
pub(crate) const UI_STREAK_EXTENDED: &str = "progression.streak.extended";
pub(crate) const UI_STREAK_RESET: &str = "progression.streak.reset";
pub(crate) const UI_STREAK_SHIELDED: &str = "progression.streak.shielded";
pub(crate) const UI_LEVEL_UP: &str = "progression.level-up";
pub(crate) const UI_RANK_CHANGED: &str = "progression.rank.changed";
pub(crate) const UI_RANK_REPAIRED: &str = "progression.rank.repaired";
