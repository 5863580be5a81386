//! Reward ledger: what each action is worth and whether policy allows it.
//!
//! The ledger only decides. It reads a snapshot and returns a [`RewardOutcome`];
//! the facade in [`crate::engine`] is the one that writes the resulting deltas.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ProgressionConfig;
use crate::constants::{
    CHECK_IN_COINS, CHECK_IN_XP, DIET_COINS, DIET_XP, FOOD_LOOKUP_COINS, FOOD_LOOKUP_XP,
    ONBOARDING_COINS, ONBOARDING_XP, WORKOUT_COINS, WORKOUT_XP,
};
use crate::error::ProgressionError;
use crate::shop::{ItemEffect, ShopItem};
use crate::state::{Attribute, UserProgression};

/// Something the user did that may change their progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Daily check-in; once per calendar day.
    CheckIn,
    CompleteWorkout,
    LogDiet,
    /// Food identification lookup.
    IdentifyFood,
    /// One-time bonus for filling in the profile.
    CompleteProfile,
    /// Mission XP granted by the caller.
    GrantXp { amount: i64 },
    Purchase { item: ShopItem },
    SpendAttributePoint { attribute: Attribute },
    /// Exchange attribute points for a named reward.
    RedeemWithPoints { reward: String, cost: u32 },
}

impl Action {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::CheckIn => ActionKind::CheckIn,
            Self::CompleteWorkout => ActionKind::CompleteWorkout,
            Self::LogDiet => ActionKind::LogDiet,
            Self::IdentifyFood => ActionKind::IdentifyFood,
            Self::CompleteProfile => ActionKind::CompleteProfile,
            Self::GrantXp { .. } => ActionKind::GrantXp,
            Self::Purchase { .. } => ActionKind::Purchase,
            Self::SpendAttributePoint { .. } => ActionKind::SpendAttributePoint,
            Self::RedeemWithPoints { .. } => ActionKind::RedeemWithPoints,
        }
    }
}

/// Fieldless tag for [`Action`], used for lookups and wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CheckIn,
    CompleteWorkout,
    LogDiet,
    IdentifyFood,
    CompleteProfile,
    GrantXp,
    Purchase,
    SpendAttributePoint,
    RedeemWithPoints,
}

impl ActionKind {
    pub const ALL: [Self; 9] = [
        Self::CheckIn,
        Self::CompleteWorkout,
        Self::LogDiet,
        Self::IdentifyFood,
        Self::CompleteProfile,
        Self::GrantXp,
        Self::Purchase,
        Self::SpendAttributePoint,
        Self::RedeemWithPoints,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::CompleteWorkout => "complete_workout",
            Self::LogDiet => "log_diet",
            Self::IdentifyFood => "identify_food",
            Self::CompleteProfile => "complete_profile",
            Self::GrantXp => "grant_xp",
            Self::Purchase => "purchase",
            Self::SpendAttributePoint => "spend_attribute_point",
            Self::RedeemWithPoints => "redeem_with_points",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ProgressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| ProgressionError::UnknownAction {
                name: s.to_string(),
            })
    }
}

/// Fixed payout of a rule-based action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRule {
    pub xp: u64,
    pub coins: u64,
    /// Counts toward the daily farm cap.
    #[serde(default)]
    pub farmable: bool,
    /// Extends the daily streak.
    #[serde(default)]
    pub streak_qualifying: bool,
}

impl RewardRule {
    #[must_use]
    pub const fn new(xp: u64, coins: u64) -> Self {
        Self {
            xp,
            coins,
            farmable: false,
            streak_qualifying: false,
        }
    }

    #[must_use]
    pub const fn farmable(mut self) -> Self {
        self.farmable = true;
        self
    }

    #[must_use]
    pub const fn streak(mut self) -> Self {
        self.streak_qualifying = true;
        self
    }

    /// Units charged against the farm cap; at least one per farmable claim.
    #[must_use]
    pub fn farm_units(&self) -> u64 {
        if self.farmable { self.xp.max(1) } else { 0 }
    }
}

/// Payouts for every rule-based action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    #[serde(default = "RewardTable::default_check_in")]
    pub check_in: RewardRule,
    #[serde(default = "RewardTable::default_workout")]
    pub workout: RewardRule,
    #[serde(default = "RewardTable::default_diet")]
    pub diet: RewardRule,
    #[serde(default = "RewardTable::default_food_lookup")]
    pub food_lookup: RewardRule,
    #[serde(default = "RewardTable::default_onboarding")]
    pub onboarding: RewardRule,
}

impl RewardTable {
    const fn default_check_in() -> RewardRule {
        RewardRule::new(CHECK_IN_XP, CHECK_IN_COINS).streak()
    }

    const fn default_workout() -> RewardRule {
        RewardRule::new(WORKOUT_XP, WORKOUT_COINS).farmable().streak()
    }

    const fn default_diet() -> RewardRule {
        RewardRule::new(DIET_XP, DIET_COINS).farmable().streak()
    }

    const fn default_food_lookup() -> RewardRule {
        RewardRule::new(FOOD_LOOKUP_XP, FOOD_LOOKUP_COINS).farmable()
    }

    const fn default_onboarding() -> RewardRule {
        RewardRule::new(ONBOARDING_XP, ONBOARDING_COINS)
    }

    /// Rule for `kind`, or `None` for actions whose payout is carried by the action itself.
    #[must_use]
    pub const fn rule(&self, kind: ActionKind) -> Option<&RewardRule> {
        match kind {
            ActionKind::CheckIn => Some(&self.check_in),
            ActionKind::CompleteWorkout => Some(&self.workout),
            ActionKind::LogDiet => Some(&self.diet),
            ActionKind::IdentifyFood => Some(&self.food_lookup),
            ActionKind::CompleteProfile => Some(&self.onboarding),
            ActionKind::GrantXp
            | ActionKind::Purchase
            | ActionKind::SpendAttributePoint
            | ActionKind::RedeemWithPoints => None,
        }
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            check_in: Self::default_check_in(),
            workout: Self::default_workout(),
            diet: Self::default_diet(),
            food_lookup: Self::default_food_lookup(),
            onboarding: Self::default_onboarding(),
        }
    }
}

/// Expected policy refusals. Not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    DailyCapReached,
    InsufficientFunds,
    NoPointsAvailable,
    AlreadyClaimedToday,
    AlreadyClaimed,
    AlreadyOwned,
}

impl Rejection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyCapReached => "DAILY_CAP_REACHED",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::NoPointsAvailable => "NO_POINTS_AVAILABLE",
            Self::AlreadyClaimedToday => "ALREADY_CLAIMED_TODAY",
            Self::AlreadyClaimed => "ALREADY_CLAIMED",
            Self::AlreadyOwned => "ALREADY_OWNED",
        }
    }

    /// Whether the action's non-reward effect (e.g. logging the food) still happens.
    #[must_use]
    pub const fn allows_side_effect(self) -> bool {
        matches!(self, Self::DailyCapReached)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field deltas produced by an accepted action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardGrant {
    pub xp: u64,
    pub coins: u64,
    pub coin_cost: u64,
    pub farm_units: u64,
    pub attribute_points_spent: u32,
    pub attribute: Option<Attribute>,
    pub streak_shields: u32,
    pub owned_item: Option<String>,
    pub streak_qualifying: bool,
    pub marks_check_in: bool,
    pub marks_onboarding: bool,
}

impl RewardGrant {
    /// Net change in coins.
    #[must_use]
    pub fn coin_delta(&self) -> i64 {
        let gained = i128::from(self.coins) - i128::from(self.coin_cost);
        i64::try_from(gained).unwrap_or(if gained < 0 { i64::MIN } else { i64::MAX })
    }

    fn from_rule(rule: &RewardRule) -> Self {
        Self {
            xp: rule.xp,
            coins: rule.coins,
            farm_units: rule.farm_units(),
            streak_qualifying: rule.streak_qualifying,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewardOutcome {
    Granted(RewardGrant),
    Rejected { reason: Rejection },
}

impl RewardOutcome {
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Granted(_) => None,
            Self::Rejected { reason } => Some(*reason),
        }
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// True for grants and for rejections that still let the caller record the activity.
    #[must_use]
    pub const fn allows_side_effect(&self) -> bool {
        match self {
            Self::Granted(_) => true,
            Self::Rejected { reason } => reason.allows_side_effect(),
        }
    }

    const fn reject(reason: Rejection) -> Self {
        Self::Rejected { reason }
    }
}

/// Price `action` against `state` for `today`.
///
/// Expects a refreshed snapshot; farm totals from other days never count.
///
/// # Errors
///
/// Returns [`ProgressionError::NegativeXp`] for a negative mission grant and
/// [`ProgressionError::FreeRedemption`] for a point redemption that costs nothing.
pub fn apply_reward(
    config: &ProgressionConfig,
    action: &Action,
    state: &UserProgression,
    today: NaiveDate,
) -> Result<RewardOutcome, ProgressionError> {
    let outcome = match action {
        Action::GrantXp { amount } => {
            let xp = u64::try_from(*amount)
                .map_err(|_| ProgressionError::NegativeXp { amount: *amount })?;
            RewardOutcome::Granted(RewardGrant {
                xp,
                ..RewardGrant::default()
            })
        }
        Action::Purchase { item } => price_purchase(item, state),
        Action::SpendAttributePoint { attribute } => {
            if state.attribute_points == 0 {
                RewardOutcome::reject(Rejection::NoPointsAvailable)
            } else {
                RewardOutcome::Granted(RewardGrant {
                    attribute_points_spent: 1,
                    attribute: Some(*attribute),
                    ..RewardGrant::default()
                })
            }
        }
        Action::RedeemWithPoints { reward, cost } => {
            if *cost == 0 {
                return Err(ProgressionError::FreeRedemption {
                    reward: reward.clone(),
                });
            }
            if state.owns(reward) {
                RewardOutcome::reject(Rejection::AlreadyOwned)
            } else if state.attribute_points < *cost {
                RewardOutcome::reject(Rejection::NoPointsAvailable)
            } else {
                RewardOutcome::Granted(RewardGrant {
                    attribute_points_spent: *cost,
                    owned_item: Some(reward.clone()),
                    ..RewardGrant::default()
                })
            }
        }
        Action::CheckIn
        | Action::CompleteWorkout
        | Action::LogDiet
        | Action::IdentifyFood
        | Action::CompleteProfile => {
            let kind = action.kind();
            let rule = config
                .rewards
                .rule(kind)
                .ok_or_else(|| ProgressionError::UnknownAction {
                    name: kind.to_string(),
                })?;
            price_rule_action(config, rule, kind, state, today)
        }
    };
    Ok(outcome)
}

fn price_purchase(item: &ShopItem, state: &UserProgression) -> RewardOutcome {
    if item.unique && state.owns(&item.id) {
        return RewardOutcome::reject(Rejection::AlreadyOwned);
    }
    if !item.can_afford(state.coins) {
        return RewardOutcome::reject(Rejection::InsufficientFunds);
    }

    let mut grant = RewardGrant {
        coin_cost: item.price,
        ..RewardGrant::default()
    };
    match item.effect {
        ItemEffect::XpBoost { xp } => grant.xp = xp,
        ItemEffect::StreakShield => grant.streak_shields = 1,
        ItemEffect::Cosmetic => {}
    }
    if item.unique {
        grant.owned_item = Some(item.id.clone());
    }
    RewardOutcome::Granted(grant)
}

fn price_rule_action(
    config: &ProgressionConfig,
    rule: &RewardRule,
    kind: ActionKind,
    state: &UserProgression,
    today: NaiveDate,
) -> RewardOutcome {
    match kind {
        ActionKind::CheckIn if state.checked_in_on(today) => {
            return RewardOutcome::reject(Rejection::AlreadyClaimedToday);
        }
        ActionKind::CompleteProfile if state.onboarding_claimed => {
            return RewardOutcome::reject(Rejection::AlreadyClaimed);
        }
        _ => {}
    }

    if rule.farmable && state.farm_total_on(today) >= config.daily_farm_cap {
        return RewardOutcome::reject(Rejection::DailyCapReached);
    }

    let mut grant = RewardGrant::from_rule(rule);
    grant.marks_check_in = kind == ActionKind::CheckIn;
    grant.marks_onboarding = kind == ActionKind::CompleteProfile;
    RewardOutcome::Granted(grant)
}
