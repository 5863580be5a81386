use anyhow::{Context, Result, bail, ensure};
use chrono::{Days, NaiveDate};
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::store::MemoryStore;
use genesys_progression::constants::LEADERBOARD_SIZE;
use genesys_progression::{
    Action, ActionOutcome, Attribute, ItemEffect, Medal, ProgressionEngine, ProgressionEvent,
    ProgressionService, Rejection, ShopItem, UserProgression, advance_xp, top_n,
};

const DEFAULT_USER: &str = "tester";
const SHIELD_PRICE: u64 = 300;

/// Per-iteration state handed to a scenario.
pub struct ScenarioCtx {
    pub service: ProgressionService<MemoryStore>,
    pub store: MemoryStore,
    pub start: NaiveDate,
    pub rng: ChaCha8Rng,
    pub verbose: bool,
}

impl ScenarioCtx {
    pub fn new(engine: ProgressionEngine, start: NaiveDate, seed: u64, verbose: bool) -> Self {
        let store = MemoryStore::default();
        Self {
            service: ProgressionService::new(engine, store.clone()),
            store,
            start,
            rng: ChaCha8Rng::seed_from_u64(seed),
            verbose,
        }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        self.service.engine()
    }

    pub fn day(&self, offset: u64) -> Result<NaiveDate> {
        self.start
            .checked_add_days(Days::new(offset))
            .with_context(|| format!("day {offset} after {} is out of range", self.start))
    }

    pub fn create(&self, user_id: &str) -> Result<UserProgression> {
        self.service
            .create_account(user_id)
            .with_context(|| format!("creating account {user_id}"))
    }

    /// Run one action through the service and check the stored record matches.
    pub fn perform(&self, user_id: &str, action: &Action, offset: u64) -> Result<ActionOutcome> {
        let today = self.day(offset)?;
        let outcome = self
            .service
            .perform(user_id, action, today)
            .with_context(|| format!("{} for {user_id} on {today}", action.kind()))?;
        if self.verbose {
            debug!(
                "{today} {}: {:?} -> level {} xp {} coins {} streak {}",
                action.kind(),
                outcome.rejection,
                outcome.state.level,
                outcome.state.xp,
                outcome.state.coins,
                outcome.state.streak_count
            );
        }
        let stored = self
            .store
            .user(user_id)
            .with_context(|| format!("{user_id} missing from store"))?;
        ensure!(
            stored == outcome.state,
            "store drifted from engine output after {}",
            action.kind()
        );
        Ok(outcome)
    }
}

type ScenarioFn = fn(&mut ScenarioCtx) -> Result<()>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    run: ScenarioFn,
}

impl Scenario {
    const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        run: ScenarioFn,
    ) -> Self {
        Self {
            key,
            name,
            description,
            run,
        }
    }

    pub fn run(&self, ctx: &mut ScenarioCtx) -> Result<()> {
        (self.run)(ctx)
    }
}

pub const SCENARIOS: [Scenario; 8] = [
    Scenario::new(
        "smoke",
        "New User Check-In",
        "Fresh account checks in once, then again the same day",
        smoke,
    ),
    Scenario::new(
        "streak",
        "Streak Continuity",
        "A week of check-ins, a missed day, then a shield covering a gap",
        streak,
    ),
    Scenario::new(
        "farming",
        "Daily Farm Cap",
        "Farmable actions until the cap rejects them, then the next day",
        farming,
    ),
    Scenario::new(
        "shop",
        "Shop Purchases",
        "Insufficient funds, unique items and xp boosts",
        shop,
    ),
    Scenario::new(
        "leveling",
        "Multi-Level Overflow",
        "One large grant crosses several levels without losing xp",
        leveling,
    ),
    Scenario::new(
        "attributes",
        "Attribute Points",
        "Points earned on level-up are spent and redeemed",
        attributes,
    ),
    Scenario::new(
        "leaderboard",
        "Leaderboard Standings",
        "Top ten ordering and podium medals",
        leaderboard,
    ),
    Scenario::new(
        "invariants",
        "Seeded Invariant Sweep",
        "Random daily activity checked against progression invariants",
        invariants,
    ),
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.description))
}

pub fn get_scenario(key: &str) -> Option<Scenario> {
    let key = key.trim().to_ascii_lowercase();
    SCENARIOS.iter().copied().find(|s| s.key == key)
}

fn smoke(ctx: &mut ScenarioCtx) -> Result<()> {
    let fresh = ctx.create(DEFAULT_USER)?;
    ensure!(
        (fresh.level, fresh.xp, fresh.coins) == (1, 0, 0),
        "new account should start at level 1 with nothing earned"
    );

    let rule = ctx.engine().config().rewards.check_in;
    let curve = ctx.engine().config().level_curve;
    let expected = advance_xp(curve, 1, 0, rule.xp)?;

    let first = ctx.perform(DEFAULT_USER, &Action::CheckIn, 0)?;
    ensure!(first.rejection.is_none(), "first check-in was rejected");
    ensure!(
        (first.state.level, first.state.xp) == (expected.level, expected.xp),
        "check-in xp mismatch: got level {} xp {}",
        first.state.level,
        first.state.xp
    );
    ensure!(first.state.coins == rule.coins, "check-in coins mismatch");
    ensure!(first.state.streak_count == 1, "streak should start at 1");
    ensure!(
        first.events.first() == Some(&ProgressionEvent::StreakExtended { count: 1 }),
        "expected a streak event, got {:?}",
        first.events
    );

    let again = ctx.perform(DEFAULT_USER, &Action::CheckIn, 0)?;
    ensure!(
        again.rejection == Some(Rejection::AlreadyClaimedToday),
        "second check-in on the same day should be rejected"
    );
    ensure!(again.state == first.state, "rejection changed the record");
    Ok(())
}

fn streak(ctx: &mut ScenarioCtx) -> Result<()> {
    ctx.create(DEFAULT_USER)?;
    for day in 0..7 {
        ctx.perform(DEFAULT_USER, &Action::CheckIn, day)?;
    }
    let state = ctx.store.user(DEFAULT_USER).context("user missing")?;
    ensure!(state.streak_count == 7, "expected a 7 day streak");

    // Day 7 is missed.
    let back = ctx.perform(DEFAULT_USER, &Action::CheckIn, 8)?;
    ensure!(
        back.events.as_slice()
            == [
                ProgressionEvent::StreakReset { previous: 7 },
                ProgressionEvent::StreakExtended { count: 1 },
            ],
        "missed day should reset before extending, got {:?}",
        back.events
    );

    ctx.perform(DEFAULT_USER, &Action::CheckIn, 9)?;
    let day10 = ctx.perform(DEFAULT_USER, &Action::CheckIn, 10)?;
    let shield = ShopItem::new(
        "streak-shield",
        "Streak Shield",
        day10.state.coins.min(SHIELD_PRICE),
        ItemEffect::StreakShield,
    );
    let bought = ctx.perform(DEFAULT_USER, &Action::Purchase { item: shield }, 10)?;
    ensure!(bought.state.streak_shields == 1, "shield was not granted");

    // Day 11 is missed but the shield covers it.
    let covered = ctx.perform(DEFAULT_USER, &Action::CheckIn, 12)?;
    ensure!(
        covered.events.first() == Some(&ProgressionEvent::StreakShielded { shields_used: 1 }),
        "shield should absorb the gap, got {:?}",
        covered.events
    );
    ensure!(covered.state.streak_count == 4, "streak should survive the gap");
    ensure!(covered.state.streak_shields == 0, "shield should be spent");
    Ok(())
}

fn farming(ctx: &mut ScenarioCtx) -> Result<()> {
    let rewards = ctx.engine().config().rewards.clone();
    let cap = ctx.engine().config().daily_farm_cap;
    let candidates = [
        (Action::CompleteWorkout, rewards.workout),
        (Action::LogDiet, rewards.diet),
        (Action::IdentifyFood, rewards.food_lookup),
    ];
    let Some((action, rule)) = candidates.into_iter().find(|(_, rule)| rule.farmable) else {
        warn!("no farmable actions configured; nothing to cap");
        return Ok(());
    };

    ctx.create(DEFAULT_USER)?;
    let units = rule.farm_units();
    let expected_grants = cap.div_ceil(units);
    let mut grants = 0u64;
    let capped = loop {
        let outcome = ctx.perform(DEFAULT_USER, &action, 0)?;
        if outcome.is_rejected() {
            break outcome;
        }
        grants += 1;
        ensure!(grants <= expected_grants, "farm cap never triggered");
    };

    ensure!(
        capped.rejection == Some(Rejection::DailyCapReached),
        "expected DAILY_CAP_REACHED, got {:?}",
        capped.rejection
    );
    ensure!(grants == expected_grants, "{grants} grants before the cap");
    ensure!(
        capped.rejection.is_some_and(Rejection::allows_side_effect),
        "capped lookups keep their side effect"
    );

    let writes = ctx.store.write_count();
    let again = ctx.perform(DEFAULT_USER, &action, 0)?;
    ensure!(again.state == capped.state, "rejection is not idempotent");
    ensure!(
        ctx.store.write_count() == writes,
        "rejected action wrote to the store"
    );

    let tomorrow = ctx.perform(DEFAULT_USER, &action, 1)?;
    ensure!(!tomorrow.is_rejected(), "cap did not roll over");
    ensure!(
        tomorrow.state.daily_farm_total == units,
        "farm total should restart at {units}"
    );
    Ok(())
}

fn shop(ctx: &mut ScenarioCtx) -> Result<()> {
    ctx.create(DEFAULT_USER)?;
    let state = ctx.perform(DEFAULT_USER, &Action::CheckIn, 0)?.state;

    let gloves = ShopItem::new("gloves", "Gloves", state.coins + 1, ItemEffect::Cosmetic);
    let denied = ctx.perform(DEFAULT_USER, &Action::Purchase { item: gloves }, 0)?;
    ensure!(
        denied.rejection == Some(Rejection::InsufficientFunds),
        "unaffordable item should be rejected"
    );
    ensure!(denied.state.coins == state.coins, "coins changed on rejection");

    let card = ShopItem::new("rank-card", "Rank Card", state.coins, ItemEffect::Cosmetic).unique();
    let bought = ctx.perform(
        DEFAULT_USER,
        &Action::Purchase { item: card.clone() },
        0,
    )?;
    ensure!(bought.state.coins == 0, "card should cost every coin");
    ensure!(bought.state.owns("rank-card"), "unique item not recorded");

    let again = ctx.perform(DEFAULT_USER, &Action::Purchase { item: card }, 0)?;
    ensure!(
        again.rejection == Some(Rejection::AlreadyOwned),
        "unique item bought twice"
    );

    let boost = 40;
    let potion = ShopItem::new("xp-potion", "XP Potion", 0, ItemEffect::XpBoost { xp: boost });
    let curve = ctx.engine().config().level_curve;
    let expected = advance_xp(curve, bought.state.level, bought.state.xp, boost)?;
    let boosted = ctx.perform(DEFAULT_USER, &Action::Purchase { item: potion }, 0)?;
    ensure!(
        (boosted.state.level, boosted.state.xp) == (expected.level, expected.xp),
        "xp boost did not go through the level curve"
    );
    Ok(())
}

fn leveling(ctx: &mut ScenarioCtx) -> Result<()> {
    ctx.create(DEFAULT_USER)?;
    let engine = ctx.engine().clone();
    let leftover = engine.xp_threshold(4) / 2;
    let amount: u64 = (1..=3).map(|level| engine.xp_threshold(level)).sum::<u64>() + leftover;
    let amount = i64::try_from(amount).context("grant does not fit in i64")?;

    let outcome = ctx.perform(DEFAULT_USER, &Action::GrantXp { amount }, 0)?;
    ensure!(
        (outcome.state.level, outcome.state.xp) == (4, leftover),
        "expected level 4 with {leftover} xp, got level {} xp {}",
        outcome.state.level,
        outcome.state.xp
    );
    let points = 3 * engine.config().attribute_points_per_level;
    ensure!(
        outcome.events.contains(&ProgressionEvent::LevelUp {
            from_level: 1,
            to_level: 4,
            attribute_points: points,
        }),
        "missing level-up event: {:?}",
        outcome.events
    );
    ensure!(
        outcome.state.rank == engine.rank_for(4),
        "rank not updated on level-up"
    );

    let delta = ctx.store.last_delta().context("no delta written")?;
    ensure!(
        delta.sets.contains_key("level") && delta.sets.contains_key("xp"),
        "level change should be written as a field set"
    );

    let invalid = ctx
        .service
        .perform(DEFAULT_USER, &Action::GrantXp { amount: -1 }, ctx.day(0)?);
    ensure!(invalid.is_err(), "negative xp should be invalid input");
    Ok(())
}

fn attributes(ctx: &mut ScenarioCtx) -> Result<()> {
    ctx.create(DEFAULT_USER)?;
    let spend = Action::SpendAttributePoint {
        attribute: Attribute::Strength,
    };
    let none = ctx.perform(DEFAULT_USER, &spend, 0)?;
    ensure!(
        none.rejection == Some(Rejection::NoPointsAvailable),
        "spending without points should be rejected"
    );

    let engine = ctx.engine().clone();
    let amount = i64::try_from(engine.xp_threshold(1)).context("threshold too large")?;
    let leveled = ctx.perform(DEFAULT_USER, &Action::GrantXp { amount }, 0)?;
    let earned = engine.config().attribute_points_per_level;
    ensure!(
        leveled.state.attribute_points == earned,
        "level-up should grant {earned} point(s)"
    );

    let before = leveled.state.attributes.strength;
    let mut state = leveled.state;
    while state.attribute_points > 0 {
        state = ctx.perform(DEFAULT_USER, &spend, 0)?.state;
    }
    ensure!(
        state.attributes.strength == before + earned,
        "strength should rise by {earned}"
    );

    let redeem = Action::RedeemWithPoints {
        reward: "avatar-frame".to_string(),
        cost: 1,
    };
    let denied = ctx.perform(DEFAULT_USER, &redeem, 0)?;
    ensure!(
        denied.rejection == Some(Rejection::NoPointsAvailable),
        "redeeming without points should be rejected"
    );
    Ok(())
}

fn leaderboard(ctx: &mut ScenarioCtx) -> Result<()> {
    let threshold = ctx.engine().xp_threshold(1);
    for i in 0..12u64 {
        let user = format!("user-{i:02}");
        ctx.create(&user)?;
        let amount = i64::try_from(threshold / 4 * i).context("grant too large")?;
        ctx.perform(&user, &Action::GrantXp { amount }, 0)?;
    }

    let standings = top_n(&ctx.store.leaderboard_entries(), LEADERBOARD_SIZE);
    ensure!(standings.len() == LEADERBOARD_SIZE, "leaderboard not truncated");
    ensure!(
        standings[0].entry.user_id == "user-11" && standings[0].medal == Some(Medal::Gold),
        "top spot should go to the highest earner"
    );
    ensure!(
        standings.windows(2).all(|pair| {
            let (a, b) = (&pair[0].entry, &pair[1].entry);
            (a.level, a.xp) >= (b.level, b.xp)
        }),
        "standings out of order"
    );
    ensure!(standings[3].medal.is_none(), "only the podium gets medals");
    Ok(())
}

fn invariants(ctx: &mut ScenarioCtx) -> Result<()> {
    ctx.create(DEFAULT_USER)?;
    let engine = ctx.engine().clone();
    let config = engine.config();
    let max_units = [
        config.rewards.workout,
        config.rewards.diet,
        config.rewards.food_lookup,
    ]
    .iter()
    .map(genesys_progression::RewardRule::farm_units)
    .max()
    .unwrap_or(0);
    let catalog = [
        ShopItem::new("streak-shield", "Streak Shield", SHIELD_PRICE, ItemEffect::StreakShield),
        ShopItem::new("xp-potion", "XP Potion", 500, ItemEffect::XpBoost { xp: 200 }),
    ];

    let mut active_days = 0u32;
    for day in 0..60u64 {
        if ctx.rng.gen_bool(0.2) {
            continue;
        }
        active_days += 1;
        let actions = ctx.rng.gen_range(1..=8);
        for _ in 0..actions {
            let action = match ctx.rng.gen_range(0..8) {
                0 => Action::CheckIn,
                1 => Action::CompleteWorkout,
                2 => Action::LogDiet,
                3 => Action::IdentifyFood,
                4 => Action::CompleteProfile,
                5 => Action::SpendAttributePoint {
                    attribute: Attribute::ALL[ctx.rng.gen_range(0..Attribute::ALL.len())],
                },
                6 => Action::Purchase {
                    item: catalog[ctx.rng.gen_range(0..catalog.len())].clone(),
                },
                _ => Action::GrantXp {
                    amount: ctx.rng.gen_range(0..1_500),
                },
            };
            let outcome = ctx.perform(DEFAULT_USER, &action, day)?;
            let state = &outcome.state;
            let today = ctx.day(day)?;

            if state.xp >= engine.xp_threshold(state.level) {
                bail!("day {day}: xp {} not below threshold at level {}", state.xp, state.level);
            }
            ensure!(
                state.rank_in_sync(&config.ranks),
                "day {day}: rank {} out of sync with level {}",
                state.rank,
                state.level
            );
            ensure!(
                state.farm_total_on(today) < config.daily_farm_cap + max_units,
                "day {day}: farm total {} overshoots the cap",
                state.daily_farm_total
            );
            ensure!(
                state.streak_count <= active_days,
                "day {day}: streak {} exceeds active days {active_days}",
                state.streak_count
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(seed: u64) -> ScenarioCtx {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        ScenarioCtx::new(ProgressionEngine::default(), start, seed, false)
    }

    #[test]
    fn every_scenario_passes_with_defaults() {
        for scenario in SCENARIOS {
            let mut context = ctx(1337);
            scenario
                .run(&mut context)
                .unwrap_or_else(|err| panic!("{} failed: {err:#}", scenario.key));
        }
    }

    #[test]
    fn invariant_sweep_holds_across_seeds() {
        for seed in 0..5 {
            let mut context = ctx(seed);
            get_scenario("invariants").unwrap().run(&mut context).unwrap();
        }
    }

    #[test]
    fn scenario_lookup_is_case_insensitive() {
        assert!(get_scenario("Smoke").is_some());
        assert!(get_scenario(" streak ").is_some());
        assert!(get_scenario("boss-fight").is_none());
        assert_eq!(list_scenarios().count(), SCENARIOS.len());
    }
}
