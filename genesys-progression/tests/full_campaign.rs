use chrono::{Days, NaiveDate};
use genesys_progression::{
    Action, Attribute, ItemEffect, ProgressionEngine, ProgressionEvent, Rejection, ShopCatalog,
    ShopItem, StoreDelta, UserProgression,
};

const CATALOG: &str = r#"{
    "items": [
        {"id": "xp-potion", "name": "XP Potion", "price": 500, "effect": {"kind": "xp_boost", "xp": 200}},
        {"id": "streak-shield", "name": "Streak Shield", "price": 300, "effect": {"kind": "streak_shield"}},
        {"id": "rank-card", "name": "Rank Card", "price": 1200, "unique": true, "effect": {"kind": "cosmetic"}}
    ]
}"#;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
}

fn on(day: u64) -> NaiveDate {
    start().checked_add_days(Days::new(day)).unwrap()
}

fn catalog_item(catalog: &ShopCatalog, id: &str) -> ShopItem {
    catalog.find_item(id).cloned().unwrap()
}

/// Apply an action, replay the delta the way the store would and check the two agree.
fn step(engine: &ProgressionEngine, state: &UserProgression, action: &Action, day: u64) -> UserProgression {
    let outcome = engine.apply(action, state, on(day)).unwrap();
    let delta = StoreDelta::between(state, &outcome.state).unwrap();
    assert_eq!(delta.apply_to(state).unwrap(), outcome.state);
    assert!(outcome.state.rank_in_sync(&engine.config().ranks));
    assert!(outcome.state.xp < engine.xp_threshold(outcome.state.level));
    outcome.state
}

#[test]
fn month_of_training() {
    let engine = ProgressionEngine::default();
    let catalog = ShopCatalog::from_json(CATALOG).unwrap();
    let mut state = engine.new_user();

    state = step(&engine, &state, &Action::CompleteProfile, 0);
    assert!(state.onboarding_claimed);

    for day in 0..30 {
        // Day 12 is skipped entirely.
        if day == 12 {
            continue;
        }
        state = step(&engine, &state, &Action::CheckIn, day);
        state = step(&engine, &state, &Action::CompleteWorkout, day);
        state = step(&engine, &state, &Action::LogDiet, day);
        for _ in 0..3 {
            state = step(&engine, &state, &Action::IdentifyFood, day);
        }
        if day == 10 {
            let shield = catalog_item(&catalog, "streak-shield");
            state = step(&engine, &state, &Action::Purchase { item: shield }, day);
        }
        while state.attribute_points > 0 {
            state = step(
                &engine,
                &state,
                &Action::SpendAttributePoint {
                    attribute: Attribute::Endurance,
                },
                day,
            );
        }
    }

    // The shield bought on day 10 covered the day 12 gap.
    assert_eq!(state.streak_count, 30 - 1);
    assert_eq!(state.streak_shields, 0);

    // 29 active days of 100 + 50 + 30 + 15 xp, plus onboarding.
    let total_xp = 29 * 195 + 50;
    assert_eq!(state.level, 1 + total_xp / 1_000);
    assert_eq!(u64::from(state.level - 1) * 1_000 + state.xp, u64::from(total_xp));
    assert_eq!(state.attributes.endurance, state.level);
    assert_eq!(state.rank, engine.rank_for(state.level));
}

#[test]
fn unique_items_are_bought_once() {
    let engine = ProgressionEngine::default();
    let catalog = ShopCatalog::from_json(CATALOG).unwrap();
    let mut state = engine.new_user();
    state.coins = 3_000;

    let card = catalog_item(&catalog, "rank-card");
    state = step(&engine, &state, &Action::Purchase { item: card.clone() }, 0);
    assert!(state.owns("rank-card"));
    assert_eq!(state.coins, 1_800);

    let again = engine
        .apply(&Action::Purchase { item: card }, &state, on(0))
        .unwrap();
    assert_eq!(again.rejection, Some(Rejection::AlreadyOwned));
    assert_eq!(again.state.coins, 1_800);

    let potion = catalog_item(&catalog, "xp-potion");
    let boosted = engine
        .apply(&Action::Purchase { item: potion }, &state, on(0))
        .unwrap();
    assert_eq!(boosted.state.xp, 200);
    assert_eq!(boosted.state.coins, 1_300);
    assert!(!boosted.state.owns("xp-potion"));
}

#[test]
fn long_absence_resets_even_with_a_shield() {
    let engine = ProgressionEngine::default();
    let mut state = engine.new_user();
    state.coins = 300;
    for day in 0..4 {
        state = step(&engine, &state, &Action::CheckIn, day);
    }
    let shield = ShopItem::new("streak-shield", "Streak Shield", 300, ItemEffect::StreakShield);
    state = step(&engine, &state, &Action::Purchase { item: shield }, 3);
    assert_eq!(state.streak_shields, 1);

    // Three missed days, one shield: all-or-nothing means the streak resets.
    let outcome = engine.apply(&Action::CheckIn, &state, on(7)).unwrap();
    assert_eq!(
        outcome.events.as_slice(),
        &[
            ProgressionEvent::StreakReset { previous: 4 },
            ProgressionEvent::StreakExtended { count: 1 },
        ]
    );
    assert_eq!(outcome.state.streak_shields, 1);
}

#[test]
fn farm_cap_rolls_over_at_midnight() {
    let engine = ProgressionEngine::default();
    let mut state = engine.new_user();

    let mut granted = 0;
    loop {
        let outcome = engine.apply(&Action::CompleteWorkout, &state, on(0)).unwrap();
        if outcome.is_rejected() {
            assert_eq!(outcome.rejection, Some(Rejection::DailyCapReached));
            break;
        }
        granted += 1;
        state = outcome.state;
    }
    // 50 xp per workout against a cap of 500.
    assert_eq!(granted, 10);
    assert_eq!(state.daily_farm_total, 500);

    let next_day = engine.apply(&Action::CompleteWorkout, &state, on(1)).unwrap();
    assert!(!next_day.is_rejected());
    assert_eq!(next_day.state.daily_farm_total, 50);
    assert_eq!(next_day.state.farm_date, Some(on(1)));
}
