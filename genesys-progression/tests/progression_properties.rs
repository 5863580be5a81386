use chrono::{Days, NaiveDate};
use genesys_progression::{
    Action, ItemEffect, LevelCurve, ProgressionConfig, ProgressionEngine, ProgressionError,
    ProgressionEvent, RankTable, Rejection, ShopItem, advance_xp, apply_xp, check_decay,
    record_activity,
};

fn day1() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn plus(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap()
}

#[test]
fn rank_is_defined_and_stable_for_every_level() {
    let table = RankTable::default();
    for level in 1..=250u32 {
        let first = table.rank_for(level).to_string();
        assert!(!first.is_empty(), "no rank for level {level}");
        assert_eq!(table.rank_for(level), first);
    }
    assert_eq!(table.rank_for(36), "Rank B");
    assert_eq!(table.rank_for(40), "Rank B");
}

#[test]
fn xp_always_ends_below_the_threshold() {
    for curve in [LevelCurve::default(), LevelCurve::quadratic()] {
        for level in [1u32, 2, 7, 40, 99] {
            for gained in [0u64, 1, 999, 1_000, 12_345, 250_000] {
                let out = advance_xp(curve, level, 0, gained).unwrap();
                assert!(
                    out.xp < curve.threshold(out.level),
                    "{curve:?} level {level} +{gained} left {} xp at level {}",
                    out.xp,
                    out.level
                );
            }
        }
    }
}

#[test]
fn multi_level_overflow_keeps_leftover_xp() {
    let out = apply_xp(LevelCurve::default(), 1, 900, 2_500).unwrap();
    assert_eq!(out.level, 4);
    assert_eq!(out.xp, 400);
    assert!(out.leveled_up);
    assert_eq!(out.levels_gained, 3);

    let total_before = 900 + 2_500;
    let total_after = u64::from(out.levels_gained) * 1_000 + out.xp;
    assert_eq!(total_before, total_after);
}

#[test]
fn negative_xp_is_invalid_input() {
    assert_eq!(
        apply_xp(LevelCurve::default(), 3, 10, -1),
        Err(ProgressionError::NegativeXp { amount: -1 })
    );
}

#[test]
fn same_day_activity_is_not_double_counted() {
    let activity = record_activity(Some(day1()), day1());
    assert_eq!(activity.delta, 0);
}

#[test]
fn two_day_gap_decays_the_streak() {
    assert_eq!(check_decay(Some(day1()), 5, plus(day1(), 2)), 0);
}

#[test]
fn capped_farming_leaves_xp_and_coins_alone() {
    let engine = ProgressionEngine::default();
    let mut state = engine.new_user();
    state.xp = 120;
    state.coins = 30;
    state.daily_farm_total = engine.config().daily_farm_cap;
    state.farm_date = Some(day1());

    let outcome = engine.apply(&Action::IdentifyFood, &state, day1()).unwrap();
    assert_eq!(outcome.rejection, Some(Rejection::DailyCapReached));
    assert_eq!(outcome.state.xp, 120);
    assert_eq!(outcome.state.coins, 30);
    assert_eq!(
        outcome.events.as_slice(),
        &[ProgressionEvent::Rejected {
            reason: Rejection::DailyCapReached
        }]
    );
}

#[test]
fn unaffordable_purchase_keeps_coins() {
    let engine = ProgressionEngine::default();
    let mut state = engine.new_user();
    state.coins = 100;
    let item = ShopItem::new("gloves", "Gloves", 150, ItemEffect::Cosmetic);

    let outcome = engine
        .apply(&Action::Purchase { item }, &state, day1())
        .unwrap();
    assert_eq!(outcome.rejection, Some(Rejection::InsufficientFunds));
    assert_eq!(outcome.state.coins, 100);
}

#[test]
fn rejection_is_idempotent() {
    let engine = ProgressionEngine::default();
    let state = engine.new_user();
    let spend = Action::SpendAttributePoint {
        attribute: "strength".parse().unwrap(),
    };

    let first = engine.apply(&spend, &state, day1()).unwrap();
    let second = engine.apply(&spend, &first.state, day1()).unwrap();
    assert_eq!(first.rejection, Some(Rejection::NoPointsAvailable));
    assert_eq!(first, second);
    assert_eq!(first.state, state);
}

#[test]
fn new_user_check_in_end_to_end() {
    let engine = ProgressionEngine::default();
    let fresh = engine.new_user();
    assert_eq!((fresh.level, fresh.xp, fresh.coins), (1, 0, 0));

    let first = engine.apply(&Action::CheckIn, &fresh, day1()).unwrap();
    assert_eq!(first.state.xp, 100);
    assert_eq!(first.state.coins, 50);
    assert_eq!(first.state.streak_count, 1);
    assert_eq!(first.state.last_activity_date, Some(day1()));
    assert_eq!(
        first.events.as_slice(),
        &[ProgressionEvent::StreakExtended { count: 1 }]
    );

    let repeat = engine.apply(&Action::CheckIn, &first.state, day1()).unwrap();
    assert_eq!(repeat.rejection, Some(Rejection::AlreadyClaimedToday));
    assert_eq!(repeat.state.streak_count, 1);
    assert_eq!(repeat.state.xp, 100);

    let next_day = engine
        .apply(&Action::CheckIn, &repeat.state, plus(day1(), 1))
        .unwrap();
    assert_eq!(next_day.state.streak_count, 2);
    assert_eq!(next_day.state.xp, 200);
}

#[test]
fn quadratic_curve_is_selectable() {
    let config = ProgressionConfig {
        level_curve: LevelCurve::quadratic(),
        ..ProgressionConfig::default()
    };
    let engine = ProgressionEngine::new(config).unwrap();
    let outcome = engine
        .apply(&Action::GrantXp { amount: 500 }, &engine.new_user(), day1())
        .unwrap();
    // 100 xp for level 1, 400 for level 2.
    assert_eq!(outcome.state.level, 3);
    assert_eq!(outcome.state.xp, 0);
}
