//! Range and no-panic properties of the scoring core

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use dip_sentinel::filter::{
    FlowWindowStats, HolderRecord, MevPatterns, PricePoint, TokenSnapshot, TradeEvent, WindowFlow,
};
use dip_sentinel::strategy::{AnalysisEngine, Verdict};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// Any f64, NaN and infinities included
fn any_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1.0e6..1.0e6f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
        1 => Just(0.0),
    ]
}

fn arbitrary_events() -> impl Strategy<Value = Vec<TradeEvent>> {
    prop::collection::vec((0i64..86_400, any_number()), 0..8).prop_map(|raw| {
        let mut events: Vec<TradeEvent> = raw
            .into_iter()
            .map(|(secs, amount)| {
                TradeEvent::new(base_time() + chrono::Duration::seconds(secs), amount)
            })
            .collect();
        events.sort_by_key(|e| e.timestamp);
        events
    })
}

fn arbitrary_holder() -> impl Strategy<Value = HolderRecord> {
    (
        "[A-Z]{4}",
        any_number(),
        any_number(),
        prop::option::of(any_number()),
        prop::option::of(0u32..500),
        arbitrary_events(),
        arbitrary_events(),
        prop::option::of(0.0..100.0f64),
        any::<bool>(),
    )
        .prop_map(
            |(address, balance, percentage, hold, tx, buys, sells, score, is_jeeter)| HolderRecord {
                balance,
                percentage,
                avg_hold_time_minutes: hold,
                transaction_count: tx,
                buy_events: buys,
                sell_events: sells,
                jeeter_score: score,
                is_jeeter,
                ..HolderRecord::new(address, 0.0, 0.0)
            },
        )
}

fn arbitrary_window() -> impl Strategy<Value = WindowFlow> {
    (any_number(), any_number()).prop_map(|(buy_ratio, volume_usd)| WindowFlow {
        buy_ratio,
        volume_usd,
    })
}

fn arbitrary_flow() -> impl Strategy<Value = FlowWindowStats> {
    (
        (any_number(), any_number(), any_number()),
        (arbitrary_window(), arbitrary_window(), arbitrary_window(), arbitrary_window()),
        (0u32..50, 0u32..50, any::<bool>(), any_number()),
        (any_number(), any_number()),
    )
        .prop_map(
            |((buy, sell, ratio), (m5, m15, h1, h24), (large_buys, large_sells, mev, mev_score), (tpm, avg))| {
                FlowWindowStats {
                    buy_volume_usd: buy,
                    sell_volume_usd: sell,
                    buy_sell_ratio: ratio,
                    m5,
                    m15,
                    h1,
                    h24,
                    large_buy_count: large_buys,
                    large_sell_count: large_sells,
                    mev: MevPatterns {
                        detected: mev,
                        score: mev_score,
                        ..Default::default()
                    },
                    transactions_per_minute: tpm,
                    average_transaction_size_usd: avg,
                    ..Default::default()
                }
            },
        )
}

fn arbitrary_token() -> impl Strategy<Value = TokenSnapshot> {
    (any_number(), any_number(), any_number()).prop_map(|(price, liquidity, market_cap)| {
        TokenSnapshot {
            price_usd: price,
            liquidity_usd: liquidity,
            market_cap_usd: market_cap,
            ..TokenSnapshot::new("MINT")
        }
    })
}

fn arbitrary_prices() -> impl Strategy<Value = Vec<PricePoint>> {
    prop::collection::vec(any_number(), 0..90).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, price)| {
                PricePoint::new(base_time() + chrono::Duration::seconds(i as i64 * 60), price)
            })
            .collect()
    })
}

fn in_score_range(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

proptest! {
    #[test]
    fn prop_classification_in_range(holder in arbitrary_holder()) {
        let engine = AnalysisEngine::default();
        let classification = engine.classify_wallet(&holder);
        prop_assert!(in_score_range(classification.quality_score));
        prop_assert!(in_score_range(classification.confidence));
    }

    #[test]
    fn prop_wallet_quality_in_range(holders in prop::collection::vec(arbitrary_holder(), 0..40)) {
        let engine = AnalysisEngine::default();
        let quality = engine.analyze_wallet_quality(&holders);
        prop_assert!(in_score_range(quality.overall_quality_score));
        prop_assert_eq!(quality.total_wallets, holders.len());
        prop_assert_eq!(quality.counts.total(), holders.len());
    }

    #[test]
    fn prop_risk_scores_pure_and_bounded(
        holders in prop::collection::vec(arbitrary_holder(), 0..40),
        flow in arbitrary_flow(),
    ) {
        let engine = AnalysisEngine::default();
        let bundles = engine.detect_bundles(&holders);
        let first = engine.assess_holder_risk(&holders, &bundles, &flow);
        let second = engine.assess_holder_risk(&holders, &bundles, &flow);

        prop_assert!(in_score_range(first.jeeter_risk_score));
        prop_assert!(in_score_range(first.overall_score));
        prop_assert_eq!(first.jeeter_risk_score, second.jeeter_risk_score);
        prop_assert_eq!(first.overall_score, second.overall_score);

        let direct = engine.compute_jeeter_risk_score(&first.analysis, &first.metrics);
        prop_assert_eq!(direct, first.jeeter_risk_score);
        prop_assert_eq!(engine.compute_overall_score(&first.analysis), first.overall_score);
    }

    #[test]
    fn prop_outcome_exactly_one_verdict(
        prices in arbitrary_prices(),
        flow in arbitrary_flow(),
        holders in prop::collection::vec(arbitrary_holder(), 0..30),
        token in arbitrary_token(),
    ) {
        let engine = AnalysisEngine::default();
        let report = engine.analyze(&prices, &flow, &holders, &token);
        let outcome = &report.outcome;

        prop_assert!(!(outcome.is_trap && outcome.is_dip_opportunity));
        prop_assert_eq!(outcome.is_trap, outcome.verdict == Verdict::Trap);
        prop_assert_eq!(outcome.is_dip_opportunity, outcome.verdict == Verdict::Opportunity);
        prop_assert!(in_score_range(outcome.confidence));
        prop_assert!(in_score_range(outcome.combined_score));
        prop_assert!(in_score_range(outcome.expected_dip_pct));
        prop_assert!(in_score_range(report.micro.micro_score));
        prop_assert!(in_score_range(report.micro.bot_activity_index));
        prop_assert!(in_score_range(report.structural.structural_score));
        prop_assert!(in_score_range(report.structural.liquidity.score));
        prop_assert!(in_score_range(report.structural.exhaustion.score));
        prop_assert!(report.structural.danger_zone.risk_score.is_finite());
        prop_assert!(outcome.entry_band.lower.is_finite());
        prop_assert!(outcome.entry_band.lower <= outcome.entry_band.upper);
        prop_assert!((-10.0..=10.0).contains(&report.micro.momentum_5));
        prop_assert!((-1.0..=1.0).contains(&report.micro.volatility_trend));
    }

    #[test]
    fn prop_trap_confidence_monotonic_in_danger(
        micro_score in 0.0..100.0f64,
        structural_score in 0.0..100.0f64,
        low in 50.0..200.0f64,
        bump in 0.0..100.0f64,
    ) {
        let engine = AnalysisEngine::default();
        let mut micro = engine.compute_microstructure(&[], &FlowWindowStats::default(), None);
        micro.micro_score = micro_score;
        let mut structural =
            engine.compute_structural(&[], &FlowWindowStats::default(), &TokenSnapshot::new("MINT"), &[]);
        structural.structural_score = structural_score;

        structural.danger_zone.risk_score = low;
        let before = engine.predict_outcome(1.0, &micro, &structural);
        structural.danger_zone.risk_score = low + bump;
        let after = engine.predict_outcome(1.0, &micro, &structural);

        prop_assert_eq!(before.verdict, Verdict::Trap);
        prop_assert_eq!(after.verdict, Verdict::Trap);
        prop_assert!(after.confidence >= before.confidence);
    }
}

#[test]
fn test_empty_holders_quality_is_zero() {
    let engine = AnalysisEngine::default();
    let quality = engine.analyze_wallet_quality(&[]);
    assert_eq!(quality.overall_quality_score, 0.0);
}

#[test]
fn test_empty_flow_is_neutral() {
    let flow = FlowWindowStats::default();
    assert_eq!(flow.buy_sell_ratio, 0.5);
    assert_eq!(flow.m5.buy_ratio, 0.5);
    assert_eq!(flow.large_buy_count + flow.large_sell_count + flow.whale_count, 0);
    assert_eq!(flow, AnalysisEngine::default().aggregate_flow(&[], base_time()));
}
