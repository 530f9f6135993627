//! End-to-end scenarios through the public engine API

use std::io::Write;
use std::sync::Arc;

use dip_sentinel::filter::{
    BundleSuspicion, FlowAggregatorConfig, FlowWindowStats, HolderRecord, MevPatterns,
    TokenSnapshot, WalletCategory, WindowFlow,
};
use dip_sentinel::source::{SnapshotFile, TokenAnalyzer};
use dip_sentinel::strategy::{AnalysisEngine, RiskLevel, Verdict};

#[test]
fn test_sniper_scenario() {
    let engine = AnalysisEngine::default();
    let holder = HolderRecord {
        avg_hold_time_minutes: Some(3.0),
        transaction_count: Some(15),
        ..HolderRecord::new("SNIPER", 1_000.0, 1.0)
    };
    let classification = engine.classify_wallet(&holder);
    assert_eq!(classification.category, WalletCategory::Sniper);
}

#[test]
fn test_jeeter_bundle_scenario() {
    let engine = AnalysisEngine::default();
    let mut holders: Vec<HolderRecord> = [1_000.0, 1_010.0, 1_020.0, 1_030.0, 990.0]
        .iter()
        .enumerate()
        .map(|(i, balance)| HolderRecord::new(format!("B{}", i), *balance, 0.5))
        .collect();
    holders[0].is_jeeter = true;
    holders[2].is_jeeter = true;
    holders.push(HolderRecord::new("OTHER", 50_000.0, 20.0));

    let bundles = engine.detect_bundles(&holders);
    assert_eq!(bundles.len(), 1);
    let group = &bundles[0];
    assert_eq!(group.size(), 5);
    assert!((group.total_percentage - 2.5).abs() < 1e-9);
    assert!(group.is_suspicious);
    assert!(group
        .suspicions
        .iter()
        .all(|s| matches!(s, BundleSuspicion::MultipleJeeters { .. })));

    let enriched = engine.enrich_holders(&holders);
    assert_eq!(enriched.iter().filter(|h| h.is_bundle).count(), 5);
    assert!(!enriched[5].is_bundle);
}

fn opportunity_inputs() -> (FlowWindowStats, Vec<HolderRecord>, TokenSnapshot) {
    let flow = FlowWindowStats {
        buy_volume_usd: 40_000.0,
        sell_volume_usd: 10_000.0,
        buy_sell_ratio: 0.8,
        m5: WindowFlow::new(0.9, 2_000.0),
        m15: WindowFlow::new(0.9, 6_000.0),
        h1: WindowFlow::new(0.5, 20_000.0),
        h24: WindowFlow::new(0.8, 50_000.0),
        mev: MevPatterns::default(),
        ..Default::default()
    };
    let holders = [(1_000.0, 1.0), (1_500.0, 1.5), (2_000.0, 2.0), (3_000.0, 3.0)]
        .iter()
        .enumerate()
        .map(|(i, (balance, pct))| HolderRecord {
            avg_hold_time_minutes: Some(300.0),
            ..HolderRecord::new(format!("H{}", i), *balance, *pct)
        })
        .collect();
    let token = TokenSnapshot {
        symbol: Some("DIP".to_string()),
        price_usd: 0.004,
        liquidity_usd: 80_000.0,
        market_cap_usd: 400_000.0,
        ..TokenSnapshot::new("MINT")
    };
    (flow, holders, token)
}

#[test]
fn test_dip_opportunity_scenario() {
    let engine = AnalysisEngine::default();
    let (flow, holders, token) = opportunity_inputs();

    let report = engine.analyze(&[], &flow, &holders, &token);

    assert!(!report.structural.is_danger_zone());
    assert!(report.structural.liquidity.is_healthy);
    // 50 + (0.9 - 0.5) * 40
    assert!((report.micro.micro_score - 66.0).abs() < 1e-9);
    assert!(report.structural.structural_score >= 55.0);

    let outcome = &report.outcome;
    assert_eq!(outcome.verdict, Verdict::Opportunity);
    assert!(outcome.is_dip_opportunity);
    assert!(!outcome.is_trap);
    assert!((outcome.entry_band.optimal - 0.004 * 0.98).abs() < 1e-12);
    assert!(outcome.entry_band.contains(0.004));
    assert_ne!(outcome.risk_level, RiskLevel::High);

    assert_eq!(
        engine.run_full_analysis(&[], &flow, &holders, &token).verdict,
        Verdict::Opportunity
    );
}

#[test]
fn test_empty_pipeline_baseline() {
    let engine = AnalysisEngine::default();
    let outcome = engine.run_full_analysis(
        &[],
        &FlowWindowStats::default(),
        &[],
        &TokenSnapshot::new("MINT"),
    );
    assert_eq!(outcome.verdict, Verdict::Trap);
    assert_eq!(outcome.combined_score, 55.0);
    assert_eq!(outcome.micro_score, 50.0);
}

#[test]
fn test_snapshot_file_round_through_analyzer() {
    let (flow, holders, token) = opportunity_inputs();
    let doc = serde_json::json!({
        "token": token,
        "holders": holders,
        "flow": flow,
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(doc.to_string().as_bytes()).unwrap();

    let report = tokio_test::block_on(async {
        let source = SnapshotFile::load(file.path(), FlowAggregatorConfig::default())
            .await
            .unwrap();
        let analyzer = TokenAnalyzer::from_source(AnalysisEngine::default(), Arc::new(source));
        analyzer.analyze("MINT").await.unwrap()
    });

    assert_eq!(report.outcome.verdict, Verdict::Opportunity);
    assert_eq!(report.holder_count, 4);
    assert!(report.bundles.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcome"]["verdict"], "opportunity");
}
