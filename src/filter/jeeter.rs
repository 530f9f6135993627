//! Jeeter detection
//!
//! Per-holder jeeter scoring plus the holder-set metrics the risk calculator
//! consumes. A jeeter buys and exits within minutes; in aggregate they are
//! the main source of dump pressure after a pump.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::filter::bundled_detection::BundleGroup;
use crate::filter::types::{FlowWindowStats, HolderRecord, TradeEvent};
use crate::strategy::series::{clamp_score, sanitize};

/// Jeeter scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JeeterConfig {
    /// A buy followed by a sell within this window is a quick round trip
    pub round_trip_window_secs: i64,
    /// Holders scoring above this are jeeters
    pub jeeter_threshold: f64,
    /// Holders that sold at least this share of what they bought are round-trippers
    pub round_tripper_sold_fraction: f64,
    /// Transaction count above which a holder looks automated
    pub bot_min_tx_count: u32,
    /// Quick round trips above which a holder looks automated
    pub bot_min_round_trips: usize,
    /// How many of the largest holders count towards top-holder metrics
    pub top_holder_count: usize,
}

impl Default for JeeterConfig {
    fn default() -> Self {
        Self {
            round_trip_window_secs: 120,
            jeeter_threshold: 50.0,
            round_tripper_sold_fraction: 0.8,
            bot_min_tx_count: 50,
            bot_min_round_trips: 3,
            top_holder_count: 10,
        }
    }
}

impl JeeterConfig {
    pub fn round_trip_window(&self) -> Duration {
        Duration::seconds(self.round_trip_window_secs)
    }
}

/// Pair each buy with the first unused sell at or after it.
///
/// Returns the pairing durations in minutes, in buy order.
pub fn round_trip_durations(holder: &HolderRecord) -> Vec<f64> {
    let mut buys: Vec<TradeEvent> = holder.buy_events.clone();
    let mut sells: Vec<TradeEvent> = holder.sell_events.clone();
    buys.sort_by_key(|e| e.timestamp);
    sells.sort_by_key(|e| e.timestamp);

    let mut durations = Vec::new();
    let mut next_sell = 0;
    for buy in &buys {
        while next_sell < sells.len() && sells[next_sell].timestamp < buy.timestamp {
            next_sell += 1;
        }
        let Some(sell) = sells.get(next_sell) else {
            break;
        };
        let held = sell.timestamp - buy.timestamp;
        durations.push(held.num_milliseconds() as f64 / 60_000.0);
        next_sell += 1;
    }
    durations
}

/// Buy->sell round trips completing within `window`
pub fn quick_round_trips(holder: &HolderRecord, window: Duration) -> usize {
    let limit = window.num_milliseconds() as f64 / 60_000.0;
    round_trip_durations(holder)
        .into_iter()
        .filter(|minutes| *minutes <= limit)
        .count()
}

/// Best available average hold time in minutes.
///
/// Stated value first, then paired buy/sell events, then the activity span.
/// `None` means the hold time is unknown, not zero.
pub fn effective_hold_time(holder: &HolderRecord) -> Option<f64> {
    if let Some(stated) = holder.avg_hold_time_minutes {
        if stated.is_finite() && stated >= 0.0 {
            return Some(stated);
        }
    }

    let durations = round_trip_durations(holder);
    if !durations.is_empty() {
        return Some(durations.iter().sum::<f64>() / durations.len() as f64);
    }

    match (holder.first_activity, holder.last_activity) {
        (Some(first), Some(last)) if last >= first => {
            Some((last - first).num_milliseconds() as f64 / 60_000.0)
        }
        _ => None,
    }
}

/// Per-holder jeeter scorer
#[derive(Debug, Clone, Default)]
pub struct JeeterScorer {
    config: JeeterConfig,
}

impl JeeterScorer {
    pub fn new(config: JeeterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JeeterConfig {
        &self.config
    }

    /// Jeeter score 0-100 for one holder
    pub fn score_holder(&self, holder: &HolderRecord) -> f64 {
        let mut score: f64 = 0.0;

        if let Some(hold) = effective_hold_time(holder) {
            if hold < 5.0 {
                score += 40.0;
            } else if hold < 30.0 {
                score += 25.0;
            } else if hold < 60.0 {
                score += 10.0;
            }
        }

        let bought = holder.total_bought();
        if bought > 0.0 {
            let sold_fraction = holder.total_sold() / bought;
            if sold_fraction > 0.8 {
                score += 30.0;
            } else if sold_fraction > 0.5 {
                score += 15.0;
            }
        }

        if quick_round_trips(holder, self.config.round_trip_window()) > 0 {
            score += 15.0;
        }

        if holder.sell_count() > holder.buy_count() {
            score += 15.0;
        }

        clamp_score(score)
    }

    /// Upstream jeeter score if present, otherwise one computed from activity
    pub fn effective_score(&self, holder: &HolderRecord) -> f64 {
        holder
            .jeeter_score
            .map(clamp_score)
            .unwrap_or_else(|| self.score_holder(holder))
    }

    /// Whether a holder counts as a jeeter. Works on raw and enriched records
    /// alike and always agrees with `enrich`.
    pub fn is_jeeter(&self, holder: &HolderRecord) -> bool {
        holder.is_jeeter || self.effective_score(holder) > self.config.jeeter_threshold
    }

    /// Return new holder records with jeeter and bundle flags filled in.
    ///
    /// Upstream flags are kept; a missing jeeter score is computed here.
    pub fn enrich(&self, holders: &[HolderRecord], bundles: &[BundleGroup]) -> Vec<HolderRecord> {
        let bundled: HashSet<&str> = bundles
            .iter()
            .flat_map(|b| b.wallets.iter().map(String::as_str))
            .collect();

        holders
            .iter()
            .map(|holder| {
                let mut enriched = holder.clone();
                let score = self.effective_score(holder);
                enriched.jeeter_score = Some(score);
                enriched.is_jeeter = holder.is_jeeter || score > self.config.jeeter_threshold;
                enriched.is_bundle = holder.is_bundle || bundled.contains(holder.address.as_str());
                enriched
            })
            .collect()
    }
}

/// Holder-set summary used by the risk calculator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderAnalysis {
    pub total_holders: usize,
    /// Combined percentage of the largest holders (top 10 by default)
    pub top10_concentration: f64,
    pub jeeter_count: usize,
    /// Jeeters as a percentage of holders, 0-100
    pub jeeter_percentage: f64,
    pub bundled_wallets: usize,
    pub whale_count: usize,
    /// Filled in by the risk calculator
    pub jeeter_risk_score: f64,
}

impl HolderAnalysis {
    /// Summarize an (enriched) holder set
    pub fn from_holders(holders: &[HolderRecord], scorer: &JeeterScorer) -> Self {
        let total_holders = holders.len();
        if total_holders == 0 {
            return Self::default();
        }

        let mut percentages: Vec<f64> = holders.iter().map(|h| sanitize(h.percentage)).collect();
        percentages.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let top10_concentration = percentages
            .iter()
            .take(scorer.config().top_holder_count)
            .sum::<f64>()
            .clamp(0.0, 100.0);

        let jeeter_count = holders.iter().filter(|h| scorer.is_jeeter(h)).count();

        Self {
            total_holders,
            top10_concentration,
            jeeter_count,
            jeeter_percentage: jeeter_count as f64 / total_holders as f64 * 100.0,
            bundled_wallets: holders.iter().filter(|h| h.is_bundle).count(),
            whale_count: holders.iter().filter(|h| h.percentage > 5.0).count(),
            jeeter_risk_score: 0.0,
        }
    }
}

/// Holder-set behavior metrics feeding the jeeter risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JeeterMetrics {
    /// Average hold time over holders with a known hold time
    pub avg_hold_time_minutes: Option<f64>,
    /// Holders that sold most of what they bought, 0-100
    pub round_tripper_pct: f64,
    /// Holders with automated-looking activity, 0-100
    pub bot_like_pct: f64,
    /// Share of the top holders' bought amount already sold, 0-100
    pub top10_sell_velocity: f64,
    /// Active holders with at least as many sells as buys, 0-100
    pub churn_rate: f64,
    /// Flow buy share, 0-1
    pub buy_sell_ratio: f64,
}

impl Default for JeeterMetrics {
    fn default() -> Self {
        Self {
            avg_hold_time_minutes: None,
            round_tripper_pct: 0.0,
            bot_like_pct: 0.0,
            top10_sell_velocity: 0.0,
            churn_rate: 0.0,
            buy_sell_ratio: 0.5,
        }
    }
}

impl JeeterMetrics {
    pub fn from_holders(
        holders: &[HolderRecord],
        flow: &FlowWindowStats,
        config: &JeeterConfig,
    ) -> Self {
        let buy_sell_ratio = if flow.buy_sell_ratio.is_finite() {
            flow.buy_sell_ratio.clamp(0.0, 1.0)
        } else {
            0.5
        };
        if holders.is_empty() {
            return Self {
                buy_sell_ratio,
                ..Default::default()
            };
        }
        let total = holders.len() as f64;

        let hold_times: Vec<f64> = holders.iter().filter_map(effective_hold_time).collect();
        let avg_hold_time_minutes = if hold_times.is_empty() {
            None
        } else {
            Some(hold_times.iter().sum::<f64>() / hold_times.len() as f64)
        };

        let round_trippers = holders
            .iter()
            .filter(|h| {
                let bought = h.total_bought();
                bought > 0.0 && h.total_sold() >= bought * config.round_tripper_sold_fraction
            })
            .count();

        let window = config.round_trip_window();
        let bot_like = holders
            .iter()
            .filter(|h| {
                h.tx_count() > config.bot_min_tx_count
                    || quick_round_trips(h, window) > config.bot_min_round_trips
            })
            .count();

        let mut by_balance: Vec<&HolderRecord> = holders.iter().collect();
        by_balance.sort_by(|a, b| {
            b.balance
                .partial_cmp(&a.balance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let (top_bought, top_sold) = by_balance
            .iter()
            .take(config.top_holder_count)
            .fold((0.0, 0.0), |(bought, sold), h| {
                (bought + h.total_bought(), sold + h.total_sold())
            });
        let top10_sell_velocity = if top_bought > 0.0 {
            clamp_score(top_sold / top_bought * 100.0)
        } else {
            0.0
        };

        let active: Vec<&HolderRecord> = holders
            .iter()
            .filter(|h| h.buy_count() + h.sell_count() > 0)
            .collect();
        let churn_rate = if active.is_empty() {
            0.0
        } else {
            let churned = active
                .iter()
                .filter(|h| h.sell_count() > 0 && h.sell_count() >= h.buy_count())
                .count();
            churned as f64 / active.len() as f64 * 100.0
        };

        Self {
            avg_hold_time_minutes,
            round_tripper_pct: round_trippers as f64 / total * 100.0,
            bot_like_pct: bot_like as f64 / total * 100.0,
            top10_sell_velocity,
            churn_rate,
            buy_sell_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(minutes: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn flipper(address: &str) -> HolderRecord {
        HolderRecord {
            address: address.to_string(),
            balance: 10.0,
            percentage: 0.2,
            buy_events: vec![TradeEvent::new(at(0), 100.0), TradeEvent::new(at(10), 100.0)],
            sell_events: vec![TradeEvent::new(at(1), 100.0), TradeEvent::new(at(11), 95.0)],
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip_pairing() {
        let holder = flipper("W1");
        let durations = round_trip_durations(&holder);
        assert_eq!(durations.len(), 2);
        assert!((durations[0] - 1.0).abs() < 1e-9);
        assert_eq!(quick_round_trips(&holder, Duration::minutes(2)), 2);
        assert_eq!(quick_round_trips(&holder, Duration::seconds(30)), 0);
    }

    #[test]
    fn test_sell_before_buy_is_not_paired() {
        let holder = HolderRecord {
            buy_events: vec![TradeEvent::new(at(5), 10.0)],
            sell_events: vec![TradeEvent::new(at(0), 10.0)],
            ..Default::default()
        };
        assert!(round_trip_durations(&holder).is_empty());
    }

    #[test]
    fn test_effective_hold_time_precedence() {
        let mut holder = flipper("W1");
        holder.avg_hold_time_minutes = Some(42.0);
        assert_eq!(effective_hold_time(&holder), Some(42.0));

        holder.avg_hold_time_minutes = None;
        assert!((effective_hold_time(&holder).unwrap() - 1.0).abs() < 1e-9);

        let spanned = HolderRecord {
            first_activity: Some(at(0)),
            last_activity: Some(at(90)),
            ..Default::default()
        };
        assert!((effective_hold_time(&spanned).unwrap() - 90.0).abs() < 1e-9);

        assert_eq!(effective_hold_time(&HolderRecord::default()), None);
    }

    #[test]
    fn test_score_holder_flipper_is_jeeter() {
        let scorer = JeeterScorer::default();
        let score = scorer.score_holder(&flipper("W1"));
        // hold <5 (40) + sold >80% (30) + quick round trip (15)
        assert!((score - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_holder_unknown_is_zero() {
        let scorer = JeeterScorer::default();
        assert_eq!(scorer.score_holder(&HolderRecord::new("W1", 10.0, 1.0)), 0.0);
    }

    #[test]
    fn test_enrich_does_not_mutate_input() {
        let scorer = JeeterScorer::default();
        let holders = vec![flipper("W1"), HolderRecord::new("W2", 10.0, 1.0)];
        let bundles = vec![BundleGroup {
            wallets: vec!["W2".to_string()],
            ..Default::default()
        }];
        let enriched = scorer.enrich(&holders, &bundles);

        assert!(enriched[0].is_jeeter);
        assert!(!enriched[1].is_jeeter);
        assert!(enriched[1].is_bundle);
        assert!(holders[0].jeeter_score.is_none());
        assert!(!holders[1].is_bundle);
    }

    #[test]
    fn test_enrich_keeps_upstream_flag() {
        let scorer = JeeterScorer::default();
        let mut holder = HolderRecord::new("W1", 10.0, 1.0);
        holder.is_jeeter = true;
        let enriched = scorer.enrich(&[holder], &[]);
        assert!(enriched[0].is_jeeter);
    }

    #[test]
    fn test_is_jeeter_scores_raw_records() {
        let scorer = JeeterScorer::default();
        let raw = flipper("W1");
        assert!(raw.jeeter_score.is_none() && !raw.is_jeeter);
        assert!(scorer.is_jeeter(&raw));

        let enriched = scorer.enrich(&[raw.clone()], &[]);
        assert_eq!(scorer.is_jeeter(&raw), enriched[0].is_jeeter);

        // an upstream score wins over the activity-derived one
        let cleared = HolderRecord {
            jeeter_score: Some(10.0),
            ..raw
        };
        assert!(!scorer.is_jeeter(&cleared));
    }

    #[test]
    fn test_holder_analysis() {
        let scorer = JeeterScorer::default();
        let mut holders: Vec<HolderRecord> = (0..12)
            .map(|i| HolderRecord::new(format!("W{}", i), 100.0, 2.0))
            .collect();
        holders[0].percentage = 20.0;
        holders[1].is_jeeter = true;
        holders[2].jeeter_score = Some(75.0);

        let analysis = HolderAnalysis::from_holders(&holders, &scorer);
        assert_eq!(analysis.total_holders, 12);
        // 20 + 9 * 2
        assert!((analysis.top10_concentration - 38.0).abs() < 1e-9);
        assert_eq!(analysis.jeeter_count, 2);
        assert_eq!(analysis.whale_count, 1);
    }

    #[test]
    fn test_holder_analysis_empty() {
        let analysis = HolderAnalysis::from_holders(&[], &JeeterScorer::default());
        assert_eq!(analysis, HolderAnalysis::default());
    }

    #[test]
    fn test_jeeter_metrics() {
        let config = JeeterConfig::default();
        let holders = vec![
            flipper("W1"),
            HolderRecord {
                address: "W2".to_string(),
                balance: 500.0,
                percentage: 5.0,
                buy_events: vec![TradeEvent::new(at(0), 500.0)],
                avg_hold_time_minutes: Some(300.0),
                ..Default::default()
            },
        ];
        let flow = FlowWindowStats {
            buy_sell_ratio: 0.3,
            ..Default::default()
        };
        let metrics = JeeterMetrics::from_holders(&holders, &flow, &config);

        assert!((metrics.avg_hold_time_minutes.unwrap() - 150.5).abs() < 1e-9);
        assert_eq!(metrics.round_tripper_pct, 50.0);
        assert_eq!(metrics.bot_like_pct, 0.0);
        assert_eq!(metrics.churn_rate, 50.0);
        // top holders bought 700, sold 195
        assert!((metrics.top10_sell_velocity - 195.0 / 700.0 * 100.0).abs() < 1e-9);
        assert_eq!(metrics.buy_sell_ratio, 0.3);
    }

    #[test]
    fn test_jeeter_metrics_empty() {
        let metrics =
            JeeterMetrics::from_holders(&[], &FlowWindowStats::default(), &JeeterConfig::default());
        assert_eq!(metrics, JeeterMetrics::default());
    }
}
