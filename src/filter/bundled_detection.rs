//! Bundled Wallet Detection
//!
//! Detects coordinated wallet clusters (bundles) among the top holders.
//! Bundled wallets are typically one actor spreading a position over several
//! addresses, and they tend to dump together.
//!
//! Detection heuristic: near-identical balances (within 5% of each other)
//! across 3+ non-dust holders. A group is suspicious when its members hold
//! for nearly the same time, when it controls a large combined share, or
//! when several members are jeeters, by upstream flag or by their own
//! buy/sell activity.
//!
//! The scan is O(n^2) over the holder list, which is bounded to the top
//! ~150-200 holders.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::filter::jeeter::{effective_hold_time, JeeterScorer};
use crate::filter::types::HolderRecord;
use crate::strategy::series::{sanitize, std_dev};

/// Configuration for bundled wallet detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDetectionConfig {
    /// Enabled flag
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Relative balance difference below which two holders match (0.05 = 5%)
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: f64,

    /// Holders at or below this supply percentage are ignored as dust
    #[serde(default = "default_min_percentage")]
    pub min_percentage: f64,

    /// Minimum group size (including the anchor holder) to report
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    /// Hold-time spread (std dev, minutes) below which members look synchronized
    #[serde(default = "default_max_hold_time_spread")]
    pub max_hold_time_spread_minutes: f64,

    /// Combined supply percentage above which a group is suspicious
    #[serde(default = "default_max_combined_percentage")]
    pub max_combined_percentage: f64,

    /// Jeeter members at or above which a group is suspicious
    #[serde(default = "default_min_jeeter_members")]
    pub min_jeeter_members: usize,
}

fn default_enabled() -> bool {
    true
}
fn default_balance_tolerance() -> f64 {
    0.05
}
fn default_min_percentage() -> f64 {
    0.1
}
fn default_min_group_size() -> usize {
    3
}
fn default_max_hold_time_spread() -> f64 {
    10.0
}
fn default_max_combined_percentage() -> f64 {
    5.0
}
fn default_min_jeeter_members() -> usize {
    2
}

impl Default for BundleDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            balance_tolerance: default_balance_tolerance(),
            min_percentage: default_min_percentage(),
            min_group_size: default_min_group_size(),
            max_hold_time_spread_minutes: default_max_hold_time_spread(),
            max_combined_percentage: default_max_combined_percentage(),
            min_jeeter_members: default_min_jeeter_members(),
        }
    }
}

/// Why a bundle group looks coordinated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleSuspicion {
    /// Members hold for nearly the same time
    SynchronizedHoldTimes { spread_minutes: f64 },
    /// Members together control a large share of supply
    LargeCombinedStake { total_percentage: f64 },
    /// Several members are jeeters
    MultipleJeeters { count: usize },
}

impl BundleSuspicion {
    pub fn description(&self) -> String {
        match self {
            BundleSuspicion::SynchronizedHoldTimes { spread_minutes } => {
                format!("Hold times within {:.1} min of each other", spread_minutes)
            }
            BundleSuspicion::LargeCombinedStake { total_percentage } => {
                format!("Bundle controls {:.2}% of supply", total_percentage)
            }
            BundleSuspicion::MultipleJeeters { count } => {
                format!("{} bundled wallets are jeeters", count)
            }
        }
    }
}

/// A detected bundle group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleGroup {
    pub wallets: Vec<String>,
    pub total_percentage: f64,
    pub average_balance: f64,
    /// Std dev of known member hold times, `None` with fewer than two known
    pub hold_time_spread_minutes: Option<f64>,
    pub jeeter_count: usize,
    pub is_suspicious: bool,
    pub suspicions: Vec<BundleSuspicion>,
}

impl BundleGroup {
    pub fn size(&self) -> usize {
        self.wallets.len()
    }
}

/// Bundled wallet detector
#[derive(Debug, Clone, Default)]
pub struct BundleDetector {
    config: BundleDetectionConfig,
    jeeters: JeeterScorer,
}

impl BundleDetector {
    /// Create a new bundle detector
    pub fn new(config: BundleDetectionConfig, jeeters: JeeterScorer) -> Self {
        Self { config, jeeters }
    }

    /// Group holders with near-identical balances.
    ///
    /// Single pass in holder order: each unprocessed holder anchors a group of
    /// the unprocessed holders matching its balance. Only groups that reach the
    /// minimum size are reported and consume their members.
    pub fn detect(&self, holders: &[HolderRecord]) -> Vec<BundleGroup> {
        if !self.config.enabled || holders.len() < self.config.min_group_size {
            return Vec::new();
        }

        let mut processed = vec![false; holders.len()];
        let mut groups = Vec::new();

        for (i, anchor) in holders.iter().enumerate() {
            if processed[i] {
                continue;
            }
            let anchor_balance = sanitize(anchor.balance);
            if anchor_balance <= 0.0 {
                continue;
            }

            let mut members = vec![i];
            for (j, other) in holders.iter().enumerate().skip(i + 1) {
                if processed[j] || other.percentage <= self.config.min_percentage {
                    continue;
                }
                let diff = sanitize((other.balance - anchor_balance).abs() / anchor_balance);
                if diff < self.config.balance_tolerance {
                    members.push(j);
                }
            }

            if members.len() < self.config.min_group_size {
                continue;
            }
            for &m in &members {
                processed[m] = true;
            }

            let group = self.build_group(holders, &members);
            debug!(
                anchor = %anchor.address,
                size = group.size(),
                total_pct = %format!("{:.2}", group.total_percentage),
                "Balance cluster found"
            );
            groups.push(group);
        }

        let suspicious = groups.iter().filter(|g| g.is_suspicious).count();
        if !groups.is_empty() {
            info!(
                groups = groups.len(),
                suspicious = suspicious,
                "Bundled wallets detected"
            );
        }

        groups
    }

    fn build_group(&self, holders: &[HolderRecord], members: &[usize]) -> BundleGroup {
        let members: Vec<&HolderRecord> = members.iter().map(|&m| &holders[m]).collect();

        let total_percentage: f64 = members.iter().map(|h| sanitize(h.percentage)).sum();
        let average_balance =
            members.iter().map(|h| sanitize(h.balance)).sum::<f64>() / members.len() as f64;

        let hold_times: Vec<f64> = members.iter().filter_map(|h| effective_hold_time(h)).collect();
        let hold_time_spread_minutes = if hold_times.len() >= 2 {
            Some(std_dev(&hold_times))
        } else {
            None
        };

        let jeeter_count = members.iter().filter(|h| self.jeeters.is_jeeter(h)).count();

        let mut suspicions = Vec::new();
        if let Some(spread) = hold_time_spread_minutes {
            if spread < self.config.max_hold_time_spread_minutes {
                suspicions.push(BundleSuspicion::SynchronizedHoldTimes {
                    spread_minutes: spread,
                });
            }
        }
        if total_percentage > self.config.max_combined_percentage {
            suspicions.push(BundleSuspicion::LargeCombinedStake { total_percentage });
        }
        if jeeter_count >= self.config.min_jeeter_members {
            suspicions.push(BundleSuspicion::MultipleJeeters {
                count: jeeter_count,
            });
        }

        BundleGroup {
            wallets: members.iter().map(|h| h.address.clone()).collect(),
            total_percentage,
            average_balance,
            hold_time_spread_minutes,
            jeeter_count,
            is_suspicious: !suspicions.is_empty(),
            suspicions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(address: &str, balance: f64, percentage: f64) -> HolderRecord {
        HolderRecord::new(address, balance, percentage)
    }

    #[test]
    fn test_jeeter_triggered_bundle() {
        let detector = BundleDetector::default();
        let mut holders = vec![
            holder("A", 1000.0, 0.5),
            holder("B", 1010.0, 0.5),
            holder("C", 1020.0, 0.5),
            holder("D", 1030.0, 0.5),
            holder("E", 990.0, 0.5),
        ];
        holders[1].is_jeeter = true;
        holders[3].is_jeeter = true;

        let groups = detector.detect(&holders);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.size(), 5);
        assert!((group.total_percentage - 2.5).abs() < 1e-9);
        assert!(group.is_suspicious);
        assert_eq!(
            group.suspicions,
            vec![BundleSuspicion::MultipleJeeters { count: 2 }]
        );
    }

    #[test]
    fn test_two_similar_holders_not_reported() {
        let detector = BundleDetector::default();
        let holders = vec![
            holder("A", 1000.0, 0.5),
            holder("B", 1001.0, 0.5),
            holder("C", 5000.0, 2.0),
        ];
        assert!(detector.detect(&holders).is_empty());
    }

    #[test]
    fn test_dust_holders_ignored() {
        let detector = BundleDetector::default();
        let holders = vec![
            holder("A", 1000.0, 0.5),
            holder("B", 1000.0, 0.05),
            holder("C", 1000.0, 0.1),
        ];
        assert!(detector.detect(&holders).is_empty());
    }

    #[test]
    fn test_large_combined_stake() {
        let detector = BundleDetector::default();
        let holders = vec![
            holder("A", 1000.0, 2.0),
            holder("B", 1000.0, 2.0),
            holder("C", 1000.0, 2.0),
        ];
        let groups = detector.detect(&holders);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_suspicious);
        assert!(matches!(
            groups[0].suspicions[0],
            BundleSuspicion::LargeCombinedStake { .. }
        ));
    }

    #[test]
    fn test_synchronized_hold_times() {
        let detector = BundleDetector::default();
        let mut holders = vec![
            holder("A", 1000.0, 0.5),
            holder("B", 1000.0, 0.5),
            holder("C", 1000.0, 0.5),
        ];
        holders[0].avg_hold_time_minutes = Some(30.0);
        holders[1].avg_hold_time_minutes = Some(32.0);
        holders[2].avg_hold_time_minutes = Some(31.0);

        let groups = detector.detect(&holders);
        assert_eq!(groups.len(), 1);
        assert!(matches!(
            groups[0].suspicions[0],
            BundleSuspicion::SynchronizedHoldTimes { .. }
        ));
    }

    #[test]
    fn test_clean_group_not_suspicious() {
        let detector = BundleDetector::default();
        let mut holders = vec![
            holder("A", 1000.0, 0.5),
            holder("B", 1000.0, 0.5),
            holder("C", 1000.0, 0.5),
        ];
        holders[0].avg_hold_time_minutes = Some(10.0);
        holders[1].avg_hold_time_minutes = Some(200.0);

        let groups = detector.detect(&holders);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].is_suspicious);
        assert!(groups[0].hold_time_spread_minutes.unwrap() > 10.0);
    }

    #[test]
    fn test_members_not_reused_across_groups() {
        let detector = BundleDetector::default();
        let holders = vec![
            holder("A", 1000.0, 0.5),
            holder("B", 1000.0, 0.5),
            holder("C", 1000.0, 0.5),
            holder("D", 1000.0, 0.5),
            holder("X", 9000.0, 0.5),
            holder("Y", 9000.0, 0.5),
            holder("Z", 9000.0, 0.5),
        ];
        let groups = detector.detect(&holders);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].wallets, vec!["A", "B", "C", "D"]);
        assert_eq!(groups[1].wallets, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_activity_jeeters_counted_without_flags() {
        use crate::filter::types::TradeEvent;
        use chrono::{Duration, TimeZone, Utc};

        let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let holders: Vec<HolderRecord> = [(1000.0, 1.0), (1001.0, 20.0), (1002.0, 40.0)]
            .iter()
            .enumerate()
            .map(|(i, (balance, hold))| HolderRecord {
                avg_hold_time_minutes: Some(*hold),
                buy_events: vec![TradeEvent::new(start, 500.0)],
                sell_events: vec![TradeEvent::new(start + Duration::seconds(60), 500.0)],
                ..holder(&format!("J{}", i), *balance, 0.5)
            })
            .collect();
        assert!(holders.iter().all(|h| !h.is_jeeter && h.jeeter_score.is_none()));

        let groups = BundleDetector::default().detect(&holders);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        // spread ~15.9 min and 1.5% combined: only the jeeter trigger can fire
        assert!(group.hold_time_spread_minutes.unwrap() > 10.0);
        assert_eq!(group.jeeter_count, 3);
        assert!(group.is_suspicious);
        assert_eq!(
            group.suspicions,
            vec![BundleSuspicion::MultipleJeeters { count: 3 }]
        );
    }

    #[test]
    fn test_zero_balance_anchor_skipped() {
        let detector = BundleDetector::default();
        let holders = vec![
            holder("A", 0.0, 0.5),
            holder("B", 0.0, 0.5),
            holder("C", 0.0, 0.5),
        ];
        assert!(detector.detect(&holders).is_empty());
    }
}
