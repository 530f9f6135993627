//! Wallet behavior classification
//!
//! Labels each holder with one behavioral category. Rules are evaluated in a
//! fixed precedence order and the first match wins:
//!
//! 1. Sniper - very short holds with many transactions, or repeated
//!    buy->sell round trips within two minutes
//! 2. Jeeter - flagged upstream or jeeter score above 50
//! 3. MEV bot - very high transaction count, or many buys with sub-minute holds
//! 4. Whale - more than 5% of supply
//! 5. Strong hands - long holds with few or no sells
//! 6. Weak hands - short holds with most buys sold
//! 7. Unknown - not enough data to tell
//!
//! Hold-time rules only fire when a hold time is known.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::filter::jeeter::{effective_hold_time, quick_round_trips};
use crate::filter::types::HolderRecord;
use crate::strategy::series::clamp_score;

/// Behavioral wallet category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletCategory {
    Sniper,
    Jeeter,
    WeakHands,
    StrongHands,
    Whale,
    MevBot,
    /// Reserved for upstream labels; no per-holder rule assigns it
    RouterArbitrageBot,
    Unknown,
}

impl WalletCategory {
    /// Rule evaluation order, first match wins
    pub const PRECEDENCE: [WalletCategory; 6] = [
        WalletCategory::Sniper,
        WalletCategory::Jeeter,
        WalletCategory::MevBot,
        WalletCategory::Whale,
        WalletCategory::StrongHands,
        WalletCategory::WeakHands,
    ];

    /// Categories that count as high-quality holders
    pub fn is_high_quality(&self) -> bool {
        matches!(self, WalletCategory::StrongHands | WalletCategory::Whale)
    }

    /// Automated categories
    pub fn is_bot(&self) -> bool {
        matches!(
            self,
            WalletCategory::MevBot | WalletCategory::RouterArbitrageBot
        )
    }
}

impl fmt::Display for WalletCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WalletCategory::Sniper => "sniper",
            WalletCategory::Jeeter => "jeeter",
            WalletCategory::WeakHands => "weak-hands",
            WalletCategory::StrongHands => "strong-hands",
            WalletCategory::Whale => "whale",
            WalletCategory::MevBot => "mev-bot",
            WalletCategory::RouterArbitrageBot => "router-arbitrage-bot",
            WalletCategory::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Classification of one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletClassification {
    pub category: WalletCategory,
    /// 0-100, higher = better holder
    pub quality_score: f64,
    /// 0-100
    pub confidence: f64,
    /// Informational only
    pub reasons: Vec<String>,
}

impl WalletClassification {
    fn new(category: WalletCategory, quality_score: f64, confidence: f64) -> Self {
        Self {
            category,
            quality_score: clamp_score(quality_score),
            confidence: clamp_score(confidence),
            reasons: Vec::new(),
        }
    }

    fn because(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    /// Default classification when no rule matches
    pub fn unknown() -> Self {
        Self::new(WalletCategory::Unknown, 50.0, 30.0)
            .because("Insufficient data to classify wallet")
    }
}

/// Wallet classifier thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletClassifierConfig {
    pub sniper_max_hold_minutes: f64,
    pub sniper_min_tx_count: u32,
    pub sniper_round_trip_window_secs: i64,
    pub sniper_min_round_trips: usize,

    pub jeeter_score_threshold: f64,

    pub mev_min_tx_count: u32,
    pub mev_min_buy_count: usize,
    pub mev_max_hold_minutes: f64,

    pub whale_min_percentage: f64,
    pub whale_base_quality: f64,
    pub whale_long_hold_minutes: f64,
    pub whale_long_hold_quality: f64,
    pub whale_fast_exit_minutes: f64,
    pub whale_fast_exit_quality: f64,

    pub strong_min_hold_minutes: f64,
    pub strong_max_sell_buy_ratio: f64,
    pub strong_no_sell_min_hold_minutes: f64,

    pub weak_max_hold_minutes: f64,
    pub weak_min_sell_buy_ratio: f64,

    /// Jeeter fraction above which jeeters dominate the holder set
    pub jeeter_dominance_fraction: f64,
    /// Sniper fraction above which snipers dominate the holder set
    pub sniper_dominance_fraction: f64,
}

impl Default for WalletClassifierConfig {
    fn default() -> Self {
        Self {
            sniper_max_hold_minutes: 5.0,
            sniper_min_tx_count: 10,
            sniper_round_trip_window_secs: 120,
            sniper_min_round_trips: 3,
            jeeter_score_threshold: 50.0,
            mev_min_tx_count: 50,
            mev_min_buy_count: 20,
            mev_max_hold_minutes: 1.0,
            whale_min_percentage: 5.0,
            whale_base_quality: 70.0,
            whale_long_hold_minutes: 60.0,
            whale_long_hold_quality: 85.0,
            whale_fast_exit_minutes: 10.0,
            whale_fast_exit_quality: 40.0,
            strong_min_hold_minutes: 120.0,
            strong_max_sell_buy_ratio: 0.3,
            strong_no_sell_min_hold_minutes: 60.0,
            weak_max_hold_minutes: 30.0,
            weak_min_sell_buy_ratio: 0.7,
            jeeter_dominance_fraction: 0.4,
            sniper_dominance_fraction: 0.3,
        }
    }
}

/// Facts about a holder that the rules look at
#[derive(Debug, Clone)]
struct WalletFacts {
    hold_time: Option<f64>,
    tx_count: u32,
    buy_count: usize,
    sell_count: usize,
    sell_buy_ratio: f64,
    quick_round_trips: usize,
    percentage: f64,
    is_jeeter: bool,
    jeeter_score: Option<f64>,
}

/// Wallet classifier
#[derive(Debug, Clone, Default)]
pub struct WalletClassifier {
    config: WalletClassifierConfig,
}

impl WalletClassifier {
    pub fn new(config: WalletClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WalletClassifierConfig {
        &self.config
    }

    /// Classify one holder
    pub fn classify(&self, holder: &HolderRecord) -> WalletClassification {
        let facts = self.facts(holder);
        let classification = WalletCategory::PRECEDENCE
            .iter()
            .find_map(|category| self.evaluate_facts(*category, &facts))
            .unwrap_or_else(WalletClassification::unknown);

        debug!(
            wallet = %holder.address,
            category = %classification.category,
            quality = classification.quality_score,
            "Wallet classified"
        );
        classification
    }

    /// Evaluate a single rule in isolation
    pub fn evaluate_rule(
        &self,
        category: WalletCategory,
        holder: &HolderRecord,
    ) -> Option<WalletClassification> {
        self.evaluate_facts(category, &self.facts(holder))
    }

    fn facts(&self, holder: &HolderRecord) -> WalletFacts {
        let window = chrono::Duration::seconds(self.config.sniper_round_trip_window_secs);
        WalletFacts {
            hold_time: effective_hold_time(holder),
            tx_count: holder.tx_count(),
            buy_count: holder.buy_count(),
            sell_count: holder.sell_count(),
            sell_buy_ratio: holder.sell_buy_ratio(),
            quick_round_trips: quick_round_trips(holder, window),
            percentage: holder.percentage,
            is_jeeter: holder.is_jeeter,
            jeeter_score: holder.jeeter_score,
        }
    }

    fn evaluate_facts(
        &self,
        category: WalletCategory,
        facts: &WalletFacts,
    ) -> Option<WalletClassification> {
        let c = &self.config;
        let hold = facts.hold_time;

        match category {
            WalletCategory::Sniper => {
                if let Some(h) = hold {
                    if h < c.sniper_max_hold_minutes && facts.tx_count > c.sniper_min_tx_count {
                        return Some(
                            WalletClassification::new(category, 10.0, 85.0).because(format!(
                                "Avg hold {:.1} min with {} transactions",
                                h, facts.tx_count
                            )),
                        );
                    }
                }
                if facts.quick_round_trips > c.sniper_min_round_trips {
                    return Some(
                        WalletClassification::new(category, 10.0, 80.0).because(format!(
                            "{} buy->sell round trips within {}s",
                            facts.quick_round_trips, c.sniper_round_trip_window_secs
                        )),
                    );
                }
                None
            }
            WalletCategory::Jeeter => {
                let score = facts.jeeter_score.unwrap_or(0.0);
                if facts.is_jeeter || score > c.jeeter_score_threshold {
                    let reason = if facts.is_jeeter {
                        "Flagged as jeeter".to_string()
                    } else {
                        format!("Jeeter score {:.0}", score)
                    };
                    Some(WalletClassification::new(category, 20.0, 75.0).because(reason))
                } else {
                    None
                }
            }
            WalletCategory::MevBot => {
                if facts.tx_count > c.mev_min_tx_count {
                    return Some(
                        WalletClassification::new(category, 5.0, 80.0)
                            .because(format!("{} transactions", facts.tx_count)),
                    );
                }
                match hold {
                    Some(h) if facts.buy_count > c.mev_min_buy_count && h < c.mev_max_hold_minutes => {
                        Some(WalletClassification::new(category, 5.0, 80.0).because(format!(
                            "{} buys with {:.2} min avg hold",
                            facts.buy_count, h
                        )))
                    }
                    _ => None,
                }
            }
            WalletCategory::Whale => {
                // NaN never counts as a whale
                if !(facts.percentage > c.whale_min_percentage) {
                    return None;
                }
                let mut classification =
                    WalletClassification::new(category, c.whale_base_quality, 90.0)
                        .because(format!("Holds {:.2}% of supply", facts.percentage));
                match hold {
                    Some(h) if h > c.whale_long_hold_minutes => {
                        classification.quality_score = clamp_score(c.whale_long_hold_quality);
                        classification = classification
                            .because(format!("Long hold ({:.0} min) is bullish", h));
                    }
                    Some(h) if h < c.whale_fast_exit_minutes => {
                        classification.quality_score = clamp_score(c.whale_fast_exit_quality);
                        classification = classification
                            .because(format!("Fast exit risk ({:.1} min hold)", h));
                    }
                    _ => {}
                }
                Some(classification)
            }
            WalletCategory::StrongHands => {
                let h = hold?;
                let long_low_sells =
                    h > c.strong_min_hold_minutes && facts.sell_buy_ratio < c.strong_max_sell_buy_ratio;
                let never_sold = h > c.strong_no_sell_min_hold_minutes && facts.sell_count == 0;
                if long_low_sells || never_sold {
                    Some(WalletClassification::new(category, 90.0, 75.0).because(format!(
                        "Avg hold {:.0} min, sell/buy {:.2}",
                        h, facts.sell_buy_ratio
                    )))
                } else {
                    None
                }
            }
            WalletCategory::WeakHands => {
                let h = hold?;
                if h < c.weak_max_hold_minutes && facts.sell_buy_ratio > c.weak_min_sell_buy_ratio {
                    Some(WalletClassification::new(category, 35.0, 65.0).because(format!(
                        "Avg hold {:.0} min, sell/buy {:.2}",
                        h, facts.sell_buy_ratio
                    )))
                } else {
                    None
                }
            }
            WalletCategory::RouterArbitrageBot | WalletCategory::Unknown => None,
        }
    }

    /// Classify a holder set and aggregate the result
    pub fn analyze_quality(&self, holders: &[HolderRecord]) -> WalletQualityAnalysis {
        let classifications: Vec<WalletClassification> =
            holders.iter().map(|h| self.classify(h)).collect();
        WalletQualityAnalysis::aggregate(holders, &classifications, &self.config)
    }
}

/// Wallet counts per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub sniper: usize,
    pub jeeter: usize,
    pub weak_hands: usize,
    pub strong_hands: usize,
    pub whale: usize,
    pub mev_bot: usize,
    pub router_arbitrage_bot: usize,
    pub unknown: usize,
}

impl CategoryCounts {
    fn record(&mut self, category: WalletCategory) {
        let slot = match category {
            WalletCategory::Sniper => &mut self.sniper,
            WalletCategory::Jeeter => &mut self.jeeter,
            WalletCategory::WeakHands => &mut self.weak_hands,
            WalletCategory::StrongHands => &mut self.strong_hands,
            WalletCategory::Whale => &mut self.whale,
            WalletCategory::MevBot => &mut self.mev_bot,
            WalletCategory::RouterArbitrageBot => &mut self.router_arbitrage_bot,
            WalletCategory::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.sniper
            + self.jeeter
            + self.weak_hands
            + self.strong_hands
            + self.whale
            + self.mev_bot
            + self.router_arbitrage_bot
            + self.unknown
    }
}

/// Aggregate wallet quality over a holder set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletQualityAnalysis {
    pub total_wallets: usize,
    pub counts: CategoryCounts,
    /// Average over wallets with a known hold time
    pub average_hold_time_minutes: f64,
    pub wallets_with_hold_time: usize,
    pub average_sell_buy_ratio: f64,
    /// Strong hands + whales
    pub high_quality_wallets: usize,
    pub jeeter_fraction: f64,
    pub sniper_fraction: f64,
    pub mev_bot_fraction: f64,
    pub jeeter_dominance: bool,
    pub sniper_dominance: bool,
    /// 0-100; 0 for an empty holder set
    pub overall_quality_score: f64,
}

impl WalletQualityAnalysis {
    fn aggregate(
        holders: &[HolderRecord],
        classifications: &[WalletClassification],
        config: &WalletClassifierConfig,
    ) -> Self {
        let total_wallets = classifications.len();
        if total_wallets == 0 {
            return Self::default();
        }

        let mut counts = CategoryCounts::default();
        for classification in classifications {
            counts.record(classification.category);
        }

        let hold_times: Vec<f64> = holders.iter().filter_map(effective_hold_time).collect();
        let average_hold_time_minutes = if hold_times.is_empty() {
            0.0
        } else {
            hold_times.iter().sum::<f64>() / hold_times.len() as f64
        };
        let average_sell_buy_ratio =
            holders.iter().map(|h| h.sell_buy_ratio()).sum::<f64>() / holders.len().max(1) as f64;

        let total = total_wallets as f64;
        let high_quality_wallets = counts.strong_hands + counts.whale;
        let jeeter_fraction = counts.jeeter as f64 / total;
        let sniper_fraction = counts.sniper as f64 / total;
        let mev_bot_fraction = counts.mev_bot as f64 / total;

        let overall_quality_score = clamp_score(
            100.0 * high_quality_wallets as f64 / total
                - 50.0 * jeeter_fraction
                - 30.0 * sniper_fraction,
        );

        Self {
            total_wallets,
            counts,
            average_hold_time_minutes,
            wallets_with_hold_time: hold_times.len(),
            average_sell_buy_ratio,
            high_quality_wallets,
            jeeter_fraction,
            sniper_fraction,
            mev_bot_fraction,
            jeeter_dominance: jeeter_fraction > config.jeeter_dominance_fraction,
            sniper_dominance: sniper_fraction > config.sniper_dominance_fraction,
            overall_quality_score,
        }
    }

    /// Whether any hold-time information was available
    pub fn has_hold_times(&self) -> bool {
        self.wallets_with_hold_time > 0
    }
}
