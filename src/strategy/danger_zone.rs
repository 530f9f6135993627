//! Danger Zone Detector
//!
//! Adds up red flags from flow, wallet quality and liquidity. Flags are
//! independent; overlapping ones (short hold and quick dumps, low and
//! critical liquidity) both count. A score at or above the threshold puts
//! the token in the danger zone, which overrides every positive signal.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::filter::types::{FlowWindowStats, TokenSnapshot};
use crate::filter::wallet_classifier::WalletQualityAnalysis;
use crate::strategy::series::sanitize;

/// Individual red flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlag {
    SellDominant,
    ShortHoldTime,
    SniperHeavy,
    QuickDumps,
    LowLiquidity,
    CriticalLiquidity,
    MevActive,
    MevBotHeavy,
    NoQualityWallets,
    RouterArbitrage,
    JeeterDominance,
    SniperDominance,
}

impl RedFlag {
    pub const ALL: [RedFlag; 12] = [
        RedFlag::SellDominant,
        RedFlag::ShortHoldTime,
        RedFlag::SniperHeavy,
        RedFlag::QuickDumps,
        RedFlag::LowLiquidity,
        RedFlag::CriticalLiquidity,
        RedFlag::MevActive,
        RedFlag::MevBotHeavy,
        RedFlag::NoQualityWallets,
        RedFlag::RouterArbitrage,
        RedFlag::JeeterDominance,
        RedFlag::SniperDominance,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            RedFlag::SellDominant => "Sellers dominate volume",
            RedFlag::ShortHoldTime => "Holders exit within minutes",
            RedFlag::SniperHeavy => "Heavy sniper presence",
            RedFlag::QuickDumps => "Quick dumps after entry",
            RedFlag::LowLiquidity => "Low liquidity",
            RedFlag::CriticalLiquidity => "Critically low liquidity",
            RedFlag::MevActive => "Active MEV extraction",
            RedFlag::MevBotHeavy => "Many MEV bot holders",
            RedFlag::NoQualityWallets => "No high-quality holders",
            RedFlag::RouterArbitrage => "Router arbitrage pump",
            RedFlag::JeeterDominance => "Jeeters dominate the holder base",
            RedFlag::SniperDominance => "Snipers dominate the holder base",
        }
    }
}

impl fmt::Display for RedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// The twelve red flags as booleans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlags {
    pub sell_dominant: bool,
    pub short_hold_time: bool,
    pub sniper_heavy: bool,
    pub quick_dumps: bool,
    pub low_liquidity: bool,
    pub critical_liquidity: bool,
    pub mev_active: bool,
    pub mev_bot_heavy: bool,
    pub no_quality_wallets: bool,
    pub router_arbitrage: bool,
    pub jeeter_dominance: bool,
    pub sniper_dominance: bool,
}

impl RedFlags {
    pub fn is_set(&self, flag: RedFlag) -> bool {
        match flag {
            RedFlag::SellDominant => self.sell_dominant,
            RedFlag::ShortHoldTime => self.short_hold_time,
            RedFlag::SniperHeavy => self.sniper_heavy,
            RedFlag::QuickDumps => self.quick_dumps,
            RedFlag::LowLiquidity => self.low_liquidity,
            RedFlag::CriticalLiquidity => self.critical_liquidity,
            RedFlag::MevActive => self.mev_active,
            RedFlag::MevBotHeavy => self.mev_bot_heavy,
            RedFlag::NoQualityWallets => self.no_quality_wallets,
            RedFlag::RouterArbitrage => self.router_arbitrage,
            RedFlag::JeeterDominance => self.jeeter_dominance,
            RedFlag::SniperDominance => self.sniper_dominance,
        }
    }

    fn set(&mut self, flag: RedFlag) {
        let slot = match flag {
            RedFlag::SellDominant => &mut self.sell_dominant,
            RedFlag::ShortHoldTime => &mut self.short_hold_time,
            RedFlag::SniperHeavy => &mut self.sniper_heavy,
            RedFlag::QuickDumps => &mut self.quick_dumps,
            RedFlag::LowLiquidity => &mut self.low_liquidity,
            RedFlag::CriticalLiquidity => &mut self.critical_liquidity,
            RedFlag::MevActive => &mut self.mev_active,
            RedFlag::MevBotHeavy => &mut self.mev_bot_heavy,
            RedFlag::NoQualityWallets => &mut self.no_quality_wallets,
            RedFlag::RouterArbitrage => &mut self.router_arbitrage,
            RedFlag::JeeterDominance => &mut self.jeeter_dominance,
            RedFlag::SniperDominance => &mut self.sniper_dominance,
        };
        *slot = true;
    }

    pub fn count(&self) -> usize {
        RedFlag::ALL.iter().filter(|f| self.is_set(**f)).count()
    }
}

/// Danger zone result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedFlagSignals {
    pub flags: RedFlags,
    /// Fired flags in evaluation order
    pub triggered: Vec<RedFlag>,
    /// Sum of fired flag weights; not capped per flag
    pub risk_score: f64,
    pub is_danger_zone: bool,
}

impl RedFlagSignals {
    pub fn reasons(&self) -> Vec<String> {
        self.triggered.iter().map(|f| f.to_string()).collect()
    }
}

/// Danger zone thresholds and weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerZoneConfig {
    pub sell_dominant_ratio: f64,
    pub sell_dominant_weight: f64,
    pub short_hold_minutes: f64,
    pub short_hold_weight: f64,
    pub sniper_fraction: f64,
    pub sniper_heavy_weight: f64,
    pub quick_dump_minutes: f64,
    pub quick_dump_weight: f64,
    pub low_liquidity_usd: f64,
    pub low_liquidity_weight: f64,
    pub critical_liquidity_usd: f64,
    pub critical_liquidity_weight: f64,
    pub mev_score: f64,
    pub mev_active_weight: f64,
    pub mev_bot_fraction: f64,
    pub mev_bot_weight: f64,
    pub no_quality_weight: f64,
    pub router_min_tpm: f64,
    pub router_max_avg_size_usd: f64,
    pub router_arbitrage_weight: f64,
    pub jeeter_dominance_weight: f64,
    pub sniper_dominance_weight: f64,
    /// Scores at or above this are the danger zone
    pub danger_threshold: f64,
}

impl Default for DangerZoneConfig {
    fn default() -> Self {
        Self {
            sell_dominant_ratio: 0.6,
            sell_dominant_weight: 15.0,
            short_hold_minutes: 10.0,
            short_hold_weight: 15.0,
            sniper_fraction: 0.3,
            sniper_heavy_weight: 20.0,
            quick_dump_minutes: 5.0,
            quick_dump_weight: 20.0,
            low_liquidity_usd: 10_000.0,
            low_liquidity_weight: 15.0,
            critical_liquidity_usd: 5_000.0,
            critical_liquidity_weight: 20.0,
            mev_score: 50.0,
            mev_active_weight: 15.0,
            mev_bot_fraction: 0.2,
            mev_bot_weight: 10.0,
            no_quality_weight: 15.0,
            router_min_tpm: 5.0,
            router_max_avg_size_usd: 100.0,
            router_arbitrage_weight: 10.0,
            jeeter_dominance_weight: 25.0,
            sniper_dominance_weight: 20.0,
            danger_threshold: 50.0,
        }
    }
}

impl DangerZoneConfig {
    pub fn weight(&self, flag: RedFlag) -> f64 {
        match flag {
            RedFlag::SellDominant => self.sell_dominant_weight,
            RedFlag::ShortHoldTime => self.short_hold_weight,
            RedFlag::SniperHeavy => self.sniper_heavy_weight,
            RedFlag::QuickDumps => self.quick_dump_weight,
            RedFlag::LowLiquidity => self.low_liquidity_weight,
            RedFlag::CriticalLiquidity => self.critical_liquidity_weight,
            RedFlag::MevActive => self.mev_active_weight,
            RedFlag::MevBotHeavy => self.mev_bot_weight,
            RedFlag::NoQualityWallets => self.no_quality_weight,
            RedFlag::RouterArbitrage => self.router_arbitrage_weight,
            RedFlag::JeeterDominance => self.jeeter_dominance_weight,
            RedFlag::SniperDominance => self.sniper_dominance_weight,
        }
    }
}

/// Red flag aggregator
#[derive(Debug, Clone, Default)]
pub struct RedFlagAggregator {
    config: DangerZoneConfig,
}

impl RedFlagAggregator {
    pub fn new(config: DangerZoneConfig) -> Self {
        Self { config }
    }

    /// Whether one flag fires for these inputs
    pub fn check(
        &self,
        flag: RedFlag,
        flow: &FlowWindowStats,
        quality: &WalletQualityAnalysis,
        token: &TokenSnapshot,
    ) -> bool {
        let c = &self.config;
        let hold = quality.average_hold_time_minutes;
        let liquidity = sanitize(token.liquidity_usd);
        match flag {
            RedFlag::SellDominant => flow.sell_ratio() > c.sell_dominant_ratio,
            RedFlag::ShortHoldTime => quality.has_hold_times() && hold < c.short_hold_minutes,
            RedFlag::SniperHeavy => quality.sniper_fraction > c.sniper_fraction,
            RedFlag::QuickDumps => quality.has_hold_times() && hold < c.quick_dump_minutes,
            RedFlag::LowLiquidity => liquidity < c.low_liquidity_usd,
            RedFlag::CriticalLiquidity => liquidity < c.critical_liquidity_usd,
            RedFlag::MevActive => flow.mev.detected && flow.mev.score > c.mev_score,
            RedFlag::MevBotHeavy => quality.mev_bot_fraction > c.mev_bot_fraction,
            RedFlag::NoQualityWallets => quality.high_quality_wallets == 0,
            RedFlag::RouterArbitrage => {
                flow.transactions_per_minute > c.router_min_tpm
                    && flow.average_transaction_size_usd < c.router_max_avg_size_usd
            }
            RedFlag::JeeterDominance => quality.jeeter_dominance,
            RedFlag::SniperDominance => quality.sniper_dominance,
        }
    }

    pub fn detect(
        &self,
        flow: &FlowWindowStats,
        quality: &WalletQualityAnalysis,
        token: &TokenSnapshot,
    ) -> RedFlagSignals {
        let mut signals = RedFlagSignals::default();
        for flag in RedFlag::ALL {
            if self.check(flag, flow, quality, token) {
                signals.flags.set(flag);
                signals.triggered.push(flag);
                signals.risk_score += self.config.weight(flag);
            }
        }
        signals.risk_score = sanitize(signals.risk_score).max(0.0);
        signals.is_danger_zone = signals.risk_score >= self.config.danger_threshold;

        if signals.is_danger_zone {
            warn!(
                mint = %token.address,
                risk = signals.risk_score,
                flags = signals.triggered.len(),
                "Danger zone detected"
            );
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::MevPatterns;

    fn healthy_quality() -> WalletQualityAnalysis {
        WalletQualityAnalysis {
            total_wallets: 10,
            average_hold_time_minutes: 240.0,
            wallets_with_hold_time: 10,
            high_quality_wallets: 6,
            overall_quality_score: 60.0,
            ..Default::default()
        }
    }

    fn deep_token() -> TokenSnapshot {
        TokenSnapshot {
            liquidity_usd: 80_000.0,
            market_cap_usd: 400_000.0,
            ..TokenSnapshot::new("MINT")
        }
    }

    #[test]
    fn test_clean_inputs_raise_nothing() {
        let signals = RedFlagAggregator::default().detect(
            &FlowWindowStats::default(),
            &healthy_quality(),
            &deep_token(),
        );
        assert_eq!(signals.risk_score, 0.0);
        assert_eq!(signals.flags.count(), 0);
        assert!(!signals.is_danger_zone);
    }

    #[test]
    fn test_each_flag_weight() {
        let aggregator = RedFlagAggregator::default();
        let config = DangerZoneConfig::default();
        let total: f64 = RedFlag::ALL.iter().map(|f| config.weight(*f)).sum();
        assert_eq!(total, 200.0);
        assert_eq!(aggregator.config.weight(RedFlag::JeeterDominance), 25.0);
    }

    #[test]
    fn test_overlapping_flags_both_fire() {
        let quality = WalletQualityAnalysis {
            average_hold_time_minutes: 3.0,
            ..healthy_quality()
        };
        let token = TokenSnapshot {
            liquidity_usd: 2_000.0,
            ..deep_token()
        };
        let signals = RedFlagAggregator::default().detect(&FlowWindowStats::default(), &quality, &token);
        assert!(signals.flags.short_hold_time);
        assert!(signals.flags.quick_dumps);
        assert!(signals.flags.low_liquidity);
        assert!(signals.flags.critical_liquidity);
        // 15 + 20 + 15 + 20
        assert_eq!(signals.risk_score, 70.0);
        assert!(signals.is_danger_zone);
    }

    #[test]
    fn test_unknown_hold_time_does_not_flag() {
        let quality = WalletQualityAnalysis {
            average_hold_time_minutes: 0.0,
            wallets_with_hold_time: 0,
            ..healthy_quality()
        };
        let signals =
            RedFlagAggregator::default().detect(&FlowWindowStats::default(), &quality, &deep_token());
        assert!(!signals.flags.short_hold_time);
        assert!(!signals.flags.quick_dumps);
    }

    #[test]
    fn test_flow_flags() {
        let flow = FlowWindowStats {
            buy_sell_ratio: 0.3,
            transactions_per_minute: 12.0,
            average_transaction_size_usd: 40.0,
            mev: MevPatterns {
                detected: true,
                score: 65.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let signals = RedFlagAggregator::default().detect(&flow, &healthy_quality(), &deep_token());
        assert_eq!(
            signals.triggered,
            vec![RedFlag::SellDominant, RedFlag::MevActive, RedFlag::RouterArbitrage]
        );
        assert_eq!(signals.risk_score, 40.0);
        assert!(!signals.is_danger_zone);
    }

    #[test]
    fn test_undetected_mev_score_ignored() {
        let flow = FlowWindowStats {
            mev: MevPatterns {
                detected: false,
                score: 90.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let signals = RedFlagAggregator::default().detect(&flow, &healthy_quality(), &deep_token());
        assert!(!signals.flags.mev_active);
    }

    #[test]
    fn test_holder_composition_flags() {
        let quality = WalletQualityAnalysis {
            sniper_fraction: 0.35,
            mev_bot_fraction: 0.25,
            high_quality_wallets: 0,
            jeeter_dominance: true,
            sniper_dominance: true,
            ..healthy_quality()
        };
        let signals =
            RedFlagAggregator::default().detect(&FlowWindowStats::default(), &quality, &deep_token());
        // 20 + 10 + 15 + 25 + 20
        assert_eq!(signals.risk_score, 90.0);
        assert!(signals.is_danger_zone);
        assert_eq!(signals.reasons().len(), 5);
    }

    #[test]
    fn test_empty_holder_set_is_danger_zone() {
        let token = TokenSnapshot::new("MINT");
        let signals = RedFlagAggregator::default().detect(
            &FlowWindowStats::default(),
            &WalletQualityAnalysis::default(),
            &token,
        );
        // no quality wallets + low + critical liquidity
        assert_eq!(signals.risk_score, 50.0);
        assert!(signals.is_danger_zone);
    }

    #[test]
    fn test_threshold_boundary() {
        let aggregator = RedFlagAggregator::new(DangerZoneConfig {
            danger_threshold: 15.0,
            ..Default::default()
        });
        let flow = FlowWindowStats {
            buy_sell_ratio: 0.2,
            ..Default::default()
        };
        let signals = aggregator.detect(&flow, &healthy_quality(), &deep_token());
        assert_eq!(signals.risk_score, 15.0);
        assert!(signals.is_danger_zone);
    }
}
