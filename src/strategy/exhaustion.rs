//! Seller Exhaustion Detector
//!
//! Looks for the end of a sell-off: sell volume fading, large sells drying
//! up after one last capitulation, buyers taking over, and price volatility
//! compressing. The additive score ranks how exhausted sellers look; the
//! bottom signal is a stricter conjunctive gate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::types::{FlowWindowStats, PricePoint};
use crate::strategy::series::{
    clamp_score, has_volatility_sample, sanitize, volatility, volatility_trend,
};

/// Seller exhaustion result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellerExhaustionSignals {
    /// Additive signal score, 0-100
    pub score: f64,
    /// All bottom conditions hold at once
    pub bottom_signal: bool,

    pub sell_volume_declining: bool,
    pub large_sells_drying_up: bool,
    pub buyers_dominant: bool,
    pub capitulation: bool,
    pub mev_inactive: bool,
    pub tight_range: bool,
    pub volatility_compressing: bool,

    /// 15-minute sell volume extrapolated from the hourly window
    pub estimated_sell_volume_15m: f64,
    pub hourly_sell_volume: f64,
    pub recent_volatility: f64,
    pub volatility_trend: f64,

    pub reasons: Vec<String>,
}

/// Seller exhaustion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhaustionConfig {
    /// Share of hourly volume attributed to a 15-minute window
    pub window_share: f64,
    /// Estimated 15m sell volume below this fraction of hourly sell volume
    pub sell_decline_fraction: f64,
    pub sell_decline_points: f64,

    /// Large sells must stay below this absolute count
    pub large_sell_max: u32,
    pub large_sells_points: f64,

    pub buyer_dominance_ratio: f64,
    pub buyer_points: f64,

    pub capitulation_min: u32,
    pub capitulation_max: u32,
    pub capitulation_points: f64,

    /// MEV scores below this count as inactive
    pub mev_inactive_max: f64,
    pub mev_points: f64,

    /// Trailing samples used for volatility
    pub volatility_window: usize,
    pub tight_volatility: f64,
    pub tight_points: f64,

    pub compression_trend: f64,
    pub compression_points: f64,

    pub bottom_min_score: f64,
}

impl Default for ExhaustionConfig {
    fn default() -> Self {
        Self {
            window_share: 0.25,
            sell_decline_fraction: 0.3,
            sell_decline_points: 20.0,
            large_sell_max: 3,
            large_sells_points: 15.0,
            buyer_dominance_ratio: 0.6,
            buyer_points: 20.0,
            capitulation_min: 1,
            capitulation_max: 2,
            capitulation_points: 15.0,
            mev_inactive_max: 20.0,
            mev_points: 10.0,
            volatility_window: 30,
            tight_volatility: 0.05,
            tight_points: 10.0,
            compression_trend: -0.2,
            compression_points: 10.0,
            bottom_min_score: 60.0,
        }
    }
}

/// Seller exhaustion detector
#[derive(Debug, Clone, Default)]
pub struct SellerExhaustionDetector {
    config: ExhaustionConfig,
}

impl SellerExhaustionDetector {
    pub fn new(config: ExhaustionConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, flow: &FlowWindowStats, prices: &[PricePoint]) -> SellerExhaustionSignals {
        let c = &self.config;
        let flow = flow.clone().normalized();
        let mut signals = SellerExhaustionSignals::default();
        let mut score = 0.0;

        // Sell volume fading: extrapolated 15m sells vs the hourly total
        let hourly_sell = flow.h1.sell_volume_usd();
        let estimated_15m = flow.h1.volume_usd * c.window_share * (1.0 - flow.m15.buy_ratio);
        signals.hourly_sell_volume = hourly_sell;
        signals.estimated_sell_volume_15m = sanitize(estimated_15m);
        if hourly_sell > 0.0 && estimated_15m < c.sell_decline_fraction * hourly_sell {
            signals.sell_volume_declining = true;
            score += c.sell_decline_points;
            signals.reasons.push(format!(
                "Sell volume fading: ~${:.0} in 15m vs ${:.0} per hour",
                estimated_15m, hourly_sell
            ));
        }

        let large_sells = flow.large_sell_count;
        if (large_sells as f64) < flow.large_buy_count as f64 / 2.0 && large_sells < c.large_sell_max
        {
            signals.large_sells_drying_up = true;
            score += c.large_sells_points;
            signals.reasons.push(format!(
                "Large sells drying up: {} vs {} large buys",
                large_sells, flow.large_buy_count
            ));
        }

        if flow.buy_sell_ratio > c.buyer_dominance_ratio {
            signals.buyers_dominant = true;
            score += c.buyer_points;
            signals.reasons.push(format!(
                "Buyers dominant: {:.0}% of volume",
                flow.buy_sell_ratio * 100.0
            ));
        }

        if (c.capitulation_min..=c.capitulation_max).contains(&large_sells) {
            signals.capitulation = true;
            score += c.capitulation_points;
            signals
                .reasons
                .push("One last capitulation, then silence".to_string());
        }

        if !flow.mev.detected || flow.mev.score < c.mev_inactive_max {
            signals.mev_inactive = true;
            score += c.mev_points;
        }

        signals.recent_volatility = volatility(prices, c.volatility_window);
        if has_volatility_sample(prices, c.volatility_window)
            && signals.recent_volatility < c.tight_volatility
        {
            signals.tight_range = true;
            score += c.tight_points;
            signals.reasons.push(format!(
                "Tight range: volatility {:.3}",
                signals.recent_volatility
            ));
        }

        signals.volatility_trend = volatility_trend(prices, c.volatility_window);
        if signals.volatility_trend <= c.compression_trend {
            signals.volatility_compressing = true;
            score += c.compression_points;
            signals.reasons.push(format!(
                "Volatility compressing: {:.0}%",
                signals.volatility_trend * 100.0
            ));
        }

        signals.score = clamp_score(score);
        signals.bottom_signal = signals.score >= c.bottom_min_score
            && signals.tight_range
            && signals.buyers_dominant
            && signals.mev_inactive;

        debug!(
            score = signals.score,
            bottom = signals.bottom_signal,
            "Seller exhaustion evaluated"
        );
        signals
    }
}
