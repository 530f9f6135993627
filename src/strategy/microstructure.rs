//! Microstructure Signal Engine
//!
//! Short-horizon signals from a price series and the windowed flow ratios:
//! momentum at three horizons, flow deltas between windows, volatility and
//! its trend, and a bot activity index. They fuse into a 0-100 micro score
//! centred on 50.
//!
//! Sample cadence is the caller's responsibility; windows count samples,
//! not minutes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::types::{FlowWindowStats, PricePoint, TokenSnapshot};
use crate::strategy::series::{
    clamp_finite, clamp_score, has_volatility_sample, momentum, sanitize, volatility,
    volatility_trend,
};

/// Per-term contributions to the micro score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroScoreTerms {
    pub flow: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub bot_activity: f64,
    pub liquidity: f64,
}

/// Microstructure signals for one analysis call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureSignals {
    /// Relative change over the last 5 / 15 / 60 samples, [-10, 10]
    pub momentum_5: f64,
    pub momentum_15: f64,
    pub momentum_60: f64,

    /// 5m minus 15m buy ratio
    pub flow_delta_5m: f64,
    /// 15m minus 1h buy ratio
    pub flow_delta_15m: f64,
    /// 1h minus overall buy ratio
    pub flow_delta_1h: f64,

    /// Std dev of relative price changes over the trailing window, [0, 10]
    pub recent_volatility: f64,
    /// Relative change of recent vs earlier volatility, [-1, 1]
    pub volatility_trend: f64,

    /// 0-100
    pub bot_activity_index: f64,
    /// Always 0 until a historical liquidity feed exists
    pub liquidity_velocity: f64,

    pub terms: MicroScoreTerms,
    /// 0-100, 50 is neutral
    pub micro_score: f64,
    pub sample_count: usize,
}

/// Microstructure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrostructureConfig {
    pub short_window: usize,
    pub medium_window: usize,
    pub long_window: usize,
    /// Momentum values clamp to +/- this
    pub momentum_limit: f64,

    pub volatility_window: usize,
    pub volatility_max: f64,

    pub base_score: f64,
    /// Multiplier on the 15m flow delta
    pub flow_weight: f64,
    pub flow_cap: f64,
    /// Multiplier on short minus medium momentum
    pub momentum_weight: f64,
    pub momentum_cap: f64,

    /// Volatility trend below this counts as compression
    pub compression_threshold: f64,
    pub compression_bonus: f64,
    /// Recent volatility below this is already tight
    pub tight_volatility: f64,
    pub tight_bonus: f64,
    pub loose_penalty: f64,

    /// Transactions per minute that max out the rate component
    pub bot_tpm_reference: f64,
    pub bot_tpm_points: f64,
    pub bot_small_size_usd: f64,
    pub bot_small_size_points: f64,
    pub bot_mev_points: f64,
    /// Micro score deduction at a bot index of 100
    pub bot_penalty: f64,

    pub liquidity_velocity_cap: f64,
}

impl Default for MicrostructureConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            medium_window: 15,
            long_window: 60,
            momentum_limit: 10.0,
            volatility_window: 30,
            volatility_max: 10.0,
            base_score: 50.0,
            flow_weight: 40.0,
            flow_cap: 20.0,
            momentum_weight: 100.0,
            momentum_cap: 15.0,
            compression_threshold: -0.2,
            compression_bonus: 15.0,
            tight_volatility: 0.02,
            tight_bonus: 10.0,
            loose_penalty: 10.0,
            bot_tpm_reference: 30.0,
            bot_tpm_points: 50.0,
            bot_small_size_usd: 100.0,
            bot_small_size_points: 25.0,
            bot_mev_points: 25.0,
            bot_penalty: 20.0,
            liquidity_velocity_cap: 10.0,
        }
    }
}

/// Microstructure signal engine
#[derive(Debug, Clone, Default)]
pub struct MicrostructureSignalEngine {
    config: MicrostructureConfig,
}

impl MicrostructureSignalEngine {
    pub fn new(config: MicrostructureConfig) -> Self {
        Self { config }
    }

    /// Bot activity index, 0-100
    pub fn bot_activity_index(&self, flow: &FlowWindowStats) -> f64 {
        let c = &self.config;
        let rate = if c.bot_tpm_reference > 0.0 {
            (flow.transactions_per_minute / c.bot_tpm_reference).min(1.0)
        } else {
            0.0
        };
        let mut index = sanitize(rate) * c.bot_tpm_points;

        let avg_size = flow.average_transaction_size_usd;
        if avg_size > 0.0 && avg_size < c.bot_small_size_usd {
            index += c.bot_small_size_points;
        }
        index += clamp_score(flow.mev.score) / 100.0 * c.bot_mev_points;
        clamp_score(index)
    }

    pub fn compute(
        &self,
        prices: &[PricePoint],
        flow: &FlowWindowStats,
        token: Option<&TokenSnapshot>,
    ) -> MicrostructureSignals {
        let c = &self.config;
        let flow = flow.clone().normalized();

        let momentum_5 = momentum(prices, c.short_window, c.momentum_limit);
        let momentum_15 = momentum(prices, c.medium_window, c.momentum_limit);
        let momentum_60 = momentum(prices, c.long_window, c.momentum_limit);

        let flow_delta_5m = flow.m5.buy_ratio - flow.m15.buy_ratio;
        let flow_delta_15m = flow.m15.buy_ratio - flow.h1.buy_ratio;
        let flow_delta_1h = flow.h1.buy_ratio - flow.buy_sell_ratio;

        let recent_volatility =
            clamp_finite(volatility(prices, c.volatility_window), 0.0, c.volatility_max);
        let trend = volatility_trend(prices, c.volatility_window);
        let bot_activity_index = self.bot_activity_index(&flow);

        // No historical liquidity snapshots yet, so velocity stays neutral
        let liquidity_velocity = 0.0;

        let volatility_term = if !has_volatility_sample(prices, c.volatility_window) {
            0.0
        } else if trend < c.compression_threshold {
            c.compression_bonus
        } else if recent_volatility < c.tight_volatility {
            c.tight_bonus
        } else {
            -c.loose_penalty
        };

        let terms = MicroScoreTerms {
            flow: clamp_finite(flow_delta_15m * c.flow_weight, -c.flow_cap, c.flow_cap),
            momentum: clamp_finite(
                (momentum_5 - momentum_15) * c.momentum_weight,
                -c.momentum_cap,
                c.momentum_cap,
            ),
            volatility: volatility_term,
            bot_activity: -(bot_activity_index / 100.0) * c.bot_penalty,
            liquidity: clamp_finite(
                liquidity_velocity,
                -c.liquidity_velocity_cap,
                c.liquidity_velocity_cap,
            ),
        };

        let micro_score = clamp_score(
            c.base_score
                + sanitize(terms.flow)
                + sanitize(terms.momentum)
                + sanitize(terms.volatility)
                + sanitize(terms.bot_activity)
                + sanitize(terms.liquidity),
        );

        debug!(
            mint = token.map(|t| t.address.as_str()).unwrap_or("-"),
            samples = prices.len(),
            micro_score,
            bot_index = bot_activity_index,
            "Microstructure signals computed"
        );

        MicrostructureSignals {
            momentum_5,
            momentum_15,
            momentum_60,
            flow_delta_5m: sanitize(flow_delta_5m),
            flow_delta_15m: sanitize(flow_delta_15m),
            flow_delta_1h: sanitize(flow_delta_1h),
            recent_volatility,
            volatility_trend: trend,
            bot_activity_index,
            liquidity_velocity,
            terms,
            micro_score,
            sample_count: prices.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{MevPatterns, WindowFlow};
    use crate::strategy::series::tests::series;

    #[test]
    fn test_empty_inputs_are_neutral() {
        let signals =
            MicrostructureSignalEngine::default().compute(&[], &FlowWindowStats::default(), None);
        assert_eq!(signals.micro_score, 50.0);
        assert_eq!(signals.momentum_5, 0.0);
        assert_eq!(signals.recent_volatility, 0.0);
        assert_eq!(signals.bot_activity_index, 0.0);
        assert_eq!(signals.terms, MicroScoreTerms::default());
    }

    #[test]
    fn test_liquidity_velocity_is_placeholder() {
        let prices = series(&[1.0, 0.9, 0.8, 0.85, 0.9]);
        let signals =
            MicrostructureSignalEngine::default().compute(&prices, &FlowWindowStats::default(), None);
        assert_eq!(signals.liquidity_velocity, 0.0);
        assert_eq!(signals.terms.liquidity, 0.0);
    }

    #[test]
    fn test_flow_deltas() {
        let flow = FlowWindowStats {
            buy_sell_ratio: 0.45,
            m5: WindowFlow::new(0.8, 1_000.0),
            m15: WindowFlow::new(0.7, 3_000.0),
            h1: WindowFlow::new(0.5, 10_000.0),
            ..Default::default()
        };
        let signals = MicrostructureSignalEngine::default().compute(&[], &flow, None);
        assert!((signals.flow_delta_5m - 0.1).abs() < 1e-9);
        assert!((signals.flow_delta_15m - 0.2).abs() < 1e-9);
        assert!((signals.flow_delta_1h - 0.05).abs() < 1e-9);
        // 0.2 * 40 = 8
        assert!((signals.terms.flow - 8.0).abs() < 1e-9);
        assert!((signals.micro_score - 58.0).abs() < 1e-9);
    }

    #[test]
    fn test_flow_term_is_capped() {
        let flow = FlowWindowStats {
            m15: WindowFlow::new(1.0, 1.0),
            h1: WindowFlow::new(0.0, 1.0),
            ..Default::default()
        };
        let signals = MicrostructureSignalEngine::default().compute(&[], &flow, None);
        assert_eq!(signals.terms.flow, 20.0);
    }

    #[test]
    fn test_momentum_term_rewards_deceleration() {
        // long decline, then a short bounce
        let mut raw: Vec<f64> = (0..15).map(|i| 2.0 - i as f64 * 0.08).collect();
        raw.extend([0.9, 0.92, 0.95, 0.97]);
        let prices = series(&raw);
        let signals =
            MicrostructureSignalEngine::default().compute(&prices, &FlowWindowStats::default(), None);
        assert!(signals.momentum_5 > signals.momentum_15);
        assert_eq!(signals.terms.momentum, 15.0);
    }

    #[test]
    fn test_volatility_terms() {
        let engine = MicrostructureSignalEngine::default();
        let flow = FlowWindowStats::default();

        let flat = engine.compute(&series(&[1.0; 40]), &flow, None);
        assert_eq!(flat.terms.volatility, 10.0);

        let choppy: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 1.0 } else { 1.2 }).collect();
        let loose = engine.compute(&series(&choppy), &flow, None);
        assert_eq!(loose.terms.volatility, -10.0);

        let mut compressing: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { 1.2 }).collect();
        compressing.extend((0..30).map(|i| if i % 2 == 0 { 1.0 } else { 1.01 }));
        let tight = engine.compute(&series(&compressing), &flow, None);
        assert_eq!(tight.terms.volatility, 15.0);
    }

    #[test]
    fn test_bot_activity_index() {
        let engine = MicrostructureSignalEngine::default();
        let flow = FlowWindowStats {
            transactions_per_minute: 60.0,
            average_transaction_size_usd: 50.0,
            mev: MevPatterns {
                detected: true,
                score: 100.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(engine.bot_activity_index(&flow), 100.0);

        let calm = FlowWindowStats {
            transactions_per_minute: 15.0,
            average_transaction_size_usd: 500.0,
            ..Default::default()
        };
        assert_eq!(engine.bot_activity_index(&calm), 25.0);

        let signals = engine.compute(&[], &flow, None);
        assert_eq!(signals.terms.bot_activity, -20.0);
        assert_eq!(signals.micro_score, 30.0);
    }

    #[test]
    fn test_degenerate_prices_do_not_propagate_nan() {
        let prices = series(&[0.0, f64::NAN, f64::INFINITY, 0.0, 1.0]);
        let signals =
            MicrostructureSignalEngine::default().compute(&prices, &FlowWindowStats::default(), None);
        assert!(signals.micro_score.is_finite());
        assert!((0.0..=100.0).contains(&signals.micro_score));
        assert!((-10.0..=10.0).contains(&signals.momentum_5));
    }
}
