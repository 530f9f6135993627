//! Liquidity Health Scorer
//!
//! Scores pool depth and the pool-to-valuation ratio. Thin pools make exits
//! impossible; pools far larger than the market cap are just as suspicious.

use serde::{Deserialize, Serialize};

use crate::filter::types::TokenSnapshot;
use crate::strategy::series::{clamp_score, sanitize};

/// Liquidity health result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityHealthSignals {
    /// Health score 0-100
    pub score: f64,
    /// score >= healthy_min
    pub is_healthy: bool,
    /// liquidity / market cap, 0 when the market cap is unknown
    pub liquidity_ratio: f64,
    pub liquidity_usd: f64,
    /// Risk reasons in evaluation order
    pub reasons: Vec<String>,
}

/// Configuration for liquidity scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityHealthConfig {
    /// Pool below this is critically thin
    pub critical_liquidity_usd: f64,
    pub critical_penalty: f64,
    /// Pool below this is low
    pub low_liquidity_usd: f64,
    pub low_penalty: f64,
    /// Pool below this is modest
    pub modest_liquidity_usd: f64,
    pub modest_penalty: f64,

    pub very_low_ratio: f64,
    pub very_low_ratio_penalty: f64,
    pub low_ratio: f64,
    pub low_ratio_penalty: f64,
    /// Ratios above this look like a staged pool
    pub high_ratio: f64,
    pub high_ratio_penalty: f64,

    pub healthy_min: f64,
}

impl Default for LiquidityHealthConfig {
    fn default() -> Self {
        Self {
            critical_liquidity_usd: 5_000.0,
            critical_penalty: 40.0,
            low_liquidity_usd: 10_000.0,
            low_penalty: 20.0,
            modest_liquidity_usd: 50_000.0,
            modest_penalty: 10.0,
            very_low_ratio: 0.05,
            very_low_ratio_penalty: 30.0,
            low_ratio: 0.1,
            low_ratio_penalty: 15.0,
            high_ratio: 0.5,
            high_ratio_penalty: 10.0,
            healthy_min: 60.0,
        }
    }
}

/// Liquidity health scorer
#[derive(Debug, Clone, Default)]
pub struct LiquidityHealthScorer {
    config: LiquidityHealthConfig,
}

impl LiquidityHealthScorer {
    pub fn new(config: LiquidityHealthConfig) -> Self {
        Self { config }
    }

    /// Score a token's pool
    pub fn score(&self, token: &TokenSnapshot) -> LiquidityHealthSignals {
        let c = &self.config;
        let liquidity = sanitize(token.liquidity_usd).max(0.0);
        let market_cap = sanitize(token.market_cap_usd).max(0.0);
        let mut score: f64 = 100.0;
        let mut reasons = Vec::new();

        if liquidity < c.critical_liquidity_usd {
            score -= c.critical_penalty;
            reasons.push(format!("Critically low liquidity: ${:.0}", liquidity));
        } else if liquidity < c.low_liquidity_usd {
            score -= c.low_penalty;
            reasons.push(format!("Low liquidity: ${:.0}", liquidity));
        } else if liquidity < c.modest_liquidity_usd {
            score -= c.modest_penalty;
            reasons.push(format!("Modest liquidity: ${:.0}", liquidity));
        }

        // Ratio checks need a known market cap
        let liquidity_ratio = if market_cap > 0.0 {
            sanitize(liquidity / market_cap)
        } else {
            0.0
        };
        if market_cap > 0.0 {
            if liquidity_ratio < c.very_low_ratio {
                score -= c.very_low_ratio_penalty;
                reasons.push(format!(
                    "Liquidity only {:.1}% of market cap",
                    liquidity_ratio * 100.0
                ));
            } else if liquidity_ratio < c.low_ratio {
                score -= c.low_ratio_penalty;
                reasons.push(format!(
                    "Thin liquidity vs market cap: {:.1}%",
                    liquidity_ratio * 100.0
                ));
            } else if liquidity_ratio > c.high_ratio {
                score -= c.high_ratio_penalty;
                reasons.push(format!(
                    "Suspiciously high liquidity ratio: {:.1}%",
                    liquidity_ratio * 100.0
                ));
            }

            if liquidity == 0.0 {
                score = 0.0;
                reasons.push("No liquidity against a non-zero market cap".to_string());
            }
        }

        let score = clamp_score(score);
        LiquidityHealthSignals {
            score,
            is_healthy: score >= c.healthy_min,
            liquidity_ratio,
            liquidity_usd: liquidity,
            reasons,
        }
    }
}
