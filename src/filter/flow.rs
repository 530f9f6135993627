//! Transaction flow aggregation
//!
//! Turns a list of individual trades into the aggregated `FlowWindowStats`
//! the scoring engine works on. Swaps are assumed to be already decoded into
//! side and USD value by the data source; no instruction parsing happens here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::filter::types::{FlowWindowStats, MevPatterns, WindowFlow};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One decoded swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTrade {
    pub timestamp: DateTime<Utc>,
    pub wallet: String,
    pub side: TradeSide,
    pub usd_value: f64,
}

/// Flow aggregation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowAggregatorConfig {
    /// Total lookback window
    pub lookback_minutes: i64,
    /// Trades at or above this value are large
    pub large_trade_usd: f64,
    /// Trades at or above this value are whale activity
    pub whale_trade_usd: f64,
    /// Maximum trade distance between the legs of a sandwich
    pub sandwich_max_gap: usize,
    /// Maximum gap between a front-run buy and the buy it precedes
    pub front_run_window_secs: i64,
    /// Trades a wallet needs before its sizing can look automated
    pub bot_min_trades: usize,
    /// Relative size spread under which a wallet's trades look automated
    pub bot_size_tolerance: f64,
    pub sandwich_weight: f64,
    pub front_run_weight: f64,
    pub bot_like_weight: f64,
}

impl Default for FlowAggregatorConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: 24 * 60,
            large_trade_usd: 5_000.0,
            whale_trade_usd: 10_000.0,
            sandwich_max_gap: 3,
            front_run_window_secs: 2,
            bot_min_trades: 5,
            bot_size_tolerance: 0.02,
            sandwich_weight: 25.0,
            front_run_weight: 15.0,
            bot_like_weight: 10.0,
        }
    }
}

/// Builds `FlowWindowStats` from raw trades
#[derive(Debug, Clone, Default)]
pub struct FlowAggregator {
    config: FlowAggregatorConfig,
}

impl FlowAggregator {
    pub fn new(config: FlowAggregatorConfig) -> Self {
        Self { config }
    }

    /// Aggregate trades that happened within the lookback before `now`
    pub fn aggregate(&self, trades: &[FlowTrade], now: DateTime<Utc>) -> FlowWindowStats {
        let start = now - Duration::minutes(self.config.lookback_minutes);
        let mut window: Vec<&FlowTrade> = trades
            .iter()
            .filter(|t| t.timestamp >= start && t.timestamp <= now && t.usd_value.is_finite())
            .collect();
        if window.is_empty() {
            return FlowWindowStats::default();
        }
        window.sort_by_key(|t| t.timestamp);

        let (buy_volume_usd, sell_volume_usd) = side_volumes(&window);
        let total_volume = buy_volume_usd + sell_volume_usd;

        let window_flow = |minutes: i64| {
            let cutoff = now - Duration::minutes(minutes);
            let recent: Vec<&FlowTrade> = window
                .iter()
                .copied()
                .filter(|t| t.timestamp >= cutoff)
                .collect();
            let (buys, sells) = side_volumes(&recent);
            WindowFlow::new(buy_ratio(buys, sells), buys + sells)
        };

        let large_buy_count = self.count_at_least(&window, TradeSide::Buy, self.config.large_trade_usd);
        let large_sell_count =
            self.count_at_least(&window, TradeSide::Sell, self.config.large_trade_usd);
        let whales: Vec<&&FlowTrade> = window
            .iter()
            .filter(|t| t.usd_value >= self.config.whale_trade_usd)
            .collect();

        let span_minutes = ((now - window[0].timestamp).num_seconds() as f64 / 60.0).max(1.0);

        let stats = FlowWindowStats {
            buy_volume_usd,
            sell_volume_usd,
            buy_sell_ratio: buy_ratio(buy_volume_usd, sell_volume_usd),
            m5: window_flow(5),
            m15: window_flow(15),
            h1: window_flow(60),
            h24: window_flow(24 * 60),
            large_buy_count,
            large_sell_count,
            whale_count: whales.len() as u32,
            whale_volume_usd: whales.iter().map(|t| t.usd_value.max(0.0)).sum(),
            mev: self.detect_mev(&window),
            transactions_per_minute: window.len() as f64 / span_minutes,
            average_transaction_size_usd: total_volume / window.len() as f64,
        }
        .normalized();

        debug!(
            trades = window.len(),
            buy_ratio = %format!("{:.2}", stats.buy_sell_ratio),
            mev_score = stats.mev.score,
            "Flow aggregated"
        );
        stats
    }

    fn count_at_least(&self, trades: &[&FlowTrade], side: TradeSide, threshold: f64) -> u32 {
        trades
            .iter()
            .filter(|t| t.side == side && t.usd_value >= threshold)
            .count() as u32
    }

    /// Frequency/size heuristics for MEV activity
    fn detect_mev(&self, trades: &[&FlowTrade]) -> MevPatterns {
        let sandwich_count = self.count_sandwiches(trades);
        let front_run_count = self.count_front_runs(trades);
        let bot_like_count = self.count_bot_like(trades);

        let score = (sandwich_count as f64 * self.config.sandwich_weight
            + front_run_count as f64 * self.config.front_run_weight
            + bot_like_count as f64 * self.config.bot_like_weight)
            .min(100.0);

        MevPatterns {
            detected: score > 0.0,
            score,
            sandwich_count,
            front_run_count,
            bot_like_count,
        }
    }

    /// Same wallet buys before and sells after someone else's trade
    fn count_sandwiches(&self, trades: &[&FlowTrade]) -> u32 {
        let mut count = 0;
        let mut i = 0;
        while i < trades.len() {
            let open = trades[i];
            let mut closed_at = None;
            if open.side == TradeSide::Buy {
                let last = (i + self.config.sandwich_max_gap).min(trades.len().saturating_sub(1));
                for j in (i + 2)..=last {
                    let close = trades[j];
                    let victim_between = trades[i + 1..j].iter().any(|t| t.wallet != open.wallet);
                    if close.side == TradeSide::Sell && close.wallet == open.wallet && victim_between
                    {
                        closed_at = Some(j);
                        break;
                    }
                }
            }
            match closed_at {
                Some(j) => {
                    count += 1;
                    i = j + 1;
                }
                None => i += 1,
            }
        }
        count
    }

    /// A buy landing just before a larger buy from a different wallet
    fn count_front_runs(&self, trades: &[&FlowTrade]) -> u32 {
        let window = Duration::seconds(self.config.front_run_window_secs);
        trades
            .windows(2)
            .filter(|pair| {
                let (first, second) = (pair[0], pair[1]);
                first.side == TradeSide::Buy
                    && second.side == TradeSide::Buy
                    && first.wallet != second.wallet
                    && second.timestamp - first.timestamp <= window
                    && second.usd_value > first.usd_value
            })
            .count() as u32
    }

    /// Wallets repeating near-identical trade sizes
    fn count_bot_like(&self, trades: &[&FlowTrade]) -> u32 {
        let mut by_wallet: HashMap<&str, Vec<f64>> = HashMap::new();
        for trade in trades {
            by_wallet
                .entry(trade.wallet.as_str())
                .or_default()
                .push(trade.usd_value);
        }

        by_wallet
            .values()
            .filter(|sizes| sizes.len() >= self.config.bot_min_trades)
            .filter(|sizes| {
                let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
                if mean <= 0.0 {
                    return false;
                }
                let max = sizes.iter().cloned().fold(f64::MIN, f64::max);
                let min = sizes.iter().cloned().fold(f64::MAX, f64::min);
                (max - min) / mean <= self.config.bot_size_tolerance
            })
            .count() as u32
    }
}

fn side_volumes(trades: &[&FlowTrade]) -> (f64, f64) {
    trades.iter().fold((0.0, 0.0), |(buys, sells), t| {
        let value = t.usd_value.max(0.0);
        match t.side {
            TradeSide::Buy => (buys + value, sells),
            TradeSide::Sell => (buys, sells + value),
        }
    })
}

/// Buy share of volume, balanced when there is no volume
fn buy_ratio(buys: f64, sells: f64) -> f64 {
    let total = buys + sells;
    if total > 0.0 {
        buys / total
    } else {
        0.5
    }
}
