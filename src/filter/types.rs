//! Input records for a single analysis run
//!
//! Everything here is a point-in-time snapshot handed over by the data
//! sources. Optional numeric fields deserialize to zero or `None` so that a
//! partially filled snapshot still produces a (degraded) analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single buy or sell by a holder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub timestamp: DateTime<Utc>,
    /// Token amount moved
    pub amount: f64,
}

impl TradeEvent {
    pub fn new(timestamp: DateTime<Utc>, amount: f64) -> Self {
        Self { timestamp, amount }
    }
}

/// One holder of the token at snapshot time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderRecord {
    pub address: String,
    #[serde(default)]
    pub balance: f64,
    /// Share of total supply, 0-100
    #[serde(default)]
    pub percentage: f64,

    #[serde(default)]
    pub first_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction_count: Option<u32>,
    /// Buys in chronological order
    #[serde(default)]
    pub buy_events: Vec<TradeEvent>,
    /// Sells in chronological order
    #[serde(default)]
    pub sell_events: Vec<TradeEvent>,
    #[serde(default)]
    pub avg_hold_time_minutes: Option<f64>,

    // Derived flags (filled by enrichment)
    #[serde(default)]
    pub is_jeeter: bool,
    #[serde(default)]
    pub jeeter_score: Option<f64>,
    #[serde(default)]
    pub is_bundle: bool,
}

impl HolderRecord {
    /// Create a holder with only balance information
    pub fn new(address: impl Into<String>, balance: f64, percentage: f64) -> Self {
        Self {
            address: address.into(),
            balance,
            percentage,
            ..Default::default()
        }
    }

    pub fn buy_count(&self) -> usize {
        self.buy_events.len()
    }

    pub fn sell_count(&self) -> usize {
        self.sell_events.len()
    }

    /// Reported transaction count, falling back to the number of known events
    pub fn tx_count(&self) -> u32 {
        self.transaction_count
            .unwrap_or((self.buy_events.len() + self.sell_events.len()) as u32)
    }

    /// Sells per buy. With no buys, any sell counts as a full exit.
    pub fn sell_buy_ratio(&self) -> f64 {
        let buys = self.buy_count();
        let sells = self.sell_count();
        if buys == 0 {
            if sells > 0 {
                1.0
            } else {
                0.0
            }
        } else {
            sells as f64 / buys as f64
        }
    }

    pub fn total_bought(&self) -> f64 {
        self.buy_events.iter().map(|e| e.amount.max(0.0)).sum()
    }

    pub fn total_sold(&self) -> f64 {
        self.sell_events.iter().map(|e| e.amount.max(0.0)).sum()
    }
}

/// Buy-share and volume for one lookback window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowFlow {
    /// Buy share of volume, 0-1 (0.5 = balanced)
    pub buy_ratio: f64,
    pub volume_usd: f64,
}

impl Default for WindowFlow {
    fn default() -> Self {
        Self {
            buy_ratio: 0.5,
            volume_usd: 0.0,
        }
    }
}

impl WindowFlow {
    pub fn new(buy_ratio: f64, volume_usd: f64) -> Self {
        Self {
            buy_ratio: clamp_ratio(buy_ratio),
            volume_usd: non_negative(volume_usd),
        }
    }

    pub fn sell_volume_usd(&self) -> f64 {
        self.volume_usd * (1.0 - self.buy_ratio)
    }
}

/// MEV pattern detection result
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MevPatterns {
    pub detected: bool,
    /// 0-100
    pub score: f64,
    pub sandwich_count: u32,
    pub front_run_count: u32,
    pub bot_like_count: u32,
}

impl MevPatterns {
    /// Score that only counts when the pattern was actually detected
    pub fn active_score(&self) -> f64 {
        if self.detected {
            self.score
        } else {
            0.0
        }
    }
}

/// Aggregated transaction flow over a lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowWindowStats {
    pub buy_volume_usd: f64,
    pub sell_volume_usd: f64,
    /// Overall buy share, 0-1 (0.5 = balanced or no data)
    pub buy_sell_ratio: f64,

    pub m5: WindowFlow,
    pub m15: WindowFlow,
    pub h1: WindowFlow,
    pub h24: WindowFlow,

    /// Trades at or above the large-trade threshold ($5k)
    pub large_buy_count: u32,
    pub large_sell_count: u32,
    /// Trades at or above the whale threshold ($10k)
    pub whale_count: u32,
    pub whale_volume_usd: f64,

    pub mev: MevPatterns,

    pub transactions_per_minute: f64,
    pub average_transaction_size_usd: f64,
}

impl Default for FlowWindowStats {
    fn default() -> Self {
        Self {
            buy_volume_usd: 0.0,
            sell_volume_usd: 0.0,
            buy_sell_ratio: 0.5,
            m5: WindowFlow::default(),
            m15: WindowFlow::default(),
            h1: WindowFlow::default(),
            h24: WindowFlow::default(),
            large_buy_count: 0,
            large_sell_count: 0,
            whale_count: 0,
            whale_volume_usd: 0.0,
            mev: MevPatterns::default(),
            transactions_per_minute: 0.0,
            average_transaction_size_usd: 0.0,
        }
    }
}

impl FlowWindowStats {
    /// Clamp every field into its documented range.
    ///
    /// Ratios land in [0, 1] (NaN becomes the balanced 0.5), scores in
    /// [0, 100], volumes and rates are non-negative.
    pub fn normalized(mut self) -> Self {
        self.buy_volume_usd = non_negative(self.buy_volume_usd);
        self.sell_volume_usd = non_negative(self.sell_volume_usd);
        self.buy_sell_ratio = clamp_ratio(self.buy_sell_ratio);
        for window in [&mut self.m5, &mut self.m15, &mut self.h1, &mut self.h24] {
            *window = WindowFlow::new(window.buy_ratio, window.volume_usd);
        }
        self.whale_volume_usd = non_negative(self.whale_volume_usd);
        self.mev.score = if self.mev.score.is_finite() {
            self.mev.score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.transactions_per_minute = non_negative(self.transactions_per_minute);
        self.average_transaction_size_usd = non_negative(self.average_transaction_size_usd);
        self
    }

    /// Sell share of volume, 0-1
    pub fn sell_ratio(&self) -> f64 {
        1.0 - clamp_ratio(self.buy_sell_ratio)
    }

    pub fn total_volume_usd(&self) -> f64 {
        self.buy_volume_usd + self.sell_volume_usd
    }

    pub fn has_activity(&self) -> bool {
        self.total_volume_usd() > 0.0 || self.transactions_per_minute > 0.0
    }
}

/// Token and market snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSnapshot {
    pub address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: u8,
    pub total_supply: f64,
    pub market_cap_usd: f64,
    pub price_usd: f64,
    pub liquidity_usd: f64,
}

impl TokenSnapshot {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Symbol for log lines
    pub fn display_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or("???")
    }
}

/// A single price sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
