//! Data sources
//!
//! Async interfaces for the four analysis inputs. Implementations may hit the
//! network, a cache or a file; the engine only sees the typed records.
//! Retries and timeouts live here, never in the scoring core.

mod analyzer;
mod snapshot;

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::types::{FlowWindowStats, HolderRecord, PricePoint, TokenSnapshot};

pub use analyzer::{AnalysisInputs, TokenAnalyzer};
pub use snapshot::{AnalysisSnapshot, SnapshotFile};

/// Top holders of a token (bounded, typically 150-200)
#[async_trait]
pub trait HolderSource: Send + Sync {
    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>>;
}

/// Aggregated transaction flow over the source's lookback
#[async_trait]
pub trait FlowSource: Send + Sync {
    async fn fetch_flow(&self, mint: &str) -> Result<FlowWindowStats>;
}

/// Token and market snapshot; `None` when the token is unknown
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self, mint: &str) -> Result<Option<TokenSnapshot>>;
}

/// Price series, ascending by time. May be empty or short.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self, mint: &str) -> Result<Vec<PricePoint>>;
}
