//! JSON snapshot source
//!
//! One document holding everything an analysis needs. Flow can be given
//! pre-aggregated or as raw trades; raw trades are aggregated on load.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::flow::{FlowAggregator, FlowAggregatorConfig, FlowTrade};
use crate::filter::types::{FlowWindowStats, HolderRecord, PricePoint, TokenSnapshot};

use super::{FlowSource, HolderSource, PriceSource, TokenSource};

/// On-disk snapshot document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSnapshot {
    pub token: TokenSnapshot,
    pub holders: Vec<HolderRecord>,
    /// Pre-aggregated flow; takes precedence over `trades`
    pub flow: Option<FlowWindowStats>,
    pub trades: Vec<FlowTrade>,
    pub prices: Vec<PricePoint>,
    /// Reference time for trade windows; defaults to the newest trade
    pub as_of: Option<DateTime<Utc>>,
}

impl AnalysisSnapshot {
    /// Check the document and bring it into the shape the engine expects
    pub fn prepare(mut self) -> Result<Self> {
        if self.token.address.trim().is_empty() {
            return Err(Error::InvalidSnapshot("token.address is empty".to_string()));
        }
        if let Some(holder) = self.holders.iter().find(|h| h.address.trim().is_empty()) {
            return Err(Error::InvalidSnapshot(format!(
                "holder with balance {} has no address",
                holder.balance
            )));
        }
        self.prices.sort_by_key(|p| p.timestamp);
        Ok(self)
    }

    /// Flow stats for this snapshot
    pub fn flow_stats(&self, aggregator: &FlowAggregator) -> FlowWindowStats {
        if let Some(flow) = &self.flow {
            return flow.clone().normalized();
        }
        let now = self
            .as_of
            .or_else(|| self.trades.iter().map(|t| t.timestamp).max());
        match now {
            Some(now) => aggregator.aggregate(&self.trades, now),
            None => FlowWindowStats::default(),
        }
    }
}

/// Snapshot file loaded into memory
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    snapshot: AnalysisSnapshot,
    flow: FlowWindowStats,
}

impl SnapshotFile {
    pub fn from_snapshot(snapshot: AnalysisSnapshot, flow_config: FlowAggregatorConfig) -> Result<Self> {
        let snapshot = snapshot.prepare()?;
        let flow = snapshot.flow_stats(&FlowAggregator::new(flow_config));
        Ok(Self { snapshot, flow })
    }

    /// Read and parse a snapshot document
    pub async fn load<P: AsRef<Path>>(path: P, flow_config: FlowAggregatorConfig) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: AnalysisSnapshot = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidSnapshot(format!("{}: {}", path.display(), e)))?;
        let file = Self::from_snapshot(snapshot, flow_config)?;

        info!(
            path = %path.display(),
            mint = %file.snapshot.token.address,
            holders = file.snapshot.holders.len(),
            trades = file.snapshot.trades.len(),
            prices = file.snapshot.prices.len(),
            "Snapshot loaded"
        );
        Ok(file)
    }

    pub fn mint(&self) -> &str {
        &self.snapshot.token.address
    }

    pub fn snapshot(&self) -> &AnalysisSnapshot {
        &self.snapshot
    }

    fn check_mint(&self, mint: &str) -> Result<()> {
        if mint == self.mint() {
            Ok(())
        } else {
            debug!(requested = mint, loaded = self.mint(), "Snapshot mint mismatch");
            Err(Error::TokenNotFound(mint.to_string()))
        }
    }
}

#[async_trait]
impl HolderSource for SnapshotFile {
    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>> {
        self.check_mint(mint)?;
        Ok(self.snapshot.holders.clone())
    }
}

#[async_trait]
impl FlowSource for SnapshotFile {
    async fn fetch_flow(&self, mint: &str) -> Result<FlowWindowStats> {
        self.check_mint(mint)?;
        Ok(self.flow.clone())
    }
}

#[async_trait]
impl TokenSource for SnapshotFile {
    async fn fetch_token(&self, mint: &str) -> Result<Option<TokenSnapshot>> {
        if mint == self.mint() {
            Ok(Some(self.snapshot.token.clone()))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl PriceSource for SnapshotFile {
    async fn fetch_prices(&self, mint: &str) -> Result<Vec<PricePoint>> {
        self.check_mint(mint)?;
        Ok(self.snapshot.prices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"{
        "token": { "address": "MINT", "symbol": "DIP", "price_usd": 0.5, "liquidity_usd": 20000 },
        "holders": [ { "address": "W1", "balance": 1000, "percentage": 1.0, "avg_hold_time_minutes": 3, "transaction_count": 15 } ],
        "trades": [
            { "timestamp": "2025-01-01T12:00:00Z", "wallet": "A", "side": "buy", "usd_value": 300 },
            { "timestamp": "2025-01-01T12:10:00Z", "wallet": "B", "side": "sell", "usd_value": 100 }
        ],
        "prices": [
            { "timestamp": "2025-01-01T12:01:00Z", "price": 0.52 },
            { "timestamp": "2025-01-01T12:00:00Z", "price": 0.55 }
        ]
    }"#;

    fn write_doc(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let file = write_doc(DOC);
        let source = SnapshotFile::load(file.path(), FlowAggregatorConfig::default())
            .await
            .unwrap();

        assert_eq!(source.mint(), "MINT");
        let holders = source.fetch_holders("MINT").await.unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].transaction_count, Some(15));

        let prices = source.fetch_prices("MINT").await.unwrap();
        assert!(prices[0].timestamp < prices[1].timestamp);

        let flow = source.fetch_flow("MINT").await.unwrap();
        assert!((flow.buy_sell_ratio - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_mint() {
        let file = write_doc(DOC);
        let source = SnapshotFile::load(file.path(), FlowAggregatorConfig::default())
            .await
            .unwrap();
        assert!(source.fetch_token("OTHER").await.unwrap().is_none());
        assert!(matches!(
            source.fetch_holders("OTHER").await,
            Err(Error::TokenNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_documents() {
        let file = write_doc("{ not json");
        assert!(matches!(
            SnapshotFile::load(file.path(), FlowAggregatorConfig::default()).await,
            Err(Error::InvalidSnapshot(_))
        ));

        let file = write_doc(r#"{ "token": { "address": "" } }"#);
        assert!(matches!(
            SnapshotFile::load(file.path(), FlowAggregatorConfig::default()).await,
            Err(Error::InvalidSnapshot(_))
        ));

        let missing = SnapshotFile::load("/nonexistent/snapshot.json", FlowAggregatorConfig::default()).await;
        assert!(matches!(missing, Err(Error::Io(_))));
    }

    #[test]
    fn test_preaggregated_flow_wins() {
        let snapshot = AnalysisSnapshot {
            token: TokenSnapshot::new("MINT"),
            flow: Some(FlowWindowStats {
                buy_sell_ratio: 1.7,
                ..Default::default()
            }),
            ..Default::default()
        };
        let file = SnapshotFile::from_snapshot(snapshot, FlowAggregatorConfig::default()).unwrap();
        assert_eq!(file.flow.buy_sell_ratio, 1.0);
    }

    #[test]
    fn test_no_trades_is_default_flow() {
        let snapshot = AnalysisSnapshot {
            token: TokenSnapshot::new("MINT"),
            ..Default::default()
        };
        let file = SnapshotFile::from_snapshot(snapshot, FlowAggregatorConfig::default()).unwrap();
        assert_eq!(file.flow, FlowWindowStats::default());
    }
}
