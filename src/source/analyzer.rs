//! Fetch-then-analyze orchestration

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::types::{FlowWindowStats, HolderRecord, PricePoint, TokenSnapshot};
use crate::strategy::engine::{AnalysisEngine, AnalysisReport};

use super::{FlowSource, HolderSource, PriceSource, TokenSource};

/// Everything the engine needs for one token
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub token: TokenSnapshot,
    pub holders: Vec<HolderRecord>,
    pub flow: FlowWindowStats,
    pub prices: Vec<PricePoint>,
}

/// Fetches the four inputs concurrently and runs the engine
pub struct TokenAnalyzer {
    engine: AnalysisEngine,
    holders: Arc<dyn HolderSource>,
    flow: Arc<dyn FlowSource>,
    tokens: Arc<dyn TokenSource>,
    prices: Arc<dyn PriceSource>,
    timeout: Duration,
}

impl TokenAnalyzer {
    pub fn new(
        engine: AnalysisEngine,
        holders: Arc<dyn HolderSource>,
        flow: Arc<dyn FlowSource>,
        tokens: Arc<dyn TokenSource>,
        prices: Arc<dyn PriceSource>,
    ) -> Self {
        Self {
            engine,
            holders,
            flow,
            tokens,
            prices,
            timeout: Duration::from_secs(30),
        }
    }

    /// Use one source for all four inputs
    pub fn from_source<S>(engine: AnalysisEngine, source: Arc<S>) -> Self
    where
        S: HolderSource + FlowSource + TokenSource + PriceSource + 'static,
    {
        Self::new(engine, source.clone(), source.clone(), source.clone(), source)
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_flow_source(mut self, flow: Arc<dyn FlowSource>) -> Self {
        self.flow = flow;
        self
    }

    /// Overall deadline for fetching inputs
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    /// Fetch all inputs concurrently. A missing token fails here, before
    /// the engine ever runs.
    pub async fn fetch_inputs(&self, mint: &str) -> Result<AnalysisInputs> {
        let fetch = async {
            tokio::try_join!(
                self.tokens.fetch_token(mint),
                self.holders.fetch_holders(mint),
                self.flow.fetch_flow(mint),
                self.prices.fetch_prices(mint),
            )
        };

        let (token, holders, flow, mut prices) = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| {
                warn!(mint, timeout_ms = self.timeout.as_millis() as u64, "Input fetch timed out");
                Error::MarketDataTimeout(self.timeout.as_millis() as u64)
            })??;

        let token = token.ok_or_else(|| Error::TokenNotFound(mint.to_string()))?;
        prices.sort_by_key(|p| p.timestamp);

        debug!(
            mint,
            holders = holders.len(),
            prices = prices.len(),
            "Analysis inputs fetched"
        );

        Ok(AnalysisInputs {
            token,
            holders,
            flow,
            prices,
        })
    }

    pub async fn analyze(&self, mint: &str) -> Result<AnalysisReport> {
        let inputs = self.fetch_inputs(mint).await?;
        Ok(self
            .engine
            .analyze(&inputs.prices, &inputs.flow, &inputs.holders, &inputs.token))
    }
}
