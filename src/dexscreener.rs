// DexScreener API client for token snapshots and coarse flow stats
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::types::{FlowWindowStats, TokenSnapshot, WindowFlow};
use crate::source::{FlowSource, TokenSource};

/// DexScreener client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DexScreenerConfig {
    pub base_url: String,
    /// Pairs on other chains are ignored
    pub chain_id: String,
    /// DEX ids preferred when a token has several pairs, best first
    pub preferred_dex_ids: Vec<String>,
    pub timeout_ms: u64,
    pub retry_base_delay_ms: u64,
    /// Give up retrying after this long
    pub max_retry_elapsed_ms: u64,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com".to_string(),
            chain_id: "solana".to_string(),
            preferred_dex_ids: vec!["pumpswap".to_string(), "pumpfun".to_string()],
            timeout_ms: 10_000,
            retry_base_delay_ms: 250,
            max_retry_elapsed_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Txns {
    pub m5: Option<TxnCount>,
    pub h1: Option<TxnCount>,
    pub h6: Option<TxnCount>,
    pub h24: Option<TxnCount>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TxnCount {
    pub buys: u32,
    pub sells: u32,
}

impl TxnCount {
    pub fn total(&self) -> u32 {
        self.buys + self.sells
    }

    /// Buy share of transaction count, 0.5 without trades
    pub fn buy_ratio(&self) -> f64 {
        if self.total() == 0 {
            0.5
        } else {
            self.buys as f64 / self.total() as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
    pub base: Option<f64>,
    pub quote: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub m5: Option<f64>,
    pub h1: Option<f64>,
    pub h6: Option<f64>,
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexPair {
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "dexId")]
    pub dex_id: String,
    pub url: Option<String>,
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
    #[serde(rename = "baseToken")]
    pub base_token: BaseToken,
    #[serde(rename = "priceUsd")]
    pub price_usd: Option<String>,
    pub txns: Option<Txns>,
    pub volume: Option<Volume>,
    pub liquidity: Option<Liquidity>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "fdv")]
    pub fdv: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairsResponse {
    pub pairs: Option<Vec<DexPair>>,
}

impl DexPair {
    fn txn(&self, pick: fn(&Txns) -> Option<TxnCount>) -> TxnCount {
        self.txns.as_ref().and_then(pick).unwrap_or_default()
    }

    fn volume(&self, pick: fn(&Volume) -> Option<f64>) -> f64 {
        self.volume.as_ref().and_then(pick).unwrap_or(0.0)
    }

    /// Token snapshot; market cap falls back to FDV
    pub fn to_snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            address: self.base_token.address.clone(),
            symbol: self.base_token.symbol.clone(),
            name: self.base_token.name.clone(),
            market_cap_usd: self.market_cap.or(self.fdv).unwrap_or(0.0),
            price_usd: self
                .price_usd
                .as_ref()
                .and_then(|p| p.parse::<f64>().ok())
                .unwrap_or(0.0),
            liquidity_usd: self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0),
            ..TokenSnapshot::new(self.base_token.address.clone())
        }
    }

    /// Coarse flow stats from transaction counts and volumes.
    ///
    /// Ratios are count shares, not volume shares. There is no 15m window,
    /// so it is interpolated between m5 and h1. Large-trade, whale and MEV
    /// figures are unknown and stay at zero.
    pub fn to_flow(&self) -> FlowWindowStats {
        let m5 = self.txn(|t| t.m5);
        let h1 = self.txn(|t| t.h1);
        let h24 = self.txn(|t| t.h24);
        let m5_volume = self.volume(|v| v.m5);
        let h1_volume = self.volume(|v| v.h1);
        let h24_volume = self.volume(|v| v.h24);

        let m5_ratio = m5.buy_ratio();
        let h1_ratio = h1.buy_ratio();
        let m15_ratio = if m5.total() == 0 {
            h1_ratio
        } else if h1.total() == 0 {
            m5_ratio
        } else {
            m5_ratio + (h1_ratio - m5_ratio) * (10.0 / 55.0)
        };
        let m15_volume = (m5_volume * 3.0).min(h1_volume.max(m5_volume));

        let overall = if h24.total() > 0 { h24.buy_ratio() } else { h1_ratio };
        let (transactions_per_minute, average_transaction_size_usd) = if h1.total() > 0 {
            (h1.total() as f64 / 60.0, h1_volume / h1.total() as f64)
        } else {
            (0.0, 0.0)
        };

        FlowWindowStats {
            buy_volume_usd: h24_volume * overall,
            sell_volume_usd: h24_volume * (1.0 - overall),
            buy_sell_ratio: overall,
            m5: WindowFlow::new(m5_ratio, m5_volume),
            m15: WindowFlow::new(m15_ratio, m15_volume),
            h1: WindowFlow::new(h1_ratio, h1_volume),
            h24: WindowFlow::new(h24.buy_ratio(), h24_volume),
            transactions_per_minute,
            average_transaction_size_usd,
            ..Default::default()
        }
        .normalized()
    }
}

pub struct DexScreenerClient {
    client: reqwest::Client,
    config: DexScreenerConfig,
}

impl DexScreenerClient {
    pub fn new(config: DexScreenerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DexScreenerConfig {
        &self.config
    }

    /// Fetch the preferred pair for a token, retrying transient failures
    pub async fn get_token_pair(&self, mint: &str) -> Result<Option<DexPair>> {
        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(self.config.retry_base_delay_ms),
            max_interval: Duration::from_millis(self.config.retry_base_delay_ms.saturating_mul(8)),
            max_elapsed_time: Some(Duration::from_millis(self.config.max_retry_elapsed_ms)),
            ..Default::default()
        };

        let pairs = retry(backoff, || async {
            match self.fetch_pairs(mint).await {
                Ok(pairs) => Ok(pairs),
                Err(e) if e.is_retryable() => {
                    warn!(mint, error = %e, "Retryable DexScreener error");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await?;

        Ok(self.select_pair(pairs))
    }

    /// Single request
    async fn fetch_pairs(&self, mint: &str) -> Result<Vec<DexPair>> {
        let url = format!("{}/latest/dex/tokens/{}", self.config.base_url, mint);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::MarketDataTimeout(self.config.timeout_ms)
            } else {
                Error::from(e)
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let message = format!("HTTP {} for {}", status, mint);
            return if status.is_server_error() {
                Err(Error::MarketData(message))
            } else {
                Err(Error::MarketDataRejected(message))
            };
        }

        let data: TokenPairsResponse = resp.json().await?;
        let pairs = data.pairs.unwrap_or_default();
        debug!(mint, pairs = pairs.len(), "DexScreener pairs fetched");
        Ok(pairs)
    }

    /// Prefer configured DEXes on the configured chain, then the first pair
    fn select_pair(&self, pairs: Vec<DexPair>) -> Option<DexPair> {
        let on_chain: Vec<DexPair> = pairs
            .into_iter()
            .filter(|p| p.chain_id == self.config.chain_id)
            .collect();
        self.config
            .preferred_dex_ids
            .iter()
            .find_map(|dex| on_chain.iter().find(|p| &p.dex_id == dex))
            .or_else(|| on_chain.first())
            .cloned()
    }
}

#[async_trait]
impl TokenSource for DexScreenerClient {
    async fn fetch_token(&self, mint: &str) -> Result<Option<TokenSnapshot>> {
        Ok(self.get_token_pair(mint).await?.map(|p| p.to_snapshot()))
    }
}

#[async_trait]
impl FlowSource for DexScreenerClient {
    async fn fetch_flow(&self, mint: &str) -> Result<FlowWindowStats> {
        match self.get_token_pair(mint).await? {
            Some(pair) => Ok(pair.to_flow()),
            None => Err(Error::TokenNotFound(mint.to_string())),
        }
    }
}
