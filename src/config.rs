//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;
use crate::strategy::outcome::BandMultipliers;

pub use crate::dexscreener::DexScreenerConfig;
pub use crate::strategy::engine::EngineConfig;

/// Longest flow lookback accepted (30 days)
const MAX_LOOKBACK_MINUTES: i64 = 30 * 24 * 60;
/// Longest trade-pairing window accepted (one day)
const MAX_WINDOW_SECS: i64 = 24 * 60 * 60;
/// Longest retry delay or retry budget accepted (10 minutes)
const MAX_RETRY_MS: u64 = 10 * 60 * 1000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub dexscreener: DexScreenerConfig,
    #[serde(default)]
    pub sources: SourceConfig,
}

/// Settings shared by all data sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Deadline for fetching all inputs of one analysis
    #[serde(default = "default_source_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_source_timeout_ms() -> u64 {
    30_000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_source_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            .set_default("sources.timeout_ms", default_source_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SENTINEL__)
            .add_source(
                config::Environment::with_prefix("SENTINEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;

        // Sample windows
        let micro = &engine.microstructure;
        for (name, window) in [
            ("microstructure.short_window", micro.short_window),
            ("microstructure.medium_window", micro.medium_window),
            ("microstructure.long_window", micro.long_window),
            ("microstructure.volatility_window", micro.volatility_window),
            ("exhaustion.volatility_window", engine.exhaustion.volatility_window),
        ] {
            if window == 0 {
                return Err(invalid(name, "window must hold at least one sample"));
            }
        }
        if engine.bundle_detection.min_group_size < 2 {
            return Err(invalid(
                "bundle_detection.min_group_size",
                "a bundle needs at least two wallets",
            ));
        }

        // Weights
        let structural = &engine.structural;
        for (name, weight) in [
            ("structural.wallet_quality_weight", structural.wallet_quality_weight),
            ("structural.liquidity_weight", structural.liquidity_weight),
            ("structural.exhaustion_weight", structural.exhaustion_weight),
            ("structural.danger_weight", structural.danger_weight),
            ("outcome.micro_weight", engine.outcome.micro_weight),
            ("outcome.structural_weight", engine.outcome.structural_weight),
            ("outcome.stability_weight", engine.outcome.stability_weight),
            ("outcome.wait_confidence_factor", engine.outcome.wait_confidence_factor),
            ("risk_score.jeeter_risk_weight", engine.risk_score.jeeter_risk_weight),
            ("exhaustion.window_share", engine.exhaustion.window_share),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(invalid(name, "weight must be within [0, 1]"));
            }
        }

        // Thresholds
        for (name, value) in [
            ("liquidity.critical_liquidity_usd", engine.liquidity.critical_liquidity_usd),
            ("liquidity.low_liquidity_usd", engine.liquidity.low_liquidity_usd),
            ("liquidity.modest_liquidity_usd", engine.liquidity.modest_liquidity_usd),
            ("liquidity.healthy_min", engine.liquidity.healthy_min),
            ("danger_zone.low_liquidity_usd", engine.danger_zone.low_liquidity_usd),
            ("danger_zone.critical_liquidity_usd", engine.danger_zone.critical_liquidity_usd),
            ("danger_zone.danger_threshold", engine.danger_zone.danger_threshold),
            ("bundle_detection.balance_tolerance", engine.bundle_detection.balance_tolerance),
            ("bundle_detection.min_percentage", engine.bundle_detection.min_percentage),
            ("flow.large_trade_usd", engine.flow.large_trade_usd),
            ("flow.whale_trade_usd", engine.flow.whale_trade_usd),
            ("wallet_classifier.whale_min_percentage", engine.wallet_classifier.whale_min_percentage),
            ("wallet_classifier.sniper_max_hold_minutes", engine.wallet_classifier.sniper_max_hold_minutes),
            ("outcome.opportunity_micro_min", engine.outcome.opportunity_micro_min),
            ("outcome.opportunity_structural_min", engine.outcome.opportunity_structural_min),
            ("exhaustion.bottom_min_score", engine.exhaustion.bottom_min_score),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, "threshold must be a non-negative number"));
            }
        }

        // Time spans feed chrono durations, keep them within sane bounds
        for (name, value, max) in [
            ("flow.lookback_minutes", engine.flow.lookback_minutes, MAX_LOOKBACK_MINUTES),
            ("flow.front_run_window_secs", engine.flow.front_run_window_secs, MAX_WINDOW_SECS),
            ("jeeter.round_trip_window_secs", engine.jeeter.round_trip_window_secs, MAX_WINDOW_SECS),
            (
                "wallet_classifier.sniper_round_trip_window_secs",
                engine.wallet_classifier.sniper_round_trip_window_secs,
                MAX_WINDOW_SECS,
            ),
        ] {
            if !(0..=max).contains(&value) {
                return Err(invalid(name, &format!("must be within [0, {}]", max)));
            }
        }
        if engine.flow.lookback_minutes == 0 {
            return Err(invalid("flow.lookback_minutes", "lookback must be positive"));
        }

        let risk = &engine.risk_score;
        if !(risk.moderate_min <= risk.high_min && risk.high_min <= risk.critical_min) {
            anyhow::bail!("risk_score tiers must satisfy moderate_min <= high_min <= critical_min");
        }

        // Entry bands
        let outcome = &engine.outcome;
        for (name, band) in [
            ("outcome.danger_band", &outcome.danger_band),
            ("outcome.opportunity_band", &outcome.opportunity_band),
            ("outcome.trap_band", &outcome.trap_band),
            ("outcome.wait_band", &outcome.wait_band),
        ] {
            check_band(name, band)?;
        }

        // Data sources
        if self.sources.timeout_ms == 0 {
            anyhow::bail!("sources.timeout_ms must be positive");
        }
        if self.dexscreener.timeout_ms == 0 {
            anyhow::bail!("dexscreener.timeout_ms must be positive");
        }
        if self.dexscreener.retry_base_delay_ms > MAX_RETRY_MS
            || self.dexscreener.max_retry_elapsed_ms > MAX_RETRY_MS
        {
            return Err(invalid(
                "dexscreener.retry_base_delay_ms",
                &format!("retry delays must not exceed {}ms", MAX_RETRY_MS),
            ));
        }
        if self.dexscreener.base_url.trim().is_empty() {
            anyhow::bail!("dexscreener.base_url must not be empty");
        }

        Ok(())
    }

    /// Get configuration for display (query strings masked)
    pub fn masked_display(&self) -> String {
        let engine = &self.engine;
        format!(
            r#"Configuration:
  Sources:
    timeout: {}ms
  DexScreener:
    base_url: {}
    chain: {}
    preferred_dexes: {:?}
    timeout: {}ms
    retry: {}ms base, {}ms max
  Wallet classifier:
    sniper: hold < {}m, tx > {}
    whale: > {}%
  Bundles:
    enabled: {}
    balance_tolerance: {}
    min_group_size: {}
  Liquidity:
    critical/low/modest: ${} / ${} / ${}
    healthy_min: {}
  Exhaustion:
    bottom_min_score: {}
  Danger zone:
    threshold: {}
  Microstructure:
    windows: {}/{}/{}
    volatility_window: {}
  Structural:
    weights: wallet {} liquidity {} exhaustion {} danger {}
  Outcome:
    opportunity: micro >= {}, structural >= {}
    combined: micro {} structural {} stability {}
"#,
            self.sources.timeout_ms,
            mask_url(&self.dexscreener.base_url),
            self.dexscreener.chain_id,
            self.dexscreener.preferred_dex_ids,
            self.dexscreener.timeout_ms,
            self.dexscreener.retry_base_delay_ms,
            self.dexscreener.max_retry_elapsed_ms,
            engine.wallet_classifier.sniper_max_hold_minutes,
            engine.wallet_classifier.sniper_min_tx_count,
            engine.wallet_classifier.whale_min_percentage,
            engine.bundle_detection.enabled,
            engine.bundle_detection.balance_tolerance,
            engine.bundle_detection.min_group_size,
            engine.liquidity.critical_liquidity_usd,
            engine.liquidity.low_liquidity_usd,
            engine.liquidity.modest_liquidity_usd,
            engine.liquidity.healthy_min,
            engine.exhaustion.bottom_min_score,
            engine.danger_zone.danger_threshold,
            engine.microstructure.short_window,
            engine.microstructure.medium_window,
            engine.microstructure.long_window,
            engine.microstructure.volatility_window,
            engine.structural.wallet_quality_weight,
            engine.structural.liquidity_weight,
            engine.structural.exhaustion_weight,
            engine.structural.danger_weight,
            engine.outcome.opportunity_micro_min,
            engine.outcome.opportunity_structural_min,
            engine.outcome.micro_weight,
            engine.outcome.structural_weight,
            engine.outcome.stability_weight,
        )
    }
}

fn invalid(name: &str, reason: &str) -> anyhow::Error {
    Error::InvalidThreshold {
        name: name.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn check_band(name: &str, band: &BandMultipliers) -> Result<()> {
    let finite = band.lower.is_finite() && band.upper.is_finite() && band.optimal.is_finite();
    if !finite || band.lower < 0.0 {
        return Err(invalid(name, "multipliers must be non-negative numbers"));
    }
    if band.lower > band.upper {
        return Err(invalid(name, "lower multiplier exceeds upper"));
    }
    Ok(())
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}
