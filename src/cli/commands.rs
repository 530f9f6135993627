//! CLI command implementations

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::dexscreener::DexScreenerClient;
use crate::source::{SnapshotFile, TokenAnalyzer};
use crate::strategy::engine::{AnalysisEngine, AnalysisReport};

/// Analyze the token in a snapshot file
pub async fn analyze(config: &Config, snapshot: &Path, live: bool, json: bool) -> Result<()> {
    let source = SnapshotFile::load(snapshot, config.engine.flow.clone())
        .await
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;
    let mint = source.mint().to_string();

    let engine = AnalysisEngine::new(config.engine.clone());
    let mut analyzer = TokenAnalyzer::from_source(engine, Arc::new(source))
        .with_timeout(Duration::from_millis(config.sources.timeout_ms));

    if live {
        info!(mint = %mint, "Using live DexScreener token and flow data");
        let client = Arc::new(
            DexScreenerClient::new(config.dexscreener.clone())
                .context("Failed to build DexScreener client")?,
        );
        analyzer = analyzer
            .with_token_source(client.clone())
            .with_flow_source(client);
    }

    let report = analyzer
        .analyze(&mint)
        .await
        .with_context(|| format!("Analysis failed for {}", mint))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", ReportSummary(&report));
    }
    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("{}", config.masked_display());
    }
    Ok(())
}

/// Human-readable verdict summary
pub struct ReportSummary<'a>(pub &'a AnalysisReport);

impl fmt::Display for ReportSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let outcome = &report.outcome;
        let micro = &report.micro;
        let structural = &report.structural;
        let risk = &report.holder_risk;
        let band = &outcome.entry_band;

        writeln!(
            f,
            "\n=== {} ({}) ===\n",
            report.token.display_symbol(),
            report.token.address
        )?;
        writeln!(
            f,
            "Verdict: {} (confidence {:.0}, risk {})",
            outcome.verdict, outcome.confidence, outcome.risk_level
        )?;
        writeln!(
            f,
            "Scores: combined {:.0} | micro {:.1} | structural {:.1}",
            outcome.combined_score, micro.micro_score, structural.structural_score
        )?;
        writeln!(f, "Expected dip: {:.1}%", outcome.expected_dip_pct)?;
        writeln!(
            f,
            "Entry band: {:.8} - {:.8} (optimal {:.8}, price {:.8})",
            band.lower, band.upper, band.optimal, report.current_price
        )?;

        writeln!(f, "\nStructure:")?;
        writeln!(
            f,
            "  Wallet quality: {:.1} ({} wallets)",
            structural.wallet_quality.overall_quality_score, structural.wallet_quality.total_wallets
        )?;
        writeln!(
            f,
            "  Liquidity: {:.0}{}",
            structural.liquidity.score,
            if structural.liquidity.is_healthy { " (healthy)" } else { "" }
        )?;
        writeln!(
            f,
            "  Seller exhaustion: {:.0}{}",
            structural.exhaustion.score,
            if structural.exhaustion.bottom_signal { " (bottom signal)" } else { "" }
        )?;
        writeln!(
            f,
            "  Red flags: {:.0}{}",
            structural.danger_risk_score(),
            if structural.is_danger_zone() { " (DANGER ZONE)" } else { "" }
        )?;
        for flag in &structural.danger_zone.triggered {
            writeln!(f, "    - {}", flag)?;
        }

        writeln!(f, "\nMicrostructure:")?;
        writeln!(
            f,
            "  Momentum 5/15/60: {:+.4} / {:+.4} / {:+.4}",
            micro.momentum_5, micro.momentum_15, micro.momentum_60
        )?;
        writeln!(
            f,
            "  Volatility: {:.4} (trend {:+.2})",
            micro.recent_volatility, micro.volatility_trend
        )?;
        writeln!(f, "  Bot activity: {:.0}", micro.bot_activity_index)?;

        writeln!(f, "\nHolders:")?;
        writeln!(
            f,
            "  {} holders, top-10 {:.1}%, jeeters {:.1}%, {} bundles",
            risk.analysis.total_holders,
            risk.analysis.top10_concentration,
            risk.analysis.jeeter_percentage,
            report.bundles.len()
        )?;
        writeln!(
            f,
            "  Jeeter risk: {:.0} ({}), overall {:.0}",
            risk.jeeter_risk_score, risk.risk_tier, risk.overall_score
        )?;
        for line in &risk.recommendations {
            writeln!(f, "    - {}", line)?;
        }

        if !outcome.reasons.is_empty() {
            writeln!(f, "\nReasons:")?;
            for reason in &outcome.reasons {
                writeln!(f, "  - {}", reason)?;
            }
        }

        Ok(())
    }
}
