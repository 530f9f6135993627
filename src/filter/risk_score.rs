//! Holder-set risk scoring
//!
//! Jeeter risk (0-100) from seven independently capped point buckets, a
//! risk tier, and an overall investability score in which jeeter risk is
//! the dominant term.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::filter::bundled_detection::BundleGroup;
use crate::filter::jeeter::{HolderAnalysis, JeeterMetrics, JeeterScorer};
use crate::filter::types::{FlowWindowStats, HolderRecord};
use crate::strategy::series::{clamp_score, sanitize};

/// One step of a threshold table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointTier {
    pub threshold: f64,
    pub points: f64,
}

const fn tier(threshold: f64, points: f64) -> PointTier {
    PointTier { threshold, points }
}

/// Points of the first tier whose threshold `value` exceeds
pub fn points_above(value: f64, tiers: &[PointTier]) -> f64 {
    let value = sanitize(value);
    tiers
        .iter()
        .find(|t| value > t.threshold)
        .map(|t| t.points)
        .unwrap_or(0.0)
}

/// Points of the first tier whose threshold `value` is under
pub fn points_below(value: f64, tiers: &[PointTier]) -> f64 {
    let value = sanitize(value);
    tiers
        .iter()
        .find(|t| value < t.threshold)
        .map(|t| t.points)
        .unwrap_or(0.0)
}

/// Risk score configuration. Tables are evaluated top-down, first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScoreConfig {
    /// Average hold time (minutes), lower is riskier
    pub hold_time_tiers: Vec<PointTier>,
    /// Round-tripper percentage
    pub round_tripper_tiers: Vec<PointTier>,
    /// Bot-like holder percentage
    pub bot_tiers: Vec<PointTier>,
    /// Top-10 sell velocity
    pub sell_velocity_tiers: Vec<PointTier>,
    /// Top-10 concentration
    pub concentration_tiers: Vec<PointTier>,
    /// Churn rate
    pub churn_tiers: Vec<PointTier>,
    /// Flow buy share, lower is riskier
    pub buy_sell_tiers: Vec<PointTier>,

    pub moderate_min: f64,
    pub high_min: f64,
    pub critical_min: f64,

    /// Multiplier applied to jeeter risk before any other deduction
    pub jeeter_risk_weight: f64,
    pub concentration_penalties: Vec<PointTier>,
    pub jeeter_pct_penalties: Vec<PointTier>,
    /// Bonus when both concentration and jeeter% are under `clean_max_pct`
    pub clean_bonus: f64,
    pub clean_max_pct: f64,
}

impl Default for RiskScoreConfig {
    fn default() -> Self {
        Self {
            hold_time_tiers: vec![tier(5.0, 20.0), tier(30.0, 15.0), tier(60.0, 10.0), tier(120.0, 5.0)],
            round_tripper_tiers: vec![tier(60.0, 20.0), tier(40.0, 15.0), tier(20.0, 10.0), tier(10.0, 5.0)],
            bot_tiers: vec![tier(20.0, 15.0), tier(10.0, 10.0), tier(5.0, 5.0)],
            sell_velocity_tiers: vec![tier(70.0, 15.0), tier(50.0, 12.0), tier(30.0, 8.0), tier(15.0, 4.0)],
            concentration_tiers: vec![tier(50.0, 15.0), tier(30.0, 12.0), tier(20.0, 8.0), tier(10.0, 4.0)],
            churn_tiers: vec![tier(60.0, 10.0), tier(40.0, 7.0), tier(20.0, 4.0), tier(10.0, 2.0)],
            buy_sell_tiers: vec![tier(0.25, 5.0), tier(0.4, 3.0), tier(0.6, 1.0)],
            moderate_min: 20.0,
            high_min: 50.0,
            critical_min: 80.0,
            jeeter_risk_weight: 0.5,
            concentration_penalties: vec![tier(50.0, 20.0), tier(30.0, 10.0), tier(20.0, 5.0)],
            jeeter_pct_penalties: vec![tier(30.0, 15.0), tier(20.0, 10.0), tier(10.0, 5.0)],
            clean_bonus: 10.0,
            clean_max_pct: 10.0,
        }
    }
}

/// Descriptive jeeter risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Moderate => write!(f, "Moderate"),
            RiskTier::High => write!(f, "High"),
            RiskTier::Critical => write!(f, "Critical"),
        }
    }
}

/// Full holder-set risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderRiskReport {
    pub analysis: HolderAnalysis,
    pub metrics: JeeterMetrics,
    pub jeeter_risk_score: f64,
    pub risk_tier: RiskTier,
    pub overall_score: f64,
    pub recommendations: Vec<String>,
}

/// Risk score calculator
#[derive(Debug, Clone, Default)]
pub struct RiskScoreCalculator {
    config: RiskScoreConfig,
    jeeters: JeeterScorer,
}

impl RiskScoreCalculator {
    pub fn new(config: RiskScoreConfig, jeeters: JeeterScorer) -> Self {
        Self { config, jeeters }
    }

    /// Jeeter risk score, 0-100
    pub fn jeeter_risk_score(&self, analysis: &HolderAnalysis, metrics: &JeeterMetrics) -> f64 {
        let c = &self.config;
        let hold = metrics
            .avg_hold_time_minutes
            .map(|h| points_below(h, &c.hold_time_tiers))
            .unwrap_or(0.0);

        let buckets = [
            hold,
            points_above(metrics.round_tripper_pct, &c.round_tripper_tiers),
            points_above(metrics.bot_like_pct, &c.bot_tiers),
            points_above(metrics.top10_sell_velocity, &c.sell_velocity_tiers),
            points_above(analysis.top10_concentration, &c.concentration_tiers),
            points_above(metrics.churn_rate, &c.churn_tiers),
            points_below(metrics.buy_sell_ratio, &c.buy_sell_tiers),
        ];
        clamp_score(buckets.iter().sum())
    }

    /// Map a jeeter risk score to its tier
    pub fn risk_tier(&self, score: f64) -> RiskTier {
        let score = sanitize(score);
        if score >= self.config.critical_min {
            RiskTier::Critical
        } else if score >= self.config.high_min {
            RiskTier::High
        } else if score >= self.config.moderate_min {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    /// Overall investability score, 0-100.
    ///
    /// Uses `analysis.jeeter_risk_score`, so compute that first.
    pub fn overall_score(&self, analysis: &HolderAnalysis) -> f64 {
        let c = &self.config;
        let concentration = sanitize(analysis.top10_concentration);
        let jeeter_pct = sanitize(analysis.jeeter_percentage);

        let mut score = 100.0 - c.jeeter_risk_weight * sanitize(analysis.jeeter_risk_score);
        score -= points_above(concentration, &c.concentration_penalties);
        score -= points_above(jeeter_pct, &c.jeeter_pct_penalties);
        if concentration < c.clean_max_pct && jeeter_pct < c.clean_max_pct {
            score += c.clean_bonus;
        }
        clamp_score(score)
    }

    /// Enrich the holder set with jeeter and bundle flags, then run the full
    /// assessment. Already-enriched records pass through unchanged.
    pub fn assess(
        &self,
        holders: &[HolderRecord],
        bundles: &[BundleGroup],
        flow: &FlowWindowStats,
    ) -> HolderRiskReport {
        let holders = self.jeeters.enrich(holders, bundles);
        let mut analysis = HolderAnalysis::from_holders(&holders, &self.jeeters);
        let metrics = JeeterMetrics::from_holders(&holders, flow, self.jeeters.config());

        let jeeter_risk_score = self.jeeter_risk_score(&analysis, &metrics);
        analysis.jeeter_risk_score = jeeter_risk_score;
        let risk_tier = self.risk_tier(jeeter_risk_score);
        let overall_score = self.overall_score(&analysis);
        let recommendations = self.recommendations(&analysis, &metrics, risk_tier);

        debug!(
            holders = analysis.total_holders,
            jeeter_risk = jeeter_risk_score,
            tier = %risk_tier,
            overall = overall_score,
            "Holder risk assessed"
        );

        HolderRiskReport {
            analysis,
            metrics,
            jeeter_risk_score,
            risk_tier,
            overall_score,
            recommendations,
        }
    }

    fn recommendations(
        &self,
        analysis: &HolderAnalysis,
        metrics: &JeeterMetrics,
        tier: RiskTier,
    ) -> Vec<String> {
        let mut out = Vec::new();

        if analysis.total_holders == 0 {
            out.push("No holder data - cannot assess holder risk".to_string());
            return out;
        }

        match tier {
            RiskTier::Critical => {
                out.push("Critical jeeter risk - avoid entry, expect rapid dumps".to_string())
            }
            RiskTier::High => {
                out.push("High jeeter risk - small size only, take profits quickly".to_string())
            }
            RiskTier::Moderate => {
                out.push("Moderate jeeter risk - use tight stops".to_string())
            }
            RiskTier::Low => out.push("Low jeeter risk - holder base looks patient".to_string()),
        }

        if analysis.top10_concentration > 50.0 {
            out.push(format!(
                "Top holders control {:.1}% of supply - watch for coordinated exits",
                analysis.top10_concentration
            ));
        }
        if analysis.jeeter_percentage > 20.0 {
            out.push(format!(
                "{:.0}% of holders are jeeters - expect sell pressure on every pump",
                analysis.jeeter_percentage
            ));
        }
        if analysis.bundled_wallets > 0 {
            out.push(format!(
                "{} wallets belong to balance bundles - likely one actor",
                analysis.bundled_wallets
            ));
        }
        if let Some(hold) = metrics.avg_hold_time_minutes {
            if hold < 30.0 {
                out.push(format!("Average hold time only {:.0} min", hold));
            }
        }
        if metrics.buy_sell_ratio < 0.4 {
            out.push("Sellers dominate recent flow - wait for selling to exhaust".to_string());
        }
        out
    }
}
