//! Outcome predictor
//!
//! Final decision layer. Fuses micro and structural signals into exactly one
//! verdict, evaluated in order:
//!
//! 1. danger zone                      -> Trap
//! 2. micro >= 60 and structural >= 55 -> Opportunity
//! 3. micro < 60 and structural < 55   -> Trap
//! 4. anything else                    -> Wait
//!
//! Each verdict carries its own confidence rule, expected dip depth and
//! entry band relative to the current price.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::strategy::microstructure::MicrostructureSignals;
use crate::strategy::series::{clamp_finite, clamp_score, sanitize};
use crate::strategy::structural::StructuralSignals;

/// Final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Opportunity,
    Trap,
    Wait,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Opportunity => write!(f, "OPPORTUNITY"),
            Verdict::Trap => write!(f, "TRAP"),
            Verdict::Wait => write!(f, "WAIT"),
        }
    }
}

/// Risk label attached to a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Price multipliers for an entry band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandMultipliers {
    pub lower: f64,
    pub upper: f64,
    pub optimal: f64,
}

impl BandMultipliers {
    pub const fn new(lower: f64, upper: f64, optimal: f64) -> Self {
        Self {
            lower,
            upper,
            optimal,
        }
    }
}

/// Recommended entry price band
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryBand {
    pub lower: f64,
    pub upper: f64,
    pub optimal: f64,
}

impl EntryBand {
    /// Band around `price`; all zeros when the price is unusable
    pub fn around(price: f64, band: &BandMultipliers) -> Self {
        if !price.is_finite() || price <= 0.0 {
            return Self::default();
        }
        Self {
            lower: sanitize(price * band.lower),
            upper: sanitize(price * band.upper),
            optimal: sanitize(price * band.optimal),
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}

/// Final outcome of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub verdict: Verdict,
    pub is_dip_opportunity: bool,
    pub is_trap: bool,
    /// 0-100
    pub confidence: f64,
    /// Expected further dip, percent
    pub expected_dip_pct: f64,
    pub entry_band: EntryBand,
    /// 0-100, rounded
    pub combined_score: f64,
    pub risk_level: RiskLevel,
    pub micro_score: f64,
    pub structural_score: f64,
    pub reasons: Vec<String>,
}

/// Outcome thresholds, weights and bands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    pub opportunity_micro_min: f64,
    pub opportunity_structural_min: f64,

    pub micro_weight: f64,
    pub structural_weight: f64,
    /// Weight of the volatility stability term (1 - |trend|) * 100
    pub stability_weight: f64,

    pub danger_dip_base: f64,
    pub danger_dip_max_extra: f64,
    pub danger_band: BandMultipliers,

    pub opportunity_confidence_floor: f64,
    pub opportunity_dip_base: f64,
    pub opportunity_dip_volatility_cap: f64,
    pub opportunity_band: BandMultipliers,

    pub trap_confidence_floor: f64,
    pub trap_dip: f64,
    pub trap_band: BandMultipliers,

    pub wait_confidence_factor: f64,
    pub wait_dip: f64,
    pub wait_band: BandMultipliers,

    /// Danger risk score above this is high risk even outside the zone
    pub high_risk_danger_score: f64,
    /// Combined score above this is low risk
    pub low_risk_combined_min: f64,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            opportunity_micro_min: 60.0,
            opportunity_structural_min: 55.0,
            micro_weight: 0.45,
            structural_weight: 0.45,
            stability_weight: 0.10,
            danger_dip_base: 20.0,
            danger_dip_max_extra: 40.0,
            danger_band: BandMultipliers::new(0.65, 0.9, 0.8),
            opportunity_confidence_floor: 60.0,
            opportunity_dip_base: 3.0,
            opportunity_dip_volatility_cap: 10.0,
            opportunity_band: BandMultipliers::new(0.92, 1.02, 0.98),
            trap_confidence_floor: 55.0,
            trap_dip: 12.0,
            trap_band: BandMultipliers::new(0.75, 0.95, 0.85),
            wait_confidence_factor: 0.7,
            wait_dip: 8.0,
            wait_band: BandMultipliers::new(0.85, 1.0, 0.92),
            high_risk_danger_score: 50.0,
            low_risk_combined_min: 70.0,
        }
    }
}

/// Outcome predictor
#[derive(Debug, Clone, Default)]
pub struct OutcomePredictor {
    config: OutcomeConfig,
}

impl OutcomePredictor {
    pub fn new(config: OutcomeConfig) -> Self {
        Self { config }
    }

    /// Rounded weighted fusion of micro, structural and volatility stability
    pub fn combined_score(&self, micro_score: f64, structural_score: f64, volatility_trend: f64) -> f64 {
        let c = &self.config;
        let stability = (1.0 - sanitize(volatility_trend).abs()).max(0.0) * 100.0;
        clamp_score(
            sanitize(micro_score) * c.micro_weight
                + sanitize(structural_score) * c.structural_weight
                + stability * c.stability_weight,
        )
        .round()
    }

    pub fn predict(
        &self,
        current_price: f64,
        micro: &MicrostructureSignals,
        structural: &StructuralSignals,
    ) -> Outcome {
        let c = &self.config;
        let micro_score = clamp_score(micro.micro_score);
        let structural_score = clamp_score(structural.structural_score);
        let danger_risk = structural.danger_risk_score();
        let in_danger_zone = structural.is_danger_zone();
        let combined = self.combined_score(micro_score, structural_score, micro.volatility_trend);

        let mut reasons = Vec::new();
        let (verdict, confidence, expected_dip_pct, band) = if in_danger_zone {
            reasons.push(format!("Danger zone: red flag score {:.0}", danger_risk));
            reasons.extend(structural.danger_zone.reasons());
            (
                Verdict::Trap,
                combined.max(danger_risk),
                c.danger_dip_base + (danger_risk / 2.0).min(c.danger_dip_max_extra),
                &c.danger_band,
            )
        } else if micro_score >= c.opportunity_micro_min
            && structural_score >= c.opportunity_structural_min
        {
            reasons.push(format!(
                "Micro {:.0} and structure {:.0} both supportive",
                micro_score, structural_score
            ));
            let volatility_points = (100.0 * sanitize(micro.recent_volatility)).round();
            (
                Verdict::Opportunity,
                combined.max(c.opportunity_confidence_floor),
                c.opportunity_dip_base
                    + (c.opportunity_dip_volatility_cap - volatility_points).max(0.0),
                &c.opportunity_band,
            )
        } else if micro_score < c.opportunity_micro_min
            && structural_score < c.opportunity_structural_min
        {
            reasons.push(format!(
                "Micro {:.0} and structure {:.0} both weak",
                micro_score, structural_score
            ));
            (
                Verdict::Trap,
                combined.max(c.trap_confidence_floor),
                c.trap_dip,
                &c.trap_band,
            )
        } else {
            reasons.push(format!(
                "Mixed signals: micro {:.0}, structure {:.0}",
                micro_score, structural_score
            ));
            (
                Verdict::Wait,
                (combined * c.wait_confidence_factor).round(),
                c.wait_dip,
                &c.wait_band,
            )
        };

        if structural.exhaustion.bottom_signal {
            reasons.push("Seller exhaustion bottom signal".to_string());
        }
        if !structural.liquidity.is_healthy {
            reasons.push(format!(
                "Unhealthy liquidity (score {:.0})",
                structural.liquidity.score
            ));
        }

        let risk_level = if in_danger_zone || danger_risk > c.high_risk_danger_score {
            RiskLevel::High
        } else if combined > c.low_risk_combined_min {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        let outcome = Outcome {
            verdict,
            is_dip_opportunity: verdict == Verdict::Opportunity,
            is_trap: verdict == Verdict::Trap,
            confidence: clamp_score(confidence),
            expected_dip_pct: clamp_finite(expected_dip_pct, 0.0, 100.0),
            entry_band: EntryBand::around(current_price, band),
            combined_score: combined,
            risk_level,
            micro_score,
            structural_score,
            reasons,
        };

        info!(
            verdict = %outcome.verdict,
            confidence = outcome.confidence,
            combined = outcome.combined_score,
            risk = %outcome.risk_level,
            "Outcome predicted"
        );
        outcome
    }
}
