//! Structural health
//!
//! Runs the holder, liquidity, exhaustion and danger zone checks over the
//! same inputs and fuses them into one structural score.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::types::{FlowWindowStats, HolderRecord, PricePoint, TokenSnapshot};
use crate::filter::wallet_classifier::{WalletClassifier, WalletQualityAnalysis};
use crate::strategy::danger_zone::{RedFlagAggregator, RedFlagSignals};
use crate::strategy::exhaustion::{SellerExhaustionDetector, SellerExhaustionSignals};
use crate::strategy::liquidity::{LiquidityHealthScorer, LiquidityHealthSignals};
use crate::strategy::series::{clamp_score, sanitize};

/// Structural signals for one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralSignals {
    pub wallet_quality: WalletQualityAnalysis,
    pub liquidity: LiquidityHealthSignals,
    pub exhaustion: SellerExhaustionSignals,
    pub danger_zone: RedFlagSignals,
    /// 0-100
    pub structural_score: f64,
}

impl StructuralSignals {
    pub fn is_danger_zone(&self) -> bool {
        self.danger_zone.is_danger_zone
    }

    pub fn danger_risk_score(&self) -> f64 {
        sanitize(self.danger_zone.risk_score)
    }
}

/// Weights of the structural score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralConfig {
    pub base_score: f64,
    pub wallet_quality_weight: f64,
    pub liquidity_weight: f64,
    pub exhaustion_weight: f64,
    pub danger_weight: f64,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            base_score: 50.0,
            wallet_quality_weight: 0.3,
            liquidity_weight: 0.3,
            exhaustion_weight: 0.25,
            danger_weight: 0.4,
        }
    }
}

impl StructuralConfig {
    /// Weighted fusion of the component scores, NaN components count as 0
    pub fn fuse(
        &self,
        wallet_quality: f64,
        liquidity: f64,
        exhaustion: f64,
        danger_risk: f64,
    ) -> f64 {
        clamp_score(
            self.base_score + self.wallet_quality_weight * sanitize(wallet_quality)
                + self.liquidity_weight * sanitize(liquidity)
                + self.exhaustion_weight * sanitize(exhaustion)
                - self.danger_weight * sanitize(danger_risk),
        )
    }
}

/// Structural health engine
#[derive(Debug, Clone, Default)]
pub struct StructuralHealthEngine {
    config: StructuralConfig,
    classifier: WalletClassifier,
    liquidity: LiquidityHealthScorer,
    exhaustion: SellerExhaustionDetector,
    danger_zone: RedFlagAggregator,
}

impl StructuralHealthEngine {
    pub fn new(
        config: StructuralConfig,
        classifier: WalletClassifier,
        liquidity: LiquidityHealthScorer,
        exhaustion: SellerExhaustionDetector,
        danger_zone: RedFlagAggregator,
    ) -> Self {
        Self {
            config,
            classifier,
            liquidity,
            exhaustion,
            danger_zone,
        }
    }

    pub fn compute(
        &self,
        holders: &[HolderRecord],
        flow: &FlowWindowStats,
        token: &TokenSnapshot,
        prices: &[PricePoint],
    ) -> StructuralSignals {
        let flow = flow.clone().normalized();
        let wallet_quality = self.classifier.analyze_quality(holders);
        let liquidity = self.liquidity.score(token);
        let exhaustion = self.exhaustion.detect(&flow, prices);
        let danger_zone = self.danger_zone.detect(&flow, &wallet_quality, token);

        let structural_score = self.config.fuse(
            wallet_quality.overall_quality_score,
            liquidity.score,
            exhaustion.score,
            danger_zone.risk_score,
        );

        debug!(
            mint = %token.address,
            wallet_quality = wallet_quality.overall_quality_score,
            lp_health = liquidity.score,
            exhaustion = exhaustion.score,
            danger = danger_zone.risk_score,
            structural_score,
            "Structural health computed"
        );

        StructuralSignals {
            wallet_quality,
            liquidity,
            exhaustion,
            danger_zone,
            structural_score,
        }
    }
}
