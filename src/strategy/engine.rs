//! Analysis Engine
//!
//! Main coordinator for dip analysis. Owns one configured instance of every
//! scorer and sequences them: bundles and holder enrichment first, then the
//! micro and structural layers, then the outcome.
//!
//! Every method is synchronous and pure; the engine holds no per-call state
//! and can be shared across threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::filter::bundled_detection::{BundleDetectionConfig, BundleDetector, BundleGroup};
use crate::filter::flow::{FlowAggregator, FlowAggregatorConfig, FlowTrade};
use crate::filter::jeeter::{HolderAnalysis, JeeterConfig, JeeterMetrics, JeeterScorer};
use crate::filter::risk_score::{HolderRiskReport, RiskScoreCalculator, RiskScoreConfig};
use crate::filter::types::{FlowWindowStats, HolderRecord, PricePoint, TokenSnapshot};
use crate::filter::wallet_classifier::{
    WalletClassification, WalletClassifier, WalletClassifierConfig, WalletQualityAnalysis,
};

use super::danger_zone::{DangerZoneConfig, RedFlagAggregator, RedFlagSignals};
use super::exhaustion::{ExhaustionConfig, SellerExhaustionDetector, SellerExhaustionSignals};
use super::liquidity::{LiquidityHealthConfig, LiquidityHealthScorer, LiquidityHealthSignals};
use super::microstructure::{MicrostructureConfig, MicrostructureSignalEngine, MicrostructureSignals};
use super::outcome::{Outcome, OutcomeConfig, OutcomePredictor};
use super::structural::{StructuralConfig, StructuralHealthEngine, StructuralSignals};

/// Analysis engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub jeeter: JeeterConfig,
    #[serde(default)]
    pub wallet_classifier: WalletClassifierConfig,
    #[serde(default)]
    pub bundle_detection: BundleDetectionConfig,
    #[serde(default)]
    pub flow: FlowAggregatorConfig,
    #[serde(default)]
    pub liquidity: LiquidityHealthConfig,
    #[serde(default)]
    pub exhaustion: ExhaustionConfig,
    #[serde(default)]
    pub danger_zone: DangerZoneConfig,
    #[serde(default)]
    pub risk_score: RiskScoreConfig,
    #[serde(default)]
    pub microstructure: MicrostructureConfig,
    #[serde(default)]
    pub structural: StructuralConfig,
    #[serde(default)]
    pub outcome: OutcomeConfig,
}

/// Full audit record of one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub token: TokenSnapshot,
    /// Price used for the entry band
    pub current_price: f64,
    pub price_samples: usize,
    pub holder_count: usize,
    pub bundles: Vec<BundleGroup>,
    pub holder_risk: HolderRiskReport,
    pub micro: MicrostructureSignals,
    pub structural: StructuralSignals,
    pub outcome: Outcome,
}

/// Main analysis engine
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: EngineConfig,

    // Holder-level
    jeeters: JeeterScorer,
    classifier: WalletClassifier,
    bundles: BundleDetector,
    flow: FlowAggregator,
    risk: RiskScoreCalculator,

    // Token-level
    liquidity: LiquidityHealthScorer,
    exhaustion: SellerExhaustionDetector,
    danger_zone: RedFlagAggregator,
    micro: MicrostructureSignalEngine,
    structural: StructuralHealthEngine,
    outcome: OutcomePredictor,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AnalysisEngine {
    /// Create a new analysis engine
    pub fn new(config: EngineConfig) -> Self {
        let jeeters = JeeterScorer::new(config.jeeter.clone());
        let classifier = WalletClassifier::new(config.wallet_classifier.clone());
        let liquidity = LiquidityHealthScorer::new(config.liquidity.clone());
        let exhaustion = SellerExhaustionDetector::new(config.exhaustion.clone());
        let danger_zone = RedFlagAggregator::new(config.danger_zone.clone());

        Self {
            bundles: BundleDetector::new(config.bundle_detection.clone(), jeeters.clone()),
            flow: FlowAggregator::new(config.flow.clone()),
            risk: RiskScoreCalculator::new(config.risk_score.clone(), jeeters.clone()),
            micro: MicrostructureSignalEngine::new(config.microstructure.clone()),
            structural: StructuralHealthEngine::new(
                config.structural.clone(),
                classifier.clone(),
                liquidity.clone(),
                exhaustion.clone(),
                danger_zone.clone(),
            ),
            outcome: OutcomePredictor::new(config.outcome.clone()),
            jeeters,
            classifier,
            liquidity,
            exhaustion,
            danger_zone,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify one holder. Raw records are scored for jeeter activity first,
    /// so the result matches what the full pipeline sees.
    pub fn classify_wallet(&self, holder: &HolderRecord) -> WalletClassification {
        let scored = HolderRecord {
            jeeter_score: Some(self.jeeters.effective_score(holder)),
            ..holder.clone()
        };
        self.classifier.classify(&scored)
    }

    /// Wallet quality over raw or enriched holders
    pub fn analyze_wallet_quality(&self, holders: &[HolderRecord]) -> WalletQualityAnalysis {
        self.classifier.analyze_quality(&self.jeeters.enrich(holders, &[]))
    }

    pub fn detect_bundles(&self, holders: &[HolderRecord]) -> Vec<BundleGroup> {
        self.bundles.detect(holders)
    }

    /// Holder records with jeeter and bundle flags filled in
    pub fn enrich_holders(&self, holders: &[HolderRecord]) -> Vec<HolderRecord> {
        let bundles = self.bundles.detect(holders);
        self.jeeters.enrich(holders, &bundles)
    }

    /// Aggregate individual trades into flow window stats
    pub fn aggregate_flow(&self, trades: &[FlowTrade], now: DateTime<Utc>) -> FlowWindowStats {
        self.flow.aggregate(trades, now)
    }

    pub fn score_liquidity(&self, token: &TokenSnapshot) -> LiquidityHealthSignals {
        self.liquidity.score(token)
    }

    pub fn detect_seller_exhaustion(
        &self,
        flow: &FlowWindowStats,
        prices: &[PricePoint],
    ) -> SellerExhaustionSignals {
        self.exhaustion.detect(flow, prices)
    }

    pub fn detect_danger_zone(
        &self,
        flow: &FlowWindowStats,
        wallet_quality: &WalletQualityAnalysis,
        token: &TokenSnapshot,
    ) -> RedFlagSignals {
        self.danger_zone.detect(flow, wallet_quality, token)
    }

    pub fn compute_jeeter_risk_score(&self, analysis: &HolderAnalysis, metrics: &JeeterMetrics) -> f64 {
        self.risk.jeeter_risk_score(analysis, metrics)
    }

    pub fn compute_overall_score(&self, analysis: &HolderAnalysis) -> f64 {
        self.risk.overall_score(analysis)
    }

    pub fn assess_holder_risk(
        &self,
        holders: &[HolderRecord],
        bundles: &[BundleGroup],
        flow: &FlowWindowStats,
    ) -> HolderRiskReport {
        self.risk.assess(holders, bundles, flow)
    }

    pub fn compute_microstructure(
        &self,
        prices: &[PricePoint],
        flow: &FlowWindowStats,
        token: Option<&TokenSnapshot>,
    ) -> MicrostructureSignals {
        self.micro.compute(prices, flow, token)
    }

    /// Structural health over an already-enriched holder set
    pub fn compute_structural(
        &self,
        holders: &[HolderRecord],
        flow: &FlowWindowStats,
        token: &TokenSnapshot,
        prices: &[PricePoint],
    ) -> StructuralSignals {
        self.structural.compute(holders, flow, token, prices)
    }

    pub fn predict_outcome(
        &self,
        current_price: f64,
        micro: &MicrostructureSignals,
        structural: &StructuralSignals,
    ) -> Outcome {
        self.outcome.predict(current_price, micro, structural)
    }

    /// Run the whole pipeline and return only the outcome
    pub fn run_full_analysis(
        &self,
        prices: &[PricePoint],
        flow: &FlowWindowStats,
        holders: &[HolderRecord],
        token: &TokenSnapshot,
    ) -> Outcome {
        self.analyze(prices, flow, holders, token).outcome
    }

    /// Run the whole pipeline and return the full audit report
    pub fn analyze(
        &self,
        prices: &[PricePoint],
        flow: &FlowWindowStats,
        holders: &[HolderRecord],
        token: &TokenSnapshot,
    ) -> AnalysisReport {
        let flow = flow.clone().normalized();

        // 1. Coordination clusters and holder enrichment
        let bundles = self.bundles.detect(holders);
        let enriched = self.jeeters.enrich(holders, &bundles);

        // 2. Holder risk (enrichment is idempotent)
        let holder_risk = self.risk.assess(&enriched, &bundles, &flow);

        // 3. Micro and structural layers
        let micro = self.micro.compute(prices, &flow, Some(token));
        let structural = self.structural.compute(&enriched, &flow, token, prices);

        // 4. Verdict
        let current_price = current_price(token, prices);
        let outcome = self.outcome.predict(current_price, &micro, &structural);

        info!(
            mint = %token.address,
            symbol = token.display_symbol(),
            verdict = %outcome.verdict,
            confidence = outcome.confidence,
            micro = micro.micro_score,
            structural = structural.structural_score,
            bundles = bundles.len(),
            "Analysis complete"
        );

        AnalysisReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            token: token.clone(),
            current_price,
            price_samples: prices.len(),
            holder_count: holders.len(),
            bundles,
            holder_risk,
            micro,
            structural,
            outcome,
        }
    }
}

/// Snapshot price, or the last usable sample when the snapshot has none
fn current_price(token: &TokenSnapshot, prices: &[PricePoint]) -> f64 {
    if token.price_usd.is_finite() && token.price_usd > 0.0 {
        return token.price_usd;
    }
    prices
        .iter()
        .rev()
        .map(|p| p.price)
        .find(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(0.0)
}
