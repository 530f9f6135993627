//! Holder and flow analysis
//!
//! Per-wallet classification, jeeter scoring, coordinated-wallet detection,
//! trade flow aggregation and holder-set risk scoring.

pub mod bundled_detection;
pub mod flow;
pub mod jeeter;
pub mod risk_score;
pub mod types;
pub mod wallet_classifier;

pub use bundled_detection::{BundleDetectionConfig, BundleDetector, BundleGroup, BundleSuspicion};
pub use flow::{FlowAggregator, FlowAggregatorConfig, FlowTrade, TradeSide};
pub use jeeter::{HolderAnalysis, JeeterConfig, JeeterMetrics, JeeterScorer};
pub use risk_score::{HolderRiskReport, RiskScoreCalculator, RiskScoreConfig, RiskTier};
pub use types::{
    FlowWindowStats, HolderRecord, MevPatterns, PricePoint, TokenSnapshot, TradeEvent, WindowFlow,
};
pub use wallet_classifier::{
    CategoryCounts, WalletCategory, WalletClassification, WalletClassifier,
    WalletClassifierConfig, WalletQualityAnalysis,
};
