//! Token-level signals and the decision layer
//!
//! ## Signals
//! - `series` - Momentum, volatility and NaN guards over price series
//! - `liquidity` - Pool depth and pool-to-valuation health
//! - `exhaustion` - Seller capitulation patterns
//! - `danger_zone` - Red flag aggregation
//! - `microstructure` - Short-horizon momentum, flow and bot activity
//!
//! ## Decision
//! - `structural` - Fused structural health score
//! - `outcome` - Opportunity / trap / wait verdict with entry band
//! - `engine` - Pipeline coordinator and audit report

// Shared math
pub mod series;

// Signals
pub mod danger_zone;
pub mod exhaustion;
pub mod liquidity;
pub mod microstructure;

// Decision
pub mod engine;
pub mod outcome;
pub mod structural;

// Re-exports
pub use danger_zone::{DangerZoneConfig, RedFlag, RedFlagAggregator, RedFlagSignals, RedFlags};
pub use engine::{AnalysisEngine, AnalysisReport, EngineConfig};
pub use exhaustion::{ExhaustionConfig, SellerExhaustionDetector, SellerExhaustionSignals};
pub use liquidity::{LiquidityHealthConfig, LiquidityHealthScorer, LiquidityHealthSignals};
pub use microstructure::{
    MicroScoreTerms, MicrostructureConfig, MicrostructureSignalEngine, MicrostructureSignals,
};
pub use outcome::{
    BandMultipliers, EntryBand, Outcome, OutcomeConfig, OutcomePredictor, RiskLevel, Verdict,
};
pub use series::sanitize;
pub use structural::{StructuralConfig, StructuralHealthEngine, StructuralSignals};
