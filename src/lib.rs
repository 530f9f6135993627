//! Dip Sentinel Library
//!
//! Decides whether a price dip in a pump.fun token is a buying opportunity or
//! a trap, from holder behavior, liquidity health and flow microstructure.

pub mod cli;
pub mod config;
pub mod dexscreener;
pub mod error;
pub mod filter;
pub mod source;
pub mod strategy;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use strategy::engine::{AnalysisEngine, AnalysisReport, EngineConfig};
pub use strategy::outcome::{Outcome, Verdict};
