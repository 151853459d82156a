// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod alerts;
pub mod converter;
pub mod market_indicators;
pub mod trend_analysis;

// Re-export the main Analyzer implementation for ease of use.
pub use alerts::AlertBook;
pub use market_indicators::MarketAnalyzer;
pub use trend_analysis::{Analyzer, AnalyzerImpl};
