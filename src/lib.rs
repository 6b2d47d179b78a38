//! # Statement Ratio Analyzer
//!
//! Derives growth rates, asset-composition shares and the current (liquidity)
//! ratio from a two-period financial statement, and prepares the summary that
//! is handed to a hosted language model for a narrative assessment.
//!
//! ## Core Concepts
//!
//! - **Statement table**: ordered rows of (label, prior value, current value)
//! - **Anchor rows**: rows found by label (total assets, short-term assets,
//!   short-term liabilities) that act as denominators
//! - **Zero policy**: growth and composition replace a zero denominator with a
//!   tiny epsilon; the liquidity ratio is exactly 0 when liabilities are 0
//! - **Warnings**: a missing anchor row never aborts the analysis
//!
//! ## Example
//!
//! ```rust
//! use statement_ratio_analyzer::*;
//!
//! let table = StatementTable::new(vec![
//!     Row::new("TOTAL ASSETS", 1000.0, 1200.0),
//!     Row::new("SHORT-TERM ASSETS", 400.0, 600.0),
//!     Row::new("SHORT-TERM LIABILITIES", 200.0, 300.0),
//! ]);
//!
//! let analysis = analyze_statement(&table);
//! assert_eq!(analysis.short_term_asset_growth, Some(50.0));
//! assert_eq!(analysis.liquidity.delta(), Some(0.0));
//!
//! let payload = NarrativeRequestBuilder::new(&analysis).build();
//! assert!(payload.contains("Current ratio"));
//! ```

pub mod advisory;
pub mod anchors;
pub mod engine;
pub mod error;
pub mod formatting;
pub mod ingestion;
pub mod narrative;
pub mod schema;

#[cfg(feature = "gemini")]
pub mod llm;

pub use advisory::{
    classify_status, display_outcome, exchange, request_assessment, AdvisoryError,
    AdvisoryErrorKind, AdvisoryService, ChatMessage, ChatRole,
};
pub use anchors::{
    find_anchor, AnchorLabels, ContainsLabelMatcher, ExactLabelMatcher, LabelMatcher,
};
pub use engine::{
    growth_pct, liquidity_ratio, share_pct, AnalysisCache, RatioEngine, ZERO_DENOMINATOR_EPSILON,
};
pub use error::{AnalyzerError, Result};
pub use formatting::*;
pub use ingestion::*;
pub use narrative::NarrativeRequestBuilder;
pub use schema::*;

use log::info;
use std::path::Path;

pub struct StatementAnalyzer;

impl StatementAnalyzer {
    pub fn process(raw: &RawTable) -> Result<StatementAnalysis> {
        let table = build_statement_table(raw)?;
        Ok(Self::analyze(&table))
    }

    pub fn analyze(table: &StatementTable) -> StatementAnalysis {
        RatioEngine::default().analyze(table)
    }

    pub fn process_file(path: &Path) -> Result<StatementAnalysis> {
        info!("Loading statement from {}", path.display());
        let table = load_statement(path)?;
        Ok(Self::analyze(&table))
    }
}

pub fn analyze_statement(table: &StatementTable) -> StatementAnalysis {
    StatementAnalyzer::analyze(table)
}

pub fn process_statement(raw: &RawTable) -> Result<StatementAnalysis> {
    StatementAnalyzer::process(raw)
}
