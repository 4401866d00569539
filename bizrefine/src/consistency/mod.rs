//! Cross-sentence consistency engine: segmentation, numeric facts, pairwise
//! scan and report.

mod aggregator;
pub mod numeric;
pub mod segmenter;
pub mod types;
pub mod utils;

pub use aggregator::{candidate_pairs, render_issues_report, ConsistencyAnalyzer};
pub use numeric::{extract_facts, NumericComparator, NumericFact, NumericMismatch, UnitKind};
pub use segmenter::segment;
pub use types::{
    is_error_sentinel, ComparisonResult, ConsistencyReport, NliLabel, NliPrediction,
    PairingStrategy, RunStats, Sentence, ERROR_SENTINEL, NO_ISSUES_REPORT,
};
