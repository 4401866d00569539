use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Sentinel that marks a `suggested_rewrite` as an error message, not a draft.
pub const ERROR_SENTINEL: &str = "Error:";

/// Report text for a document with no contradictory pairs.
pub const NO_ISSUES_REPORT: &str = "No inconsistencies detected.";

/// A sentence as it appears in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Zero-based position in document order.
    pub index: usize,
    pub text: String,
    /// Byte range of `text` within the original input.
    pub position: Range<usize>,
}

/// Natural-language-inference label for an ordered sentence pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NliLabel {
    Entailment,
    Neutral,
    Contradiction,
}

impl std::fmt::Display for NliLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entailment => write!(f, "ENTAILMENT"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Contradiction => write!(f, "CONTRADICTION"),
        }
    }
}

impl NliLabel {
    /// Map a model label name onto the three-way scheme.
    ///
    /// `LABEL_n` names follow the MNLI head order used by most public checkpoints:
    /// 0 = contradiction, 1 = neutral, 2 = entailment.
    pub fn from_model_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "entailment" | "entails" | "label_2" => Some(Self::Entailment),
            "neutral" | "label_1" => Some(Self::Neutral),
            "contradiction" | "contradicts" | "label_0" => Some(Self::Contradiction),
            _ => None,
        }
    }
}

/// Output of a single classifier call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NliPrediction {
    pub label: NliLabel,
    /// Confidence for `label`, clamped to `[0, 1]`.
    pub score: f32,
    /// Whether either sentence was cut to fit the model input.
    pub truncated: bool,
}

impl NliPrediction {
    pub fn new(label: NliLabel, score: f32) -> Self {
        Self {
            label,
            score: clamp_score(score),
            truncated: false,
        }
    }
}

pub(crate) fn clamp_score(score: f32) -> f32 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Merged verdict for one evaluated sentence pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ComparisonResult {
    /// Index of the earlier sentence.
    pub i: usize,
    /// Index of the later sentence, always greater than `i`.
    pub j: usize,
    pub sentence1: String,
    pub sentence2: String,
    pub label: NliLabel,
    /// The classifier's confidence in its own label. When the numeric check
    /// raises the pair to CONTRADICTION this still describes the classifier's
    /// NEUTRAL or ENTAILMENT answer; `numeric_flag` marks that case.
    pub score: f32,
    pub numeric_flag: bool,
    pub truncated: bool,
    pub verdict: String,
}

impl ComparisonResult {
    pub fn is_contradiction(&self) -> bool {
        self.label == NliLabel::Contradiction || self.numeric_flag
    }
}

/// How the candidate pair set was generated for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum PairingStrategy {
    /// Every pair of sentences.
    Full,
    /// Each sentence against its `window` predecessors.
    Windowed { window: usize },
}

/// Bookkeeping for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RunStats {
    pub sentences: usize,
    pub pairs_evaluated: usize,
    pub pairs_skipped: usize,
    pub contradictions: usize,
}

/// Outcome of analysing one document. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    results: Vec<ComparisonResult>,
    issues_report: String,
    suggested_rewrite: Option<String>,
    strategy: PairingStrategy,
    stats: RunStats,
}

impl ConsistencyReport {
    pub(crate) fn new(
        results: Vec<ComparisonResult>,
        issues_report: String,
        strategy: PairingStrategy,
        stats: RunStats,
    ) -> Self {
        Self {
            results,
            issues_report,
            suggested_rewrite: None,
            strategy,
            stats,
        }
    }

    /// Report for input that produced no sentences.
    pub fn empty() -> Self {
        Self::new(
            Vec::new(),
            NO_ISSUES_REPORT.to_string(),
            PairingStrategy::Full,
            RunStats::default(),
        )
    }

    /// Returns a new report carrying the rewrite outcome.
    ///
    /// Failures are stored with the `Error:` sentinel prefix so that existing
    /// presentation layers keep working.
    pub fn with_rewrite(self, outcome: std::result::Result<String, String>) -> Self {
        let suggested_rewrite = Some(match outcome {
            Ok(draft) => draft,
            Err(message) => format!("{ERROR_SENTINEL} {message}"),
        });
        Self {
            suggested_rewrite,
            ..self
        }
    }

    pub fn results(&self) -> &[ComparisonResult] {
        &self.results
    }

    pub fn contradictions(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.results.iter().filter(|r| r.is_contradiction())
    }

    pub fn has_contradictions(&self) -> bool {
        self.results.iter().any(ComparisonResult::is_contradiction)
    }

    pub fn issues_report(&self) -> &str {
        &self.issues_report
    }

    pub fn suggested_rewrite(&self) -> Option<&str> {
        self.suggested_rewrite.as_deref()
    }

    /// A draft the user could accept; sentinel-prefixed values do not count.
    pub fn usable_rewrite(&self) -> Option<&str> {
        self.suggested_rewrite
            .as_deref()
            .filter(|draft| !is_error_sentinel(draft))
    }

    pub fn strategy(&self) -> PairingStrategy {
        self.strategy
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}

pub fn is_error_sentinel(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_SENTINEL)
}
