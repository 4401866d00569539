use futures::{stream, StreamExt};
use tracing::Instrument;
use uuid::Uuid;

use super::numeric::{NumericComparator, NumericMismatch, NumericProfile};
use super::segmenter::segment;
use super::types::{
    ComparisonResult, ConsistencyReport, NliLabel, NliPrediction, PairingStrategy, RunStats,
    Sentence, NO_ISSUES_REPORT,
};
use crate::classifier::ClassifierAdapter;
use crate::config::ConsistencyConfig;
use crate::error::{RefineError, Result};

const REPORT_HEADING: &str = "Inconsistencies detected:";

/// Runs the pairwise scan over one document.
///
/// Holds no per-document state; one analyzer serves every request.
#[derive(Clone)]
pub struct ConsistencyAnalyzer {
    classifier: ClassifierAdapter,
    numeric: NumericComparator,
    config: ConsistencyConfig,
}

impl ConsistencyAnalyzer {
    pub fn new(classifier: ClassifierAdapter, config: ConsistencyConfig) -> Self {
        Self {
            classifier,
            numeric: NumericComparator::new(config.numeric.clone()),
            config,
        }
    }

    pub fn classifier(&self) -> &ClassifierAdapter {
        &self.classifier
    }

    /// Pairing mode for a document of `sentences` sentences.
    pub fn strategy_for(&self, sentences: usize) -> PairingStrategy {
        if sentences <= self.config.full_scan_limit {
            PairingStrategy::Full
        } else {
            PairingStrategy::Windowed {
                window: self.config.window_size.max(1),
            }
        }
    }

    /// Segment `text`, evaluate every candidate pair and build the report.
    ///
    /// Pairs whose classification fails are logged and left out. The run only
    /// fails when every pair failed.
    pub async fn analyze(&self, text: &str) -> Result<ConsistencyReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("consistency_run", %run_id);
        self.analyze_sentences(segment(text)).instrument(span).await
    }

    async fn analyze_sentences(&self, sentences: Vec<Sentence>) -> Result<ConsistencyReport> {
        if sentences.len() < 2 {
            tracing::debug!(sentences = sentences.len(), "Nothing to compare");
            return Ok(ConsistencyReport::new(
                Vec::new(),
                NO_ISSUES_REPORT.to_string(),
                PairingStrategy::Full,
                RunStats {
                    sentences: sentences.len(),
                    ..RunStats::default()
                },
            ));
        }

        let strategy = self.strategy_for(sentences.len());
        let pairs = candidate_pairs(sentences.len(), strategy);
        let total = pairs.len();
        tracing::info!(
            sentences = sentences.len(),
            pairs = total,
            ?strategy,
            backend = self.classifier.backend_name(),
            "Starting consistency scan"
        );

        let profiles: Vec<NumericProfile> = sentences
            .iter()
            .map(|s| NumericProfile::of(&s.text))
            .collect();

        let outcomes: Vec<(usize, usize, Result<NliPrediction>)> = stream::iter(pairs)
            .map(|(i, j)| {
                let classifier = &self.classifier;
                let (a, b) = (&sentences[i].text, &sentences[j].text);
                async move { (i, j, classifier.classify(a, b).await) }
            })
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;

        let mut results = Vec::with_capacity(total);
        let mut last_error = None;
        for (i, j, outcome) in outcomes {
            match outcome {
                Ok(prediction) => {
                    let mismatch = self.numeric.compare(&profiles[i], &profiles[j]);
                    results.push(self.merge(&sentences[i], &sentences[j], prediction, mismatch));
                }
                Err(e) => {
                    tracing::warn!(
                        pair_i = i,
                        pair_j = j,
                        backend = self.classifier.backend_name(),
                        error = %e,
                        "Skipping pair after classifier failure"
                    );
                    last_error = Some(e);
                }
            }
        }

        if results.is_empty() {
            if let Some(e) = last_error {
                tracing::error!(pairs = total, "Classifier failed on every pair");
                return Err(RefineError::ClassifierUnavailable(format!(
                    "all {total} sentence pairs failed, last error: {e}"
                )));
            }
        }

        results.sort_by_key(|r| (r.i, r.j));

        let stats = RunStats {
            sentences: sentences.len(),
            pairs_evaluated: results.len(),
            pairs_skipped: total - results.len(),
            contradictions: results.iter().filter(|r| r.is_contradiction()).count(),
        };
        tracing::info!(
            evaluated = stats.pairs_evaluated,
            skipped = stats.pairs_skipped,
            contradictions = stats.contradictions,
            "Consistency scan finished"
        );

        let issues_report = render_issues_report(&results);
        Ok(ConsistencyReport::new(
            results,
            issues_report,
            strategy,
            stats,
        ))
    }

    fn merge(
        &self,
        first: &Sentence,
        second: &Sentence,
        prediction: NliPrediction,
        mismatch: Option<NumericMismatch>,
    ) -> ComparisonResult {
        let score = prediction.score;
        let logical =
            prediction.label == NliLabel::Contradiction && score >= self.config.confidence_threshold;

        let (label, verdict) = match (&mismatch, prediction.label) {
            (Some(m), _) => (NliLabel::Contradiction, m.verdict()),
            (None, NliLabel::Contradiction) if logical => (
                NliLabel::Contradiction,
                format!("Logical contradiction (model confidence {score:.2})"),
            ),
            (None, NliLabel::Contradiction) => (
                NliLabel::Neutral,
                format!("Possible contradiction below threshold (model confidence {score:.2})"),
            ),
            (None, NliLabel::Entailment) => (
                NliLabel::Entailment,
                format!("Consistent (model confidence {score:.2})"),
            ),
            (None, NliLabel::Neutral) => (
                NliLabel::Neutral,
                format!("Neutral (model confidence {score:.2})"),
            ),
        };

        ComparisonResult {
            i: first.index,
            j: second.index,
            sentence1: first.text.clone(),
            sentence2: second.text.clone(),
            label,
            score,
            numeric_flag: mismatch.is_some(),
            truncated: prediction.truncated,
            verdict,
        }
    }
}

/// Candidate pairs in `(i, j)` lexicographic order, `i < j`, each once.
pub fn candidate_pairs(sentences: usize, strategy: PairingStrategy) -> Vec<(usize, usize)> {
    match strategy {
        PairingStrategy::Full => (0..sentences)
            .flat_map(|i| (i + 1..sentences).map(move |j| (i, j)))
            .collect(),
        PairingStrategy::Windowed { window } => (0..sentences)
            .flat_map(|i| {
                let end = sentences.min(i.saturating_add(window).saturating_add(1));
                (i + 1..end).map(move |j| (i, j))
            })
            .collect(),
    }
}

/// Human-readable list of contradictory pairs, in result order.
pub fn render_issues_report(results: &[ComparisonResult]) -> String {
    let issues: Vec<String> = results
        .iter()
        .filter(|r| r.is_contradiction())
        .map(|r| {
            format!(
                "- Sentences {} and {}: {}\n  \"{}\" vs.\n  \"{}\"",
                r.i + 1,
                r.j + 1,
                r.verdict,
                r.sentence1,
                r.sentence2
            )
        })
        .collect();

    if issues.is_empty() {
        return NO_ISSUES_REPORT.to_string();
    }
    format!("{REPORT_HEADING}\n{}", issues.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{HeuristicNli, NliBackend};
    use crate::config::ClassifierConfig;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Answers with a fixed prediction for every pair.
    struct FixedNli(NliPrediction);

    #[async_trait]
    impl NliBackend for FixedNli {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn predict(&self, _premise: &str, _hypothesis: &str) -> Result<NliPrediction> {
            Ok(self.0)
        }
    }

    struct DownNli;

    #[async_trait]
    impl NliBackend for DownNli {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn predict(&self, _premise: &str, _hypothesis: &str) -> Result<NliPrediction> {
            Err(RefineError::ClassifierUnavailable("connection refused".into()))
        }
    }

    fn analyzer_with(backend: Arc<dyn NliBackend>, config: ConsistencyConfig) -> ConsistencyAnalyzer {
        let classifier = ClassifierAdapter::new(
            backend,
            &ClassifierConfig {
                cache_size: 0,
                ..ClassifierConfig::default()
            },
        );
        ConsistencyAnalyzer::new(classifier, config)
    }

    fn analyzer(prediction: NliPrediction) -> ConsistencyAnalyzer {
        analyzer_with(Arc::new(FixedNli(prediction)), ConsistencyConfig::default())
    }

    #[test]
    fn test_full_pairs_are_lexicographic() {
        assert_eq!(
            candidate_pairs(4, PairingStrategy::Full),
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
    }

    #[test]
    fn test_windowed_pairs_are_bounded() {
        let pairs = candidate_pairs(100, PairingStrategy::Windowed { window: 10 });
        assert!(pairs.iter().all(|(i, j)| i < j && j - i <= 10));
        let unique: HashSet<_> = pairs.iter().collect();
        assert_eq!(unique.len(), pairs.len());
        // 90 sentences see a full window, the last 10 see 9..0 successors.
        assert_eq!(pairs.len(), 90 * 10 + 45);
        let mut sorted = pairs.clone();
        sorted.sort();
        assert_eq!(sorted, pairs);
    }

    #[test]
    fn test_oversized_window_covers_every_pair() {
        assert_eq!(
            candidate_pairs(5, PairingStrategy::Windowed { window: usize::MAX }),
            candidate_pairs(5, PairingStrategy::Full)
        );
    }

    #[test]
    fn test_strategy_switches_above_limit() {
        let a = analyzer(NliPrediction::new(NliLabel::Neutral, 0.9));
        assert_eq!(a.strategy_for(60), PairingStrategy::Full);
        assert_eq!(
            a.strategy_for(61),
            PairingStrategy::Windowed { window: 10 }
        );
    }

    #[tokio::test]
    async fn test_empty_document_is_clean() {
        let report = analyzer(NliPrediction::new(NliLabel::Contradiction, 0.99))
            .analyze("   ")
            .await
            .unwrap();
        assert!(report.results().is_empty());
        assert_eq!(report.issues_report(), NO_ISSUES_REPORT);
    }

    #[tokio::test]
    async fn test_numeric_flag_overrides_neutral_classifier() {
        let report = analyzer(NliPrediction::new(NliLabel::Neutral, 0.8))
            .analyze("Revenue grew 20% in Q1. Revenue grew 5% in Q1.")
            .await
            .unwrap();

        assert_eq!(report.results().len(), 1);
        let result = &report.results()[0];
        assert_eq!((result.i, result.j), (0, 1));
        assert!(result.numeric_flag);
        assert_eq!(result.label, NliLabel::Contradiction);
        assert!(result.verdict.contains("20%") && result.verdict.contains("5%"));
        assert!((result.score - 0.8).abs() < 1e-6);
        assert!(report.issues_report().starts_with(REPORT_HEADING));
    }

    #[tokio::test]
    async fn test_low_confidence_contradiction_is_downgraded() {
        let report = analyzer(NliPrediction::new(NliLabel::Contradiction, 0.3))
            .analyze("The sky is blue. Paris is the capital of France.")
            .await
            .unwrap();

        let result = &report.results()[0];
        assert_eq!(result.label, NliLabel::Neutral);
        assert_eq!(
            result.verdict,
            "Possible contradiction below threshold (model confidence 0.30)"
        );
        assert!(!report.has_contradictions());
        assert_eq!(report.issues_report(), NO_ISSUES_REPORT);
    }

    #[tokio::test]
    async fn test_confident_contradiction_is_reported() {
        let report = analyzer(NliPrediction::new(NliLabel::Contradiction, 0.93))
            .analyze("The office opens Monday. The office stays closed Monday.")
            .await
            .unwrap();

        assert_eq!(
            report.issues_report(),
            "Inconsistencies detected:\n\
             - Sentences 1 and 2: Logical contradiction (model confidence 0.93)\n  \
             \"The office opens Monday.\" vs.\n  \
             \"The office stays closed Monday.\""
        );
    }

    #[tokio::test]
    async fn test_every_contradiction_appears_in_report() {
        let text = "Revenue grew 20% in Q1. Revenue grew 5% in Q1. Revenue grew 9% in Q1.";
        let report = analyzer_with(Arc::new(HeuristicNli::new()), ConsistencyConfig::default())
            .analyze(text)
            .await
            .unwrap();

        assert_eq!(report.results().len(), 3);
        for result in report.contradictions() {
            assert!(report.issues_report().contains(&format!(
                "Sentences {} and {}",
                result.i + 1,
                result.j + 1
            )));
        }
        assert_eq!(report.stats().contradictions, 3);
    }

    #[tokio::test]
    async fn test_results_are_idempotent() {
        let a = analyzer_with(Arc::new(HeuristicNli::new()), ConsistencyConfig::default());
        let text = "Costs fell. Costs rose. The team has 12 engineers. The team has 14 engineers.";
        let first = a.analyze(text).await.unwrap();
        let second = a.analyze(text).await.unwrap();
        assert_eq!(first.results(), second.results());
        assert_eq!(first.issues_report(), second.issues_report());
    }

    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let err = analyzer_with(Arc::new(DownNli), ConsistencyConfig::default())
            .analyze("One thing. Another thing.")
            .await
            .unwrap_err();
        assert!(matches!(err, RefineError::ClassifierUnavailable(_)));
    }

    #[tokio::test]
    async fn test_windowed_scan_on_long_document() {
        let text: String = (0..70)
            .map(|n| format!("Item number{n} is listed. "))
            .collect();
        let config = ConsistencyConfig {
            window_size: 3,
            ..ConsistencyConfig::default()
        };
        let report = analyzer_with(Arc::new(HeuristicNli::new()), config)
            .analyze(&text)
            .await
            .unwrap();
        assert_eq!(report.strategy(), PairingStrategy::Windowed { window: 3 });
        assert!(report.results().iter().all(|r| r.j - r.i <= 3));
        assert_eq!(report.stats().sentences, 70);
    }
}
