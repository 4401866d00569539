use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::{HeuristicNli, NliBackend, PredictionCache, RemoteNli};
use crate::config::{ClassifierBackendKind, ClassifierConfig};
use crate::consistency::types::clamp_score;
use crate::consistency::NliPrediction;
use crate::error::{RefineError, Result};

/// Shared handle to the NLI capability.
///
/// Cloning is cheap; all clones share one semaphore, so `max_concurrency`
/// bounds the calls in flight across every request in the process.
#[derive(Clone)]
pub struct ClassifierAdapter {
    backend: Arc<dyn NliBackend>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    max_input_chars: usize,
    cache: Option<PredictionCache>,
}

impl ClassifierAdapter {
    pub fn new(backend: Arc<dyn NliBackend>, config: &ClassifierConfig) -> Self {
        Self {
            backend,
            permits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            timeout: Duration::from_secs(config.timeout_secs),
            max_input_chars: config.max_input_chars.max(1),
            cache: PredictionCache::new(config.cache_size),
        }
    }

    /// Build the backend named in `config`.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let backend: Arc<dyn NliBackend> = match config.backend {
            ClassifierBackendKind::Remote => Arc::new(RemoteNli::new(config)?),
            ClassifierBackendKind::Heuristic => Arc::new(HeuristicNli::new()),
        };
        tracing::info!(
            backend = backend.name(),
            max_concurrency = config.max_concurrency,
            timeout_secs = config.timeout_secs,
            "Classifier ready"
        );
        Ok(Self::new(backend, config))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Label the ordered pair `(premise, hypothesis)`.
    ///
    /// Transient failures get exactly one retry. After that the error is
    /// reported as `ClassifierUnavailable` or `ClassifierTimeout`.
    pub async fn classify(&self, premise: &str, hypothesis: &str) -> Result<NliPrediction> {
        let (premise, cut_premise) = truncate_chars(premise, self.max_input_chars);
        let (hypothesis, cut_hypothesis) = truncate_chars(hypothesis, self.max_input_chars);
        let truncated = cut_premise || cut_hypothesis;

        let key = self
            .cache
            .as_ref()
            .map(|_| PredictionCache::generate_key(premise, hypothesis));
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                tracing::trace!(backend = self.backend_name(), "Classifier cache hit");
                return Ok(NliPrediction { truncated, ..hit });
            }
        }

        let prediction = match self.attempt(premise, hypothesis).await {
            Ok(prediction) => prediction,
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    backend = self.backend_name(),
                    error = %e,
                    "Classifier call failed, retrying once"
                );
                self.attempt(premise, hypothesis)
                    .await
                    .map_err(into_classifier_error)?
            }
            Err(e) => return Err(into_classifier_error(e)),
        };

        let prediction = NliPrediction {
            score: clamp_score(prediction.score),
            truncated,
            ..prediction
        };

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, prediction);
        }
        Ok(prediction)
    }

    async fn attempt(&self, premise: &str, hypothesis: &str) -> Result<NliPrediction> {
        let _permit = self.permits.acquire().await.map_err(|_| {
            RefineError::ClassifierUnavailable("classifier queue is closed".to_string())
        })?;

        match tokio::time::timeout(self.timeout, self.backend.predict(premise, hypothesis)).await
        {
            Ok(result) => result,
            Err(_) => Err(RefineError::ClassifierTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

fn into_classifier_error(e: RefineError) -> RefineError {
    match e {
        RefineError::ClassifierUnavailable(_)
        | RefineError::ClassifierTimeout { .. }
        | RefineError::MalformedExternalResponse { .. } => e,
        other => RefineError::ClassifierUnavailable(other.to_string()),
    }
}

/// Keep at most `max_chars` characters, cutting from the end.
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::NliLabel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` calls, then answers NEUTRAL.
    struct FlakyNli {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NliBackend for FlakyNli {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn predict(&self, _premise: &str, _hypothesis: &str) -> Result<NliPrediction> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(RefineError::ClassifierUnavailable("connection refused".into()))
            } else {
                Ok(NliPrediction::new(NliLabel::Neutral, 0.6))
            }
        }
    }

    struct RecordingNli {
        seen: Mutex<Vec<(String, String)>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NliBackend for RecordingNli {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn predict(&self, premise: &str, hypothesis: &str) -> Result<NliPrediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((premise.to_string(), hypothesis.to_string()));
            Ok(NliPrediction::new(NliLabel::Contradiction, 0.9))
        }
    }

    struct SlowNli;

    #[async_trait]
    impl NliBackend for SlowNli {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn predict(&self, _premise: &str, _hypothesis: &str) -> Result<NliPrediction> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(NliPrediction::new(NliLabel::Neutral, 0.5))
        }
    }

    fn config() -> ClassifierConfig {
        ClassifierConfig {
            cache_size: 0,
            ..ClassifierConfig::default()
        }
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("short", 10), ("short", false));
        assert_eq!(truncate_chars("exact", 5), ("exact", false));
    }

    #[tokio::test]
    async fn test_single_retry_recovers() {
        let backend = Arc::new(FlakyNli {
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let adapter = ClassifierAdapter::new(backend.clone(), &config());
        let prediction = adapter.classify("a b", "c d").await.unwrap();
        assert_eq!(prediction.label, NliLabel::Neutral);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_one_retry() {
        let backend = Arc::new(FlakyNli {
            failures: 5,
            calls: AtomicUsize::new(0),
        });
        let adapter = ClassifierAdapter::new(backend.clone(), &config());
        let err = adapter.classify("a b", "c d").await.unwrap_err();
        assert!(matches!(err, RefineError::ClassifierUnavailable(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let adapter = ClassifierAdapter::new(Arc::new(SlowNli), &config())
            .with_timeout(Duration::from_millis(50));
        let err = adapter.classify("a", "b").await.unwrap_err();
        assert!(matches!(
            err,
            RefineError::ClassifierTimeout { timeout_ms: 50 }
        ));
    }

    #[tokio::test]
    async fn test_long_input_is_truncated_and_marked() {
        let backend = Arc::new(RecordingNli {
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        });
        let adapter = ClassifierAdapter::new(
            backend.clone(),
            &ClassifierConfig {
                max_input_chars: 8,
                ..config()
            },
        );

        let prediction = adapter
            .classify("A very long opening sentence.", "Short.")
            .await
            .unwrap();
        assert!(prediction.truncated);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0], ("A very l".to_string(), "Short.".to_string()));
    }

    #[tokio::test]
    async fn test_cache_skips_repeat_calls() {
        let backend = Arc::new(RecordingNli {
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        });
        let adapter = ClassifierAdapter::new(
            backend.clone(),
            &ClassifierConfig {
                cache_size: 16,
                ..ClassifierConfig::default()
            },
        );

        let first = adapter.classify("x is up.", "x is down.").await.unwrap();
        let second = adapter.classify("x is up.", "x is down.").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_from_config_builds_heuristic_backend() {
        let adapter = ClassifierAdapter::from_config(&ClassifierConfig::default()).unwrap();
        assert_eq!(adapter.backend_name(), "heuristic");
    }
}
