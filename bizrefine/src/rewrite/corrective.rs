use std::time::Duration;

use crate::config::RewriteConfig;
use crate::consistency::{is_error_sentinel, ComparisonResult, ConsistencyReport};
use crate::error::{RefineError, Result};
use crate::llm::prompts::{conflict_fix_prompt, conflict_fix_system_prompt};
use crate::llm::{CompletionOptions, LlmProvider};

/// Requests corrected drafts from the generative capability.
#[derive(Clone, Debug)]
pub struct RewriteOrchestrator {
    pub(super) llm: LlmProvider,
    pub(super) timeout: Duration,
}

impl RewriteOrchestrator {
    pub fn new(llm: LlmProvider, config: &RewriteConfig) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_available()
    }

    /// One corrected draft of `text` resolving the contradictions in `report`.
    ///
    /// Never called for a clean report. The draft is returned trimmed and
    /// otherwise untouched.
    pub async fn fix_conflicts(&self, text: &str, report: &ConsistencyReport) -> Result<String> {
        let issues: Vec<&ComparisonResult> = report.contradictions().collect();
        if issues.is_empty() {
            return Err(RefineError::Validation(
                "No contradictions to rewrite".to_string(),
            ));
        }

        let options = CompletionOptions {
            temperature: Some(0.3),
            ..CompletionOptions::default()
        };
        let prompt = conflict_fix_prompt(text, &issues);

        tracing::info!(issues = issues.len(), "Requesting corrective rewrite");
        let call = self
            .llm
            .complete(&prompt, Some(conflict_fix_system_prompt()), Some(&options));

        let draft = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(draft)) => draft,
            Ok(Err(e)) => {
                tracing::warn!(capability = "rewrite", error = %e, "Corrective rewrite failed");
                return Err(into_rewrite_error(e));
            }
            Err(_) => {
                tracing::warn!(
                    capability = "rewrite",
                    timeout_secs = self.timeout.as_secs(),
                    "Corrective rewrite timed out"
                );
                return Err(RefineError::RewriteUnavailable(format!(
                    "rewrite timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let draft = draft.trim();
        if draft.is_empty() || is_error_sentinel(draft) {
            tracing::warn!(capability = "rewrite", "Rewrite capability returned no usable draft");
            return Err(RefineError::MalformedExternalResponse {
                capability: "rewrite",
                message: "response did not contain a usable draft".to_string(),
            });
        }

        Ok(draft.to_string())
    }
}

pub(super) fn into_rewrite_error(e: RefineError) -> RefineError {
    match e {
        RefineError::MalformedExternalResponse { .. } | RefineError::RewriteUnavailable(_) => e,
        RefineError::LlmUnavailable(reason) => RefineError::RewriteUnavailable(reason),
        other => RefineError::RewriteUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::ConsistencyReport;

    #[tokio::test]
    async fn test_clean_report_is_rejected() {
        let orchestrator = RewriteOrchestrator::new(
            LlmProvider::unavailable("offline"),
            &RewriteConfig { timeout_secs: 1 },
        );
        let err = orchestrator
            .fix_conflicts("All good.", &ConsistencyReport::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, RefineError::Validation(_)));
    }

    #[test]
    fn test_unavailable_llm_becomes_rewrite_unavailable() {
        let err = into_rewrite_error(RefineError::LlmUnavailable("no key".into()));
        assert!(matches!(err, RefineError::RewriteUnavailable(reason) if reason == "no key"));
    }

    #[test]
    fn test_auth_error_keeps_message() {
        let err = into_rewrite_error(RefineError::Llm("LLM authentication failed".into()));
        assert!(err.to_string().contains("authentication failed"));
    }
}
