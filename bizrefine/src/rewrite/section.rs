use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::corrective::{into_rewrite_error, RewriteOrchestrator};
use crate::consistency::is_error_sentinel;
use crate::error::{RefineError, Result};
use crate::llm::prompts::{section_rewrite_prompt, section_rewrite_system_prompt};

/// Placeholder for each variant when the rewrite could not be produced.
pub const REWRITE_FAILED: &str = "Error: Could not generate rewrite.";

/// Three alternative phrasings of one passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionRewrite {
    #[serde(default)]
    pub original: String,
    pub professional: String,
    pub concise: String,
    pub simpler: String,
}

impl SectionRewrite {
    pub fn failed(original: &str) -> Self {
        Self {
            original: original.to_string(),
            professional: REWRITE_FAILED.to_string(),
            concise: REWRITE_FAILED.to_string(),
            simpler: REWRITE_FAILED.to_string(),
        }
    }
}

impl RewriteOrchestrator {
    /// Professional, concise and simpler variants of `text`.
    ///
    /// Failures are logged and reported through the [`REWRITE_FAILED`] placeholder
    /// in every variant, so the caller always gets a complete object.
    pub async fn rewrite_section(&self, text: &str) -> SectionRewrite {
        match self.try_rewrite_section(text).await {
            Ok(rewrite) => rewrite,
            Err(e) => {
                tracing::warn!(capability = "section_rewrite", error = %e, "Section rewrite failed");
                SectionRewrite::failed(text)
            }
        }
    }

    async fn try_rewrite_section(&self, text: &str) -> Result<SectionRewrite> {
        let prompt = section_rewrite_prompt(text);
        let call = self.llm.complete_structured::<SectionRewrite>(
            &prompt,
            Some(section_rewrite_system_prompt()),
        );

        let mut rewrite = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RefineError::RewriteUnavailable("section rewrite timed out".into()))?
            .map_err(into_rewrite_error)?;

        let variants = [&rewrite.professional, &rewrite.concise, &rewrite.simpler];
        if variants
            .iter()
            .any(|v| v.trim().is_empty() || is_error_sentinel(v))
        {
            return Err(RefineError::MalformedExternalResponse {
                capability: "section_rewrite",
                message: "missing or empty rewrite variant".to_string(),
            });
        }

        if rewrite.original.trim().is_empty() {
            rewrite.original = text.to_string();
        }
        Ok(rewrite)
    }
}
