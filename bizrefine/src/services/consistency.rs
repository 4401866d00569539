use crate::consistency::{ConsistencyAnalyzer, ConsistencyReport};
use crate::error::Result;
use crate::rewrite::RewriteOrchestrator;

/// The consistency workflow: scan the document, then ask for a corrected
/// draft when the scan found contradictions.
#[derive(Clone)]
pub struct ConsistencyService {
    analyzer: ConsistencyAnalyzer,
    rewriter: RewriteOrchestrator,
}

impl ConsistencyService {
    pub fn new(analyzer: ConsistencyAnalyzer, rewriter: RewriteOrchestrator) -> Self {
        Self { analyzer, rewriter }
    }

    pub fn analyzer(&self) -> &ConsistencyAnalyzer {
        &self.analyzer
    }

    pub fn rewriter(&self) -> &RewriteOrchestrator {
        &self.rewriter
    }

    /// Analyse `text` and attach a suggested rewrite if anything contradicts.
    ///
    /// Rewrite failures never fail the call; they come back as an
    /// `Error:`-prefixed `suggested_rewrite`.
    pub async fn check(&self, text: &str) -> Result<ConsistencyReport> {
        let report = self.analyzer.analyze(text).await?;
        if !report.has_contradictions() {
            return Ok(report);
        }

        let outcome = self
            .rewriter
            .fix_conflicts(text, &report)
            .await
            .map_err(|e| e.to_string());
        Ok(report.with_rewrite(outcome))
    }
}
