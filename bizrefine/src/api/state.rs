use std::sync::Arc;

use crate::classifier::ClassifierAdapter;
use crate::config::Config;
use crate::consistency::ConsistencyAnalyzer;
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::rewrite::RewriteOrchestrator;
use crate::services::ConsistencyService;
use crate::tools::AcronymStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: LlmProvider,
    pub consistency: ConsistencyService,
    pub acronyms: AcronymStore,
}

impl AppState {
    pub fn new(
        config: Config,
        classifier: ClassifierAdapter,
        llm: LlmProvider,
        acronyms: AcronymStore,
    ) -> Self {
        let config = Arc::new(config);
        let analyzer = ConsistencyAnalyzer::new(classifier, config.consistency.clone());
        let rewriter = RewriteOrchestrator::new(llm.clone(), &config.rewrite);
        let consistency = ConsistencyService::new(analyzer, rewriter);

        Self {
            config,
            llm,
            consistency,
            acronyms,
        }
    }

    /// Build every capability from configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let classifier = ClassifierAdapter::from_config(&config.classifier)?;
        let llm = LlmProvider::new(config.llm.as_ref());
        let acronyms = AcronymStore::load(&config.acronyms.path)?;
        Ok(Self::new(config, classifier, llm, acronyms))
    }

    pub fn rewriter(&self) -> &RewriteOrchestrator {
        self.consistency.rewriter()
    }
}
