#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use bizrefine::classifier::{ClassifierAdapter, NliBackend};
use bizrefine::config::{ClassifierConfig, ConsistencyConfig, LlmConfig, RewriteConfig};
use bizrefine::consistency::{ConsistencyAnalyzer, NliLabel, NliPrediction};
use bizrefine::error::{RefineError, Result};
use bizrefine::llm::LlmProvider;
use bizrefine::rewrite::RewriteOrchestrator;
use bizrefine::services::ConsistencyService;

/// LLM config pointing at a mock OpenAI-compatible server.
pub fn llm_config_with_base_url(model: &str, base_url: String, max_retries: u32) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries,
    }
}

pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

pub fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}

/// What a [`ScriptedNli`] does for one pair.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Label(NliLabel, f32),
    Hang,
    Fail,
}

/// Classifier backend whose answer per pair comes from a closure.
pub struct ScriptedNli<F> {
    script: F,
    calls: AtomicUsize,
}

impl<F> ScriptedNli<F>
where
    F: Fn(&str, &str) -> Step + Send + Sync,
{
    pub fn new(script: F) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> NliBackend for ScriptedNli<F>
where
    F: Fn(&str, &str) -> Step + Send + Sync,
{
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn predict(&self, premise: &str, hypothesis: &str) -> Result<NliPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (self.script)(premise, hypothesis) {
            Step::Label(label, score) => Ok(NliPrediction::new(label, score)),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(NliPrediction::new(NliLabel::Neutral, 0.5))
            }
            Step::Fail => Err(RefineError::ClassifierUnavailable(
                "scripted failure".to_string(),
            )),
        }
    }
}

pub fn neutral(_premise: &str, _hypothesis: &str) -> Step {
    Step::Label(NliLabel::Neutral, 0.9)
}

/// Classifier adapter over `backend` with the cache disabled so every pair
/// reaches the backend.
pub fn adapter(backend: Arc<dyn NliBackend>, timeout: Duration) -> ClassifierAdapter {
    let config = ClassifierConfig {
        cache_size: 0,
        max_concurrency: 4,
        ..ClassifierConfig::default()
    };
    ClassifierAdapter::new(backend, &config).with_timeout(timeout)
}

pub fn consistency_service(classifier: ClassifierAdapter, llm: LlmProvider) -> ConsistencyService {
    let analyzer = ConsistencyAnalyzer::new(classifier, ConsistencyConfig::default());
    let rewriter = RewriteOrchestrator::new(llm, &RewriteConfig { timeout_secs: 10 });
    ConsistencyService::new(analyzer, rewriter)
}

/// A `.docx` built in memory from the given paragraphs.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run};

    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
    });
    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}
