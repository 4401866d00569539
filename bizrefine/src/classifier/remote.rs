use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::NliBackend;
use crate::config::ClassifierConfig;
use crate::consistency::{NliLabel, NliPrediction};
use crate::error::{RefineError, Result};

#[derive(Debug, Serialize)]
struct ClassificationRequest {
    inputs: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

/// Text-classification endpoints return either `[{..}]` or `[[{..}]]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            Self::Flat(scores) => scores,
        }
    }
}

/// Hosted NLI model behind a Hugging Face style inference endpoint.
#[derive(Clone)]
pub struct RemoteNli {
    client: Client,
    endpoint: String,
    headers: HeaderMap,
}

impl RemoteNli {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        // The adapter enforces the per-call timeout; this one only guards
        // against a connection that never completes.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.saturating_mul(2).max(1)))
            .build()
            .map_err(|e| {
                RefineError::ClassifierUnavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref api_key) = config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                    RefineError::Validation(format!("Invalid NLI API key header: {e}"))
                })?,
            );
        }

        let endpoint = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.model.trim_start_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            headers,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NliBackend for RemoteNli {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn predict(&self, premise: &str, hypothesis: &str) -> Result<NliPrediction> {
        let request = ClassificationRequest {
            inputs: format!("{premise} </s> {hypothesis}"),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| RefineError::ClassifierUnavailable(format!("Request failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(RefineError::ClassifierUnavailable(format!(
                "Server error {status}: {body}"
            )));
        }
        let response = response.error_for_status()?;

        let body = response.text().await?;
        parse_prediction(&body)
    }
}

fn parse_prediction(body: &str) -> Result<NliPrediction> {
    let malformed = |message: String| RefineError::MalformedExternalResponse {
        capability: "classifier",
        message,
    };

    let parsed: ClassificationResponse = serde_json::from_str(body)
        .map_err(|e| malformed(format!("unexpected response shape: {e}")))?;

    let best = parsed
        .into_scores()
        .into_iter()
        .filter(|s| s.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| malformed("response contained no labels".to_string()))?;

    let label = NliLabel::from_model_label(&best.label)
        .ok_or_else(|| malformed(format!("unknown label '{}'", best.label)))?;

    Ok(NliPrediction::new(label, best.score))
}
