//! Wire types for the HTTP surface.
//!
//! Field names are snake_case and match what the task-pane client already
//! sends and reads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::consistency::{ComparisonResult, ConsistencyReport};
use crate::rewrite::SectionRewrite;
use crate::tools::{CitationStyle, Expansion};

/// Body of `POST /process`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProcessRequest {
    /// One of `consistency`, `expand`, `rewrite`, `citation`.
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Target style for `citation`, defaults to `apa`.
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsistencyResponse {
    pub consistency_results: Vec<ComparisonResult>,
    pub issues_report: String,
    /// Absent, or starting with `Error:`, when there is no usable suggestion.
    pub suggested_rewrite: Option<String>,
}

impl From<ConsistencyReport> for ConsistencyResponse {
    fn from(report: ConsistencyReport) -> Self {
        Self {
            suggested_rewrite: report.suggested_rewrite().map(str::to_string),
            issues_report: report.issues_report().to_string(),
            consistency_results: report.results().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpandResponse {
    pub result: String,
    pub unknown: Vec<String>,
}

impl From<Expansion> for ExpandResponse {
    fn from(expansion: Expansion) -> Self {
        Self {
            result: expansion.text,
            unknown: expansion.unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CitationResponse {
    pub result: String,
    pub detected: CitationStyle,
}

/// Response of `POST /process`; the shape depends on the action.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ProcessResponse {
    Consistency(ConsistencyResponse),
    Expand(ExpandResponse),
    Rewrite(SectionRewrite),
    Citation(CitationResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddAcronymRequest {
    pub acronym: String,
    pub meaning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddAcronymResponse {
    /// False when the acronym was already defined.
    pub added: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
}
