//! Pairwise natural-language-inference classification.

mod adapter;
mod cache;
mod heuristic;
mod remote;

use async_trait::async_trait;

use crate::consistency::NliPrediction;
use crate::error::Result;

pub use adapter::ClassifierAdapter;
pub use cache::PredictionCache;
pub use heuristic::{HeuristicNli, Signal};
pub use remote::RemoteNli;

/// A capability that labels an ordered sentence pair.
///
/// Implementations only run the model; truncation, timeouts, retries and
/// concurrency limits are applied by [`ClassifierAdapter`].
#[async_trait]
pub trait NliBackend: Send + Sync {
    /// Short name used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    async fn predict(&self, premise: &str, hypothesis: &str) -> Result<NliPrediction>;
}
