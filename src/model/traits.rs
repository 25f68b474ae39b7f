// Topic model trait — the fit-and-summarize contract.
//
// The pipeline runner only depends on this trait, so the built-in
// embedding-and-clustering engine can be swapped for a test double (or a
// remote service) without touching the orchestration code.

use anyhow::Result;
use async_trait::async_trait;

use super::records::{DocumentInfo, TopicSummary};

/// Everything one fitted pass reports about a corpus.
#[derive(Debug, Clone)]
pub struct FittedTopics {
    /// Per-document topic id, input order, -1 for outliers
    pub assignments: Vec<i32>,
    /// Per-document confidence in the assignment, 0.0..=1.0
    pub probabilities: Vec<f64>,
    /// One row per document, input order
    pub document_info: Vec<DocumentInfo>,
    /// One row per topic, outlier bucket first, then descending size
    pub topic_info: Vec<TopicSummary>,
}

/// Trait for fitting a topic model against a document collection.
#[async_trait]
pub trait TopicModel: Send + Sync {
    /// Fit against the documents and report assignments plus summaries.
    async fn fit(&self, documents: &[String]) -> Result<FittedTopics>;
}
