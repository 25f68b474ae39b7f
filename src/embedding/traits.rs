// Document embedder trait — the swap-ready abstraction.
//
// The default implementation runs a sentence-transformer ONNX model locally.
// Tests substitute a deterministic stub so the pipeline and the topic engine
// can be exercised without model files on disk.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for turning text into dense vectors. Implementations must be async
/// because inference is offloaded to a blocking thread (or, for remote
/// providers, an HTTP call).
#[async_trait]
pub trait DocumentEmbedder: Send + Sync {
    /// Length of the vectors this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, returning one vector per text in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}
