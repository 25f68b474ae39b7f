// Two-pass topic extraction over one corpus.
//
// Pass one (primary) uses the caller's options as-is with the TF-IDF term
// representation, and its per-document rows get the caller's metadata joined
// in by position. Pass two (saliency) re-fits independently with the
// embedding-saliency representation, the language mode's default embedding
// model, and an unconstrained topic count. Only the first pass's rows carry
// metadata; the second pass's rows are reported as-is.
//
// Both passes run sequentially and a failure in either aborts the whole call
// with no partial results.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::config::{TopicCountPolicy, TopicOptions};
use crate::embedding::traits::DocumentEmbedder;
use crate::embedding::{download, onnx::OnnxEmbedder, registry};
use crate::model::engine::{EmbeddedTopicModel, Representation};
use crate::model::records::{DocumentInfo, TopicSummary};
use crate::model::traits::TopicModel;

/// One caller-supplied metadata row, joined to a document by its index.
pub type MetadataRow = Map<String, Value>;

/// Everything one pass reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassOutput {
    /// Per-document topic id, input order
    pub topics: Vec<i32>,
    /// Per-document assignment confidence, input order
    pub probabilities: Vec<f64>,
    /// One row per document
    pub document_info: Vec<DocumentInfo>,
    /// One row per topic
    pub topic_info: Vec<TopicSummary>,
}

/// The composite result of both passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub primary: PassOutput,
    pub saliency: PassOutput,
}

/// Run both topic-extraction passes with the built-in models.
///
/// Loads the configured embedding model (and, for the saliency pass, the
/// language mode's default model) from the local model directory. Fails if
/// the model files aren't on disk — download them first with
/// `embedding::download::download_model`.
pub async fn run(
    documents: &[String],
    metadata: &[MetadataRow],
    options: &TopicOptions,
) -> Result<PipelineResult> {
    options.validate()?;

    let base_dir = download::default_model_dir();

    let primary_spec = registry::lookup(&options.embedding_model)?;
    let primary_embedder: Arc<dyn DocumentEmbedder> = Arc::new(
        OnnxEmbedder::load(&base_dir, primary_spec)
            .with_context(|| format!("Loading embedding model '{}'", primary_spec.name))?,
    );

    // The saliency pass leaves the model choice to the language mode. When
    // that resolves to the primary model, reuse the loaded session.
    let saliency_spec = registry::lookup(options.language.default_embedding_model())?;
    let saliency_embedder: Arc<dyn DocumentEmbedder> = if saliency_spec.name == primary_spec.name {
        Arc::clone(&primary_embedder)
    } else {
        Arc::new(
            OnnxEmbedder::load(&base_dir, saliency_spec)
                .with_context(|| format!("Loading embedding model '{}'", saliency_spec.name))?,
        )
    };

    let primary_model =
        EmbeddedTopicModel::new(Arc::clone(&primary_embedder), options, Representation::TfIdf);

    let saliency_options = TopicOptions {
        topic_count: TopicCountPolicy::Auto,
        embedding_model: saliency_spec.name.to_string(),
        ..options.clone()
    };
    let saliency_model = EmbeddedTopicModel::new(
        saliency_embedder,
        &saliency_options,
        Representation::EmbeddingSaliency,
    );

    run_with_models(&primary_model, &saliency_model, documents, metadata).await
}

/// Run both passes with caller-provided models.
///
/// This is the dependency-injected form: any two `TopicModel` implementations
/// work, which is how the test suite drives the pipeline without ONNX files.
/// Metadata is joined into the primary pass's document rows only.
pub async fn run_with_models(
    primary: &dyn TopicModel,
    saliency: &dyn TopicModel,
    documents: &[String],
    metadata: &[MetadataRow],
) -> Result<PipelineResult> {
    if metadata.len() != documents.len() {
        anyhow::bail!(
            "Metadata has {} rows but the corpus has {} documents — the positional join requires equal lengths",
            metadata.len(),
            documents.len()
        );
    }

    info!(documents = documents.len(), "Fitting primary topic model");
    let mut fitted_primary = primary.fit(documents).await.context("Primary pass failed")?;
    join_metadata(&mut fitted_primary.document_info, metadata);

    info!(documents = documents.len(), "Fitting saliency topic model");
    let fitted_saliency = saliency
        .fit(documents)
        .await
        .context("Saliency pass failed")?;

    Ok(PipelineResult {
        primary: PassOutput {
            topics: fitted_primary.assignments,
            probabilities: fitted_primary.probabilities,
            document_info: fitted_primary.document_info,
            topic_info: fitted_primary.topic_info,
        },
        saliency: PassOutput {
            topics: fitted_saliency.assignments,
            probabilities: fitted_saliency.probabilities,
            document_info: fitted_saliency.document_info,
            topic_info: fitted_saliency.topic_info,
        },
    })
}

/// Merge metadata rows into document rows by position.
/// Callers must have checked the lengths match.
fn join_metadata(rows: &mut [DocumentInfo], metadata: &[MetadataRow]) {
    for (row, meta) in rows.iter_mut().zip(metadata) {
        row.meta = meta.clone();
    }
}
