// Pipeline tests — the two-pass runner driven through stub providers.
//
// No ONNX files are touched: the built-in topic model runs against a
// deterministic hashing embedder, and the runner's contract is also checked
// against hand-rolled TopicModel doubles.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map};

use umber::config::{TopicCountPolicy, TopicOptions};
use umber::embedding::traits::DocumentEmbedder;
use umber::model::engine::{EmbeddedTopicModel, Representation};
use umber::model::records::{DocumentInfo, TopicSummary};
use umber::model::traits::{FittedTopics, TopicModel};
use umber::pipeline::runner::{run_with_models, MetadataRow};

// ============================================================
// Stub providers
// ============================================================

/// Deterministic embedder: hashes each whitespace token into a bucket.
/// Documents sharing vocabulary land near each other, and identical inputs
/// always produce identical vectors.
struct HashEmbedder {
    dimension: usize,
}

#[async_trait]
impl DocumentEmbedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0_f64; self.dimension];
                for token in text.split_whitespace() {
                    let mut h = DefaultHasher::new();
                    token.to_lowercase().hash(&mut h);
                    v[(h.finish() as usize) % self.dimension] += 1.0;
                }
                v
            })
            .collect())
    }
}

fn builtin_models(
    options: &TopicOptions,
) -> (EmbeddedTopicModel, EmbeddedTopicModel) {
    let embedder: Arc<dyn DocumentEmbedder> = Arc::new(HashEmbedder { dimension: 16 });
    let primary = EmbeddedTopicModel::new(Arc::clone(&embedder), options, Representation::TfIdf);
    let saliency_options = TopicOptions {
        topic_count: TopicCountPolicy::Auto,
        ..options.clone()
    };
    let saliency = EmbeddedTopicModel::new(
        embedder,
        &saliency_options,
        Representation::EmbeddingSaliency,
    );
    (primary, saliency)
}

fn scenario_documents() -> Vec<String> {
    vec![
        "cats are great pets".to_string(),
        "dogs are loyal companions".to_string(),
        "stock markets fell today".to_string(),
        "interest rates rose sharply".to_string(),
    ]
}

fn scenario_metadata() -> Vec<MetadataRow> {
    ["feed-a", "feed-a", "wire-b", "wire-b"]
        .iter()
        .map(|source| {
            let mut row = Map::new();
            row.insert("source".to_string(), json!(source));
            row
        })
        .collect()
}

fn topic_size_sum(topic_info: &[TopicSummary]) -> usize {
    topic_info.iter().map(|t| t.count).sum()
}

// ============================================================
// The four-document scenario
// ============================================================

#[tokio::test]
async fn scenario_both_passes_cover_every_document() {
    let options = TopicOptions::default();
    let (primary, saliency) = builtin_models(&options);
    let docs = scenario_documents();
    let meta = scenario_metadata();

    let result = run_with_models(&primary, &saliency, &docs, &meta)
        .await
        .unwrap();

    for pass in [&result.primary, &result.saliency] {
        assert_eq!(pass.topics.len(), 4);
        assert_eq!(pass.probabilities.len(), 4);
        assert_eq!(pass.document_info.len(), 4);
        assert_eq!(topic_size_sum(&pass.topic_info), 4);
    }
}

#[tokio::test]
async fn scenario_metadata_joined_to_primary_rows() {
    let options = TopicOptions::default();
    let (primary, saliency) = builtin_models(&options);
    let docs = scenario_documents();
    let meta = scenario_metadata();

    let result = run_with_models(&primary, &saliency, &docs, &meta)
        .await
        .unwrap();

    assert_eq!(result.primary.document_info.len(), docs.len());
    assert_eq!(result.primary.document_info.len(), meta.len());
    for (i, row) in result.primary.document_info.iter().enumerate() {
        assert_eq!(
            row.meta.get("source"),
            meta[i].get("source"),
            "Row {i} lost its joined source field"
        );
        assert_eq!(row.document, docs[i], "Document order not preserved");
    }
}

#[tokio::test]
async fn scenario_saliency_rows_carry_no_metadata() {
    let options = TopicOptions::default();
    let (primary, saliency) = builtin_models(&options);

    let result = run_with_models(&primary, &saliency, &scenario_documents(), &scenario_metadata())
        .await
        .unwrap();

    for row in &result.saliency.document_info {
        assert!(row.meta.is_empty(), "Saliency pass should not join metadata");
    }
}

#[tokio::test]
async fn scenario_result_serializes_with_joined_fields() {
    let options = TopicOptions::default();
    let (primary, saliency) = builtin_models(&options);

    let result = run_with_models(&primary, &saliency, &scenario_documents(), &scenario_metadata())
        .await
        .unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["primary"]["document_info"][0]["source"], "feed-a");
    assert_eq!(value["saliency"]["topics"].as_array().unwrap().len(), 4);
}

// ============================================================
// Boundaries
// ============================================================

#[tokio::test]
async fn metadata_length_mismatch_fails_without_truncating() {
    let options = TopicOptions::default();
    let (primary, saliency) = builtin_models(&options);
    let docs = scenario_documents();
    let short_meta: Vec<MetadataRow> = scenario_metadata().into_iter().take(3).collect();

    let err = run_with_models(&primary, &saliency, &docs, &short_meta)
        .await
        .unwrap_err()
        .to_string();
    assert!(err.contains("3 rows"), "Unexpected error: {err}");
    assert!(err.contains("4 documents"), "Unexpected error: {err}");
}

#[tokio::test]
async fn single_document_corpus_yields_one_topic_of_size_one() {
    let options = TopicOptions::default();
    let (primary, saliency) = builtin_models(&options);
    let docs = vec!["cats are great pets".to_string()];
    let meta: Vec<MetadataRow> = scenario_metadata().into_iter().take(1).collect();

    let result = run_with_models(&primary, &saliency, &docs, &meta)
        .await
        .unwrap();

    assert_eq!(result.primary.topics, vec![0]);
    assert_eq!(result.primary.topic_info.len(), 1);
    assert_eq!(result.primary.topic_info[0].count, 1);
    assert_eq!(topic_size_sum(&result.saliency.topic_info), 1);
}

#[tokio::test]
async fn identical_inputs_produce_identical_assignments() {
    let options = TopicOptions::default();
    let docs = scenario_documents();
    let meta = scenario_metadata();

    // The built-in engine has no RNG, so a re-run must match exactly.
    let (primary_a, saliency_a) = builtin_models(&options);
    let first = run_with_models(&primary_a, &saliency_a, &docs, &meta)
        .await
        .unwrap();

    let (primary_b, saliency_b) = builtin_models(&options);
    let second = run_with_models(&primary_b, &saliency_b, &docs, &meta)
        .await
        .unwrap();

    assert_eq!(first.primary.topics, second.primary.topics);
    assert_eq!(first.primary.probabilities, second.primary.probabilities);
    assert_eq!(first.saliency.topics, second.saliency.topics);
}

// ============================================================
// Runner contract against hand-rolled model doubles
// ============================================================

/// Canned model: returns a fixed fit regardless of input.
struct CannedModel {
    topics: Vec<i32>,
}

#[async_trait]
impl TopicModel for CannedModel {
    async fn fit(&self, documents: &[String]) -> Result<FittedTopics> {
        let document_info = documents
            .iter()
            .zip(&self.topics)
            .map(|(doc, &topic)| DocumentInfo {
                document: doc.clone(),
                topic,
                name: format!("{topic}_canned"),
                terms: vec!["canned".to_string()],
                probability: 1.0,
                meta: Map::new(),
            })
            .collect();
        Ok(FittedTopics {
            assignments: self.topics.clone(),
            probabilities: vec![1.0; self.topics.len()],
            document_info,
            topic_info: vec![TopicSummary {
                topic: 0,
                count: self.topics.len(),
                name: "0_canned".to_string(),
                terms: vec!["canned".to_string()],
            }],
        })
    }
}

/// Model that always fails, for checking atomic propagation.
struct FailingModel;

#[async_trait]
impl TopicModel for FailingModel {
    async fn fit(&self, _documents: &[String]) -> Result<FittedTopics> {
        anyhow::bail!("embedding backend unavailable")
    }
}

#[tokio::test]
async fn runner_passes_fitted_sequences_through_verbatim() {
    let primary = CannedModel {
        topics: vec![0, 0, 0, 0],
    };
    let saliency = CannedModel {
        topics: vec![0, 0, 0, 0],
    };

    let result = run_with_models(&primary, &saliency, &scenario_documents(), &scenario_metadata())
        .await
        .unwrap();

    assert_eq!(result.primary.topics, vec![0, 0, 0, 0]);
    assert_eq!(result.primary.probabilities, vec![1.0; 4]);
    assert_eq!(result.primary.document_info[2].meta["source"], json!("wire-b"));
}

#[tokio::test]
async fn primary_failure_aborts_the_whole_call() {
    let saliency = CannedModel {
        topics: vec![0, 0, 0, 0],
    };

    let err = run_with_models(&FailingModel, &saliency, &scenario_documents(), &scenario_metadata())
        .await
        .unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("Primary pass failed"), "Unexpected error: {chain}");
    assert!(
        chain.contains("embedding backend unavailable"),
        "Original cause lost: {chain}"
    );
}

#[tokio::test]
async fn saliency_failure_aborts_the_whole_call() {
    let primary = CannedModel {
        topics: vec![0, 0, 0, 0],
    };

    let err = run_with_models(&primary, &FailingModel, &scenario_documents(), &scenario_metadata())
        .await
        .unwrap_err();
    assert!(
        format!("{err:#}").contains("Saliency pass failed"),
        "Unexpected error: {err:#}"
    );
}
