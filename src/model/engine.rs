// The built-in topic model: embed, cluster, represent, assemble.
//
// This is the default TopicModel implementation. It owns no I/O of its own —
// the embedder comes in through the DocumentEmbedder trait, so the whole fit
// path runs against a stub in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Map;
use tracing::info;

use crate::config::{LanguageMode, TopicCountPolicy, TopicOptions};
use crate::embedding::mean_embedding;
use crate::embedding::traits::DocumentEmbedder;

use super::cluster;
use super::records::{topic_name, DocumentInfo, TopicSummary, OUTLIER_TOPIC};
use super::representation;
use super::traits::{FittedTopics, TopicModel};

/// How representative terms are derived for each topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// TF-IDF over topic aggregates (default)
    TfIdf,
    /// TF-IDF candidates re-ranked by embedding similarity to the topic centroid
    EmbeddingSaliency,
}

/// Over-sampling factor for saliency candidates: the re-ranker needs a wider
/// pool than the final term count.
const SALIENCY_CANDIDATE_FACTOR: usize = 3;

/// Embedding-based topic model over a document collection.
pub struct EmbeddedTopicModel {
    embedder: Arc<dyn DocumentEmbedder>,
    topic_count: TopicCountPolicy,
    language: LanguageMode,
    terms_per_topic: usize,
    representation: Representation,
}

impl EmbeddedTopicModel {
    pub fn new(
        embedder: Arc<dyn DocumentEmbedder>,
        options: &TopicOptions,
        representation: Representation,
    ) -> Self {
        Self {
            embedder,
            topic_count: options.topic_count,
            language: options.language,
            terms_per_topic: options.terms_per_topic,
            representation,
        }
    }
}

#[async_trait]
impl TopicModel for EmbeddedTopicModel {
    async fn fit(&self, documents: &[String]) -> Result<FittedTopics> {
        let embeddings = self.embedder.embed_batch(documents).await?;

        let outcome = cluster::cluster_embeddings(&embeddings, self.topic_count)?;

        // Group document indices per topic, outlier bucket included.
        // BTreeMap ordering puts -1 first, then topic 0 (the largest) onward.
        let mut members: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, &topic) in outcome.assignments.iter().enumerate() {
            members.entry(topic).or_default().push(i);
        }

        let candidate_count = match self.representation {
            Representation::TfIdf => self.terms_per_topic,
            Representation::EmbeddingSaliency => self.terms_per_topic * SALIENCY_CANDIDATE_FACTOR,
        };
        let candidates = representation::topic_candidate_terms(
            &members,
            documents,
            self.language,
            candidate_count,
        );

        let terms: HashMap<i32, Vec<String>> = match self.representation {
            Representation::TfIdf => candidates,
            Representation::EmbeddingSaliency => {
                let dimension = self.embedder.dimension();
                let centroids: HashMap<i32, Vec<f64>> = members
                    .iter()
                    .map(|(&topic, idxs)| {
                        let member_embeddings: Vec<Vec<f64>> =
                            idxs.iter().map(|&i| embeddings[i].clone()).collect();
                        (topic, mean_embedding(&member_embeddings, dimension))
                    })
                    .collect();
                representation::rerank_by_saliency(
                    self.embedder.as_ref(),
                    &candidates,
                    &centroids,
                    self.terms_per_topic,
                )
                .await?
            }
        };

        let topic_info: Vec<TopicSummary> = members
            .iter()
            .map(|(&topic, idxs)| {
                let topic_terms = terms.get(&topic).cloned().unwrap_or_default();
                TopicSummary {
                    topic,
                    count: idxs.len(),
                    name: topic_name(topic, &topic_terms),
                    terms: topic_terms,
                }
            })
            .collect();

        let summary_by_topic: HashMap<i32, &TopicSummary> =
            topic_info.iter().map(|s| (s.topic, s)).collect();

        let document_info: Vec<DocumentInfo> = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let topic = outcome.assignments[i];
                let summary = summary_by_topic[&topic];
                DocumentInfo {
                    document: doc.clone(),
                    topic,
                    name: summary.name.clone(),
                    terms: summary.terms.clone(),
                    probability: outcome.probabilities[i],
                    meta: Map::new(),
                }
            })
            .collect();

        let outlier_count = members.get(&OUTLIER_TOPIC).map_or(0, |v| v.len());
        info!(
            documents = documents.len(),
            topics = topic_info.len(),
            outliers = outlier_count,
            "Fitted topic model"
        );

        Ok(FittedTopics {
            assignments: outcome.assignments,
            probabilities: outcome.probabilities,
            document_info,
            topic_info,
        })
    }
}
