// Representative-term extraction for fitted topics.
//
// Two strategies:
//  - TF-IDF (default): each topic's documents are aggregated into one
//    pseudo-document and the `keyword_extraction` crate scores the vocabulary
//    across those aggregates. Words shared by every topic get downweighted,
//    words distinctive to one topic get boosted.
//  - Embedding saliency: the TF-IDF candidates are re-ranked by cosine
//    similarity between each candidate term's embedding and the topic's mean
//    document embedding, so the kept terms are the ones semantically closest
//    to the topic as a whole.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use regex_lite::Regex;
use tracing::debug;

use crate::config::LanguageMode;
use crate::embedding::cosine_similarity;
use crate::embedding::traits::DocumentEmbedder;

/// Term pattern: a letter followed by letters, digits, hyphens or
/// apostrophes. Latin-1 ranges keep accented words intact for the
/// non-English language modes.
const TOKEN_PATTERN: &str = "[A-Za-zÀ-ÖØ-öø-ÿ][A-Za-zÀ-ÖØ-öø-ÿ0-9'-]+";

/// Minimum token length for topic vocabulary.
const MIN_TOKEN_LEN: usize = 3;

/// Rank candidate terms for every topic with TF-IDF over topic aggregates.
///
/// `members` maps each topic id (outlier bucket included) to the indices of
/// its documents. Returns up to `per_topic` terms per topic, most salient
/// first. A topic whose text yields no usable vocabulary gets an empty list.
pub fn topic_candidate_terms(
    members: &BTreeMap<i32, Vec<usize>>,
    documents: &[String],
    language: LanguageMode,
    per_topic: usize,
) -> HashMap<i32, Vec<String>> {
    let stop_words = language.stop_words();
    let stop_set: HashSet<&str> = stop_words.iter().map(|s| s.as_str()).collect();

    // One aggregate pseudo-document per topic, in topic-id order
    let topic_ids: Vec<i32> = members.keys().copied().collect();
    let aggregates: Vec<String> = topic_ids
        .iter()
        .map(|t| {
            members[t]
                .iter()
                .map(|&i| documents[i].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let params = TfIdfParams::UnprocessedDocuments(&aggregates, &stop_words, None);
    let tfidf = TfIdf::new(params);

    // Pull the full scored vocabulary; the cap only needs to exceed the
    // number of distinct words.
    let vocab_cap = aggregates
        .iter()
        .map(|a| a.split_whitespace().count())
        .sum::<usize>()
        .max(per_topic);
    let score_map: HashMap<String, f64> = tfidf
        .get_ranked_word_scores(vocab_cap)
        .into_iter()
        .map(|(word, score)| (word, score as f64))
        .collect();

    let token_re = Regex::new(TOKEN_PATTERN).expect("valid token pattern");

    let mut terms = HashMap::new();
    for (topic, aggregate) in topic_ids.iter().zip(&aggregates) {
        let ranked = rank_topic_tokens(aggregate, &token_re, &stop_set, &score_map, per_topic);
        debug!(topic = topic, terms = ranked.len(), "Ranked topic terms");
        terms.insert(*topic, ranked);
    }
    terms
}

/// Tokenize one topic's aggregate text and rank its distinct tokens.
///
/// Primary key is the corpus-wide TF-IDF score; topic-local frequency breaks
/// ties (and carries the ranking when scores degenerate to zero, e.g. a
/// single-topic corpus), with alphabetical order as the final tiebreak.
fn rank_topic_tokens(
    aggregate: &str,
    token_re: &Regex,
    stop_set: &HashSet<&str>,
    score_map: &HashMap<String, f64>,
    per_topic: usize,
) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in token_re.find_iter(&aggregate.to_lowercase()) {
        let token = m.as_str();
        if token.len() < MIN_TOKEN_LEN || stop_set.contains(token) {
            continue;
        }
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, f64, usize)> = counts
        .into_iter()
        .map(|(token, count)| {
            let score = score_map.get(&token).copied().unwrap_or(0.0);
            (token, score, count)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.2.cmp(&a.2))
            .then(a.0.cmp(&b.0))
    });

    ranked
        .into_iter()
        .take(per_topic)
        .map(|(token, _, _)| token)
        .collect()
}

/// Re-rank each topic's candidate terms by embedding saliency.
///
/// Embeds the candidates, scores them against the topic centroid with cosine
/// similarity, and keeps the `per_topic` most similar. Topics without a
/// centroid (no member documents) keep their candidate order.
pub async fn rerank_by_saliency(
    embedder: &dyn DocumentEmbedder,
    candidates: &HashMap<i32, Vec<String>>,
    centroids: &HashMap<i32, Vec<f64>>,
    per_topic: usize,
) -> Result<HashMap<i32, Vec<String>>> {
    let mut topic_ids: Vec<i32> = candidates.keys().copied().collect();
    topic_ids.sort_unstable();

    let mut reranked = HashMap::new();
    for topic in topic_ids {
        let terms = &candidates[&topic];
        if terms.is_empty() {
            reranked.insert(topic, Vec::new());
            continue;
        }

        let centroid = match centroids.get(&topic) {
            Some(c) => c,
            None => {
                reranked.insert(topic, terms.iter().take(per_topic).cloned().collect());
                continue;
            }
        };

        let term_embeddings = embedder.embed_batch(terms).await?;

        let mut scored: Vec<(String, f64)> = terms
            .iter()
            .zip(&term_embeddings)
            .map(|(term, emb)| (term.clone(), cosine_similarity(emb, centroid)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        reranked.insert(
            topic,
            scored
                .into_iter()
                .take(per_topic)
                .map(|(term, _)| term)
                .collect(),
        );
    }

    Ok(reranked)
}
