// Output record shapes — the tabular rows a fitted model reports.
//
// Both record types are plain data, ready for JSON serialization. Callers
// joining their own metadata get it flattened into the document rows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel topic id for documents no cluster claimed.
pub const OUTLIER_TOPIC: i32 = -1;

/// Per-topic aggregate record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    /// Topic id; -1 is the outlier bucket
    pub topic: i32,
    /// Number of documents assigned to this topic
    pub count: usize,
    /// Generated name, e.g. "0_stocks_rates_markets"
    pub name: String,
    /// Representative terms in descending saliency order
    pub terms: Vec<String>,
}

/// Per-document record combining the assignment with the topic's terms.
///
/// `meta` holds caller-supplied metadata fields joined by document index;
/// it serializes flattened into the row, so a `source` column in the input
/// table comes out as a `source` field here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document: String,
    pub topic: i32,
    pub name: String,
    pub terms: Vec<String>,
    pub probability: f64,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

/// Build a topic's display name from its id and top terms.
pub fn topic_name(topic: i32, terms: &[String]) -> String {
    let head: Vec<&str> = terms.iter().take(3).map(|t| t.as_str()).collect();
    if head.is_empty() {
        format!("{topic}")
    } else {
        format!("{topic}_{}", head.join("_"))
    }
}
