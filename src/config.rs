use anyhow::Result;
use stop_words::{get, LANGUAGE};

use crate::embedding::registry;

/// How many topics the clustering step should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicCountPolicy {
    /// Let the engine pick a topic count from the corpus size (default)
    Auto,
    /// Cluster into exactly this many topics
    Fixed(usize),
}

/// Which language's tokenization and stop-word behavior to use.
///
/// Also selects the default embedding model when the caller doesn't name one
/// explicitly: multilingual corpora get the multilingual MiniLM variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageMode {
    /// Mixed-language corpora — merged stop-word set, multilingual model (default)
    Multilingual,
    English,
    Dutch,
    German,
    French,
    Spanish,
}

impl LanguageMode {
    /// Stop words for this language mode.
    ///
    /// Multilingual merges the sets of the supported languages — a word that
    /// is a stop word in any of them is filtered from topic vocabulary.
    pub fn stop_words(&self) -> Vec<String> {
        match self {
            LanguageMode::Multilingual => {
                let mut words = get(LANGUAGE::English);
                words.extend(get(LANGUAGE::Dutch));
                words.extend(get(LANGUAGE::German));
                words.extend(get(LANGUAGE::French));
                words.extend(get(LANGUAGE::Spanish));
                words.sort();
                words.dedup();
                words
            }
            LanguageMode::English => get(LANGUAGE::English),
            LanguageMode::Dutch => get(LANGUAGE::Dutch),
            LanguageMode::German => get(LANGUAGE::German),
            LanguageMode::French => get(LANGUAGE::French),
            LanguageMode::Spanish => get(LANGUAGE::Spanish),
        }
    }

    /// The embedding model used when the caller leaves the choice to us.
    pub fn default_embedding_model(&self) -> &'static str {
        match self {
            LanguageMode::Multilingual => registry::PARAPHRASE_MULTILINGUAL_MINILM,
            _ => registry::ALL_MINILM_L6_V2,
        }
    }
}

/// Configuration for one topic-extraction pass.
///
/// All fields have documented defaults; `validate` rejects unknown or
/// out-of-range values before any model is loaded.
#[derive(Debug, Clone)]
pub struct TopicOptions {
    /// Target topic count, or Auto to derive one from the corpus size
    pub topic_count: TopicCountPolicy,
    /// Language mode for stop words and the fallback embedding model
    pub language: LanguageMode,
    /// Name of the pretrained sentence-embedding model to load
    pub embedding_model: String,
    /// How many representative terms to keep per topic
    pub terms_per_topic: usize,
}

impl Default for TopicOptions {
    fn default() -> Self {
        Self {
            topic_count: TopicCountPolicy::Auto,
            language: LanguageMode::Multilingual,
            embedding_model: registry::ALL_MINILM_L6_V2.to_string(),
            terms_per_topic: 10,
        }
    }
}

impl TopicOptions {
    /// Check the options for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.terms_per_topic == 0 {
            anyhow::bail!("terms_per_topic must be at least 1");
        }
        if let TopicCountPolicy::Fixed(0) = self.topic_count {
            anyhow::bail!("A fixed topic count of 0 is not meaningful — use Auto instead");
        }
        // Unknown model names fail here rather than at load time
        registry::lookup(&self.embedding_model)?;
        Ok(())
    }
}
