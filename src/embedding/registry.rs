// Registry of the pretrained sentence-embedding models the pipeline can load.
//
// Model names here follow the upstream sentence-transformers repository names,
// so callers can use the identifiers they already know. An identifier that
// isn't listed is a configuration error, surfaced at options validation.

use anyhow::Result;

/// English-leaning default: small, fast, 384-dimensional.
pub const ALL_MINILM_L6_V2: &str = "all-MiniLM-L6-v2";

/// Multilingual default: trained on parallel data across 50+ languages.
pub const PARAPHRASE_MULTILINGUAL_MINILM: &str = "paraphrase-multilingual-MiniLM-L12-v2";

/// Everything the loader and downloader need to know about one model.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    /// The sentence-transformers model name, also used as the on-disk directory
    pub name: &'static str,
    /// HuggingFace URL prefix for resolving model files
    pub repo_url: &'static str,
    /// Embedding dimension the ONNX graph produces
    pub dimension: usize,
    /// Path of the ONNX graph within the repo
    pub model_file: &'static str,
}

const KNOWN_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: ALL_MINILM_L6_V2,
        repo_url: "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main",
        dimension: 384,
        model_file: "onnx/model.onnx",
    },
    ModelSpec {
        name: PARAPHRASE_MULTILINGUAL_MINILM,
        repo_url:
            "https://huggingface.co/sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2/resolve/main",
        dimension: 384,
        model_file: "onnx/model.onnx",
    },
];

/// Look up a model by its sentence-transformers name.
pub fn lookup(name: &str) -> Result<&'static ModelSpec> {
    KNOWN_MODELS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown embedding model '{}'. Known models: {}",
                name,
                KNOWN_MODELS
                    .iter()
                    .map(|s| s.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
}
