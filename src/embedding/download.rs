// Model download helper for ONNX sentence-embedding models.
//
// The pretrained models come from HuggingFace and are stored in a
// platform-appropriate directory (~/.local/share/umber/models/ on Linux)
// so they persist across runs. Each model gets its own subdirectory named
// after the sentence-transformers model name.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::registry::ModelSpec;

/// Tokenizer file name, the same for every model in the registry.
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Returns the base directory for storing model files.
///
/// UMBER_MODEL_DIR overrides the platform default when set.
pub fn default_model_dir() -> PathBuf {
    if let Ok(dir) = env::var("UMBER_MODEL_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("umber")
        .join("models")
}

/// Subdirectory within the base dir holding one model's files.
pub fn model_dir_for(base: &Path, spec: &ModelSpec) -> PathBuf {
    base.join(spec.name)
}

/// Check whether both required files for a model exist on disk.
pub fn model_files_present(base: &Path, spec: &ModelSpec) -> bool {
    let dir = model_dir_for(base, spec);
    dir.join("model.onnx").exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Download a model's ONNX graph and tokenizer into the base directory.
///
/// Shows a progress bar for the large graph file. Skips files that already
/// exist. Creates directories as needed.
pub async fn download_model(base: &Path, spec: &ModelSpec) -> Result<()> {
    let dir = model_dir_for(base, spec);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nSentence embedding model ({}):", spec.name);

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if tokenizer_path.exists() {
        info!(model = spec.name, "Tokenizer already exists, skipping");
        println!("  {TOKENIZER_FILE} (already exists)");
    } else {
        println!("  Downloading {TOKENIZER_FILE}...");
        download_file(
            &format!("{}/{}", spec.repo_url, TOKENIZER_FILE),
            &tokenizer_path,
            false,
        )
        .await?;
    }

    let model_path = dir.join("model.onnx");
    if model_path.exists() {
        info!(model = spec.name, "Model graph already exists, skipping");
        println!("  model.onnx (already exists)");
    } else {
        println!("  Downloading model.onnx...");
        download_file(
            &format!("{}/{}", spec.repo_url, spec.model_file),
            &model_path,
            true,
        )
        .await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
