//! Model artifact loader

use super::artifact::ModelArtifact;
use super::inference::InferenceEngine;
use crate::config::{ModelConfig, PreprocessingConfig};
use crate::error::{ScoringError, ScoringResult};
use crate::feature_extractor::FeatureExtractor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Loads the model artifact, fetching it from remote storage when the local
/// copy is missing.
pub struct ModelLoader {
    model: ModelConfig,
    preprocessing: PreprocessingConfig,
    client: reqwest::Client,
}

impl ModelLoader {
    pub fn new(model: ModelConfig, preprocessing: PreprocessingConfig) -> ScoringResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(model.fetch_timeout_secs))
            .build()
            .map_err(|e| ScoringError::ModelUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            model,
            preprocessing,
            client,
        })
    }

    /// Local artifact path
    pub fn model_path(&self) -> &Path {
        &self.model.path
    }

    /// Make sure the artifact exists locally, downloading it if needed.
    pub async fn ensure_local(&self) -> ScoringResult<PathBuf> {
        let path = self.model.path.clone();
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        let url = self.model.remote_url().ok_or_else(|| {
            ScoringError::ModelUnavailable(format!(
                "{} not found and no remote_id configured",
                path.display()
            ))
        })?;

        info!(path = %path.display(), url = %url, "Model artifact missing locally, fetching");
        self.fetch_remote(&url, &path).await?;
        Ok(path)
    }

    /// Download the artifact at `url` into `dest`.
    ///
    /// The body must parse as an artifact before anything is written, so a
    /// quota or error page never replaces the model. The file is written
    /// next to `dest` and renamed into place.
    async fn fetch_remote(&self, url: &str, dest: &Path) -> ScoringResult<()> {
        let unavailable =
            |e: reqwest::Error| ScoringError::ModelUnavailable(format!("fetching {}: {}", url, e));

        let response = self.client.get(url).send().await.map_err(unavailable)?;
        let response = response.error_for_status().map_err(unavailable)?;
        let bytes = response.bytes().await.map_err(unavailable)?;

        ModelArtifact::from_slice(&bytes).map_err(|e| {
            ScoringError::ModelUnavailable(format!(
                "{} did not return a model artifact: {}",
                url, e
            ))
        })?;

        let write_failed = |e: std::io::Error| {
            ScoringError::ModelUnavailable(format!("writing {}: {}", dest.display(), e))
        };

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
        let partial = dest.with_extension("download");
        tokio::fs::write(&partial, &bytes).await.map_err(write_failed)?;
        tokio::fs::rename(&partial, dest).await.map_err(write_failed)?;

        info!(path = %dest.display(), bytes = bytes.len(), "Model artifact downloaded");
        Ok(())
    }

    /// Read and validate the local artifact.
    pub async fn read_artifact(&self, path: &Path) -> ScoringResult<ModelArtifact> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ScoringError::ModelUnavailable(format!("reading {}: {}", path.display(), e))
        })?;
        ModelArtifact::from_slice(&bytes)
    }

    /// Obtain the artifact and build a ready inference engine from it.
    pub async fn load(&self) -> ScoringResult<InferenceEngine> {
        let path = self.ensure_local().await?;
        let artifact = self.read_artifact(&path).await?;

        if artifact.transformers.is_none() {
            if self.model.require_frozen_transformers {
                return Err(ScoringError::ModelInvalid(format!(
                    "{} carries no frozen transformers",
                    path.display()
                )));
            }
            warn!(
                path = %path.display(),
                "Artifact has no frozen transformers; preprocessing will refit on every request"
            );
        }

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let predictor = artifact.build_predictor(base_dir, self.model.onnx_threads)?;

        let extractor = match artifact.transformers {
            Some(transformers) => FeatureExtractor::with_transformers(transformers),
            None => FeatureExtractor::new(),
        }
        .with_fill_strategy(self.preprocessing.numeric_fill);

        info!(
            path = %path.display(),
            predictor = predictor.name(),
            frozen_transformers = extractor.is_frozen(),
            features = extractor.feature_count(),
            "Model loaded successfully"
        );

        Ok(InferenceEngine::new(predictor, extractor))
    }
}
