//! Process-wide, load-once model handle

use super::inference::InferenceEngine;
use super::loader::ModelLoader;
use crate::error::ScoringResult;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::error;

/// Owns the loaded model for the lifetime of the process.
///
/// Concurrent first callers wait on a single load. A failed load leaves the
/// handle empty, so the next call tries again.
pub struct ModelHandle {
    loader: ModelLoader,
    engine: OnceCell<Arc<InferenceEngine>>,
}

impl ModelHandle {
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            engine: OnceCell::new(),
        }
    }

    /// The loaded engine, loading it first if needed.
    pub async fn get(&self) -> ScoringResult<Arc<InferenceEngine>> {
        self.engine
            .get_or_try_init(|| async {
                match self.loader.load().await {
                    Ok(engine) => Ok(Arc::new(engine)),
                    Err(e) => {
                        error!(
                            path = %self.loader.model_path().display(),
                            error = %e,
                            "Model load failed"
                        );
                        Err(e)
                    }
                }
            })
            .await
            .cloned()
    }

    /// The engine if it has been loaded, without attempting a load.
    pub fn loaded(&self) -> Option<Arc<InferenceEngine>> {
        self.engine.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, PreprocessingConfig};
    use crate::models::artifact::tests::logistic_artifact;
    use std::path::Path;

    fn loader(path: &Path) -> ModelLoader {
        let config = ModelConfig {
            path: path.to_path_buf(),
            ..Default::default()
        };
        ModelLoader::new(config, PreprocessingConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, logistic_artifact(None).to_json().unwrap()).unwrap();

        let handle = Arc::new(ModelHandle::new(loader(&path)));
        assert!(!handle.is_loaded());

        let (a, b) = tokio::join!(handle.get(), handle.get());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));

        // Later calls reuse the engine even if the file disappears
        std::fs::remove_file(&path).unwrap();
        let c = handle.get().await.unwrap();
        assert!(Arc::ptr_eq(&a, &c));
        assert!(handle.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let handle = ModelHandle::new(loader(&path));
        assert_eq!(handle.get().await.err().unwrap().kind(), "model_invalid");
        assert!(handle.loaded().is_none());

        std::fs::write(&path, logistic_artifact(None).to_json().unwrap()).unwrap();
        assert!(handle.get().await.is_ok());
        assert!(handle.loaded().is_some());
    }
}
