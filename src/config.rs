//! Configuration management for the fraud scoring service

use crate::features::FillStrategy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "FRAUD_SCORER_CONFIG";

/// Default Google Drive direct-download URL; `{id}` is replaced by the
/// configured remote identifier.
pub const DEFAULT_REMOTE_URL_TEMPLATE: &str = "https://drive.google.com/uc?export=download&id={id}";

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Local artifact path
    pub path: PathBuf,
    /// Remote identifier fetched when the local artifact is absent. Unset by
    /// default, which disables fetching.
    #[serde(default)]
    pub remote_id: Option<String>,
    /// Download URL with an `{id}` placeholder
    #[serde(default = "default_remote_url_template")]
    pub remote_url_template: String,
    /// Timeout for the remote fetch in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Exit at startup when the model cannot be loaded, instead of serving
    /// errors and retrying on each request
    #[serde(default)]
    pub fail_fast: bool,
    /// Reject artifacts without frozen preprocessing parameters
    #[serde(default)]
    pub require_frozen_transformers: bool,
    /// Intra-op threads for ONNX inference
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_remote_url_template() -> String {
    DEFAULT_REMOTE_URL_TEMPLATE.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/fraud_model.json"),
            remote_id: None,
            remote_url_template: default_remote_url_template(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fail_fast: false,
            require_frozen_transformers: false,
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Preprocessing configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PreprocessingConfig {
    /// Replacement for non-finite numeric features
    #[serde(default)]
    pub numeric_fill: FillStrategy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error); RUST_LOG wins
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from the file named by `FRAUD_SCORER_CONFIG`,
    /// falling back to `config/config.toml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config.toml".into());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, with
    /// `FRAUD_SCORER__SECTION__KEY` environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("FRAUD_SCORER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Download URL for the configured remote artifact, if any.
    pub fn remote_url(&self) -> Option<String> {
        self.model.remote_url()
    }
}

impl ModelConfig {
    pub fn remote_url(&self) -> Option<String> {
        self.remote_id
            .as_deref()
            .map(|id| self.remote_url_template.replace("{id}", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.model.path, PathBuf::from("models/fraud_model.json"));
        assert!(!config.model.fail_fast);
        assert_eq!(config.preprocessing.numeric_fill, FillStrategy::Zero);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.remote_url(), None);
    }

    #[test]
    fn test_remote_url_template() {
        let model = ModelConfig {
            remote_id: Some("abc123".to_string()),
            ..Default::default()
        };
        assert_eq!(
            model.remote_url().unwrap(),
            "https://drive.google.com/uc?export=download&id=abc123"
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "0.0.0.0:9000"

[model]
path = "/tmp/model.json"
remote_id = "xyz"
fail_fast = true

[preprocessing]
numeric_fill = "median"

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.model.remote_id.as_deref(), Some("xyz"));
        assert!(config.model.fail_fast);
        assert_eq!(config.model.fetch_timeout_secs, 60);
        assert_eq!(config.preprocessing.numeric_fill, FillStrategy::Median);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.metrics.report_interval_secs, 60);
    }

    #[test]
    fn test_shipped_config_disables_remote_fetch() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
        let config = AppConfig::load_from_path(path).unwrap();

        assert_eq!(config.model.remote_id, None);
        assert_eq!(config.remote_url(), None);
        assert_eq!(config.model.path, PathBuf::from("models/fraud_model.json"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load_from_path("/nonexistent/fraud-scorer.toml").is_err());
    }
}
