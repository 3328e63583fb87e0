//! Configuration management for the fraud check service

use crate::feature_encoder::UnknownCategoryPolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub encoding: EncodingConfig,
    pub nats: NatsConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// Classifier model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX classifier
    pub path: String,
    /// Feature manifest exported with the model
    #[serde(default)]
    pub manifest: Option<String>,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Fraud probability cut-off for models without a label output
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_decision_threshold() -> f64 {
    0.5
}

/// Feature encoding configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncodingConfig {
    /// Handling of categorical values outside their domain
    #[serde(default)]
    pub unknown_category: UnknownCategoryPolicy,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming check requests
    pub check_subject: String,
    /// Subject every check response is published to
    pub verdict_subject: String,
}

/// Serving configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Maximum checks in flight
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a specific path.
    ///
    /// `UPI_FRAUD__SECTION__KEY` environment variables override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("UPI_FRAUD")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                path: "models/upi_fraud_detection.onnx".to_string(),
                manifest: Some("models/feature_info.json".to_string()),
                onnx_threads: 1,
                decision_threshold: 0.5,
            },
            encoding: EncodingConfig::default(),
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                check_subject: "upi.checks".to_string(),
                verdict_subject: "upi.verdicts".to_string(),
            },
            service: ServiceConfig {
                workers: 4,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
