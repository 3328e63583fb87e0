//! ONNX model loader with startup schema validation

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::ValueType;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::schema::FeatureSchema;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the feature tensor
    pub input_name: String,
    /// Output carrying predicted class labels
    pub label_output: Option<String>,
    /// Output carrying class probabilities
    pub probability_output: Option<String>,
}

/// Feature manifest exported alongside the model
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureManifest {
    #[serde(default)]
    pub schema_version: Option<String>,
    pub feature_names: Vec<String>,
}

impl FeatureManifest {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature manifest {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse feature manifest {}", path.display()))
    }

    /// Fail unless the manifest describes exactly `schema`
    pub fn validate(&self, schema: &FeatureSchema) -> Result<()> {
        if let Some(version) = &self.schema_version {
            schema
                .validate_version(version)
                .context("Feature manifest was exported for a different schema")?;
        }
        schema
            .validate_columns(self.feature_names.as_slice())
            .context("Feature manifest does not match the encoder schema")?;
        Ok(())
    }
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a classifier model and check its input against `schema`
    pub fn load_model<P: AsRef<Path>>(&self, path: P, schema: &FeatureSchema) -> Result<LoadedModel> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classifier".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input = session
            .inputs
            .first()
            .context("Model declares no inputs")?;
        let input_name = input.name.clone();
        let input_width = static_width(&input.input_type);

        if let Some(width) = input_width {
            if width != schema.len() {
                anyhow::bail!(
                    "Model {} expects {} features, schema {} has {}",
                    name,
                    width,
                    schema.version(),
                    schema.len()
                );
            }
        } else {
            warn!(model = %name, "Model input width is dynamic, relying on column checks");
        }

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        if label_output.is_none() && probability_output.is_none() {
            anyhow::bail!("Model {} exposes neither a label nor a probability output", name);
        }

        info!(
            model = %name,
            input = %input_name,
            label_output = ?label_output,
            probability_output = ?probability_output,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            label_output,
            probability_output,
        })
    }

    /// Validate the feature manifest if one is present
    pub fn check_manifest<P: AsRef<Path>>(&self, path: P, schema: &FeatureSchema) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Feature manifest not found, skipping column check");
            return Ok(());
        }

        FeatureManifest::from_path(path)?.validate(schema)?;
        info!(
            path = %path.display(),
            schema = %schema.version(),
            "Feature manifest matches schema"
        );
        Ok(())
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}

/// Last dimension of a tensor input, if it is fixed
fn static_width(value_type: &ValueType) -> Option<usize> {
    match value_type {
        ValueType::Tensor { shape, .. } => shape
            .iter()
            .copied()
            .last()
            .filter(|&d| d > 0)
            .map(|d| d as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(names: Vec<String>, version: Option<&str>) -> FeatureManifest {
        FeatureManifest {
            schema_version: version.map(str::to_string),
            feature_names: names,
        }
    }

    #[test]
    fn test_manifest_matches_schema() {
        let schema = FeatureSchema::upi();
        let m = manifest(schema.columns().to_vec(), Some("upi-fraud-v1"));
        assert!(m.validate(schema).is_ok());
    }

    #[test]
    fn test_manifest_column_drift_is_an_error() {
        let schema = FeatureSchema::upi();
        let mut names = schema.columns().to_vec();
        names[20] = "Transaction_State_Delhi".to_string();

        let err = manifest(names, None).validate(schema).unwrap_err();
        assert!(format!("{err:#}").contains("Transaction_State_Delhi"));
    }

    #[test]
    fn test_manifest_version_mismatch() {
        let schema = FeatureSchema::upi();
        let m = manifest(schema.columns().to_vec(), Some("upi-fraud-v0"));
        assert!(m.validate(schema).is_err());
    }

    #[test]
    fn test_manifest_json() {
        let json = r#"{"schema_version": "upi-fraud-v1", "feature_names": ["amount", "Year"]}"#;
        let m: FeatureManifest = serde_json::from_str(json).unwrap();
        assert_eq!(m.feature_names, vec!["amount", "Year"]);
        assert!(m.validate(FeatureSchema::upi()).is_err());
    }

    #[test]
    fn test_missing_manifest_is_skipped() {
        let loader = ModelLoader::default();
        assert!(loader
            .check_manifest("does/not/exist.json", FeatureSchema::upi())
            .is_ok());
    }
}
