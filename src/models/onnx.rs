//! ONNX Runtime implementation of the classifier capability

use anyhow::Result;
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::InferenceError;
use crate::models::classifier::{Classifier, FeatureMatrix};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::schema::FeatureSchema;

/// Binary classifier backed by an ONNX session.
///
/// A session run needs exclusive access, so the session sits behind a mutex;
/// everything else is read-only after load.
pub struct OnnxClassifier {
    name: String,
    model: Mutex<LoadedModel>,
    schema: &'static FeatureSchema,
    decision_threshold: f64,
}

impl OnnxClassifier {
    /// Load the configured model and validate it against the schema
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let schema = FeatureSchema::upi();
        let loader = ModelLoader::with_threads(config.onnx_threads)?;

        if let Some(manifest) = &config.manifest {
            loader.check_manifest(manifest, schema)?;
        }
        let model = loader.load_model(Path::new(&config.path), schema)?;

        Ok(Self {
            name: model.name.clone(),
            model: Mutex::new(model),
            schema,
            decision_threshold: config.decision_threshold,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<i64>, InferenceError> {
        self.schema.validate_columns(matrix.columns())?;

        let n_rows = matrix.n_rows();
        if n_rows == 0 {
            return Ok(Vec::new());
        }

        // Prepare input tensor - shape [rows, features]
        let shape = vec![n_rows as i64, matrix.n_cols() as i64];
        let input_tensor = Tensor::from_array((shape, matrix.to_f32()))
            .map_err(|e| InferenceError::Runtime(format!("failed to create input tensor: {e}")))?;

        let mut model = self
            .model
            .lock()
            .map_err(|e| InferenceError::Runtime(format!("session lock poisoned: {e}")))?;
        let LoadedModel {
            session,
            input_name,
            label_output,
            probability_output,
            ..
        } = &mut *model;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        if let Some(name) = label_output.as_deref() {
            let output = outputs
                .get(name)
                .ok_or_else(|| InferenceError::Runtime(format!("missing output {name}")))?;
            let (_, data) = output
                .try_extract_tensor::<i64>()
                .map_err(|e| InferenceError::Runtime(format!("label output: {e}")))?;

            debug!(model = %self.name, rows = n_rows, "Extracted labels");
            return Ok(data.to_vec());
        }

        if let Some(name) = probability_output.as_deref() {
            let output = outputs
                .get(name)
                .ok_or_else(|| InferenceError::Runtime(format!("missing output {name}")))?;
            // sklearn-onnx ZipMap exports emit seq(map(int64, float))
            if DynSequenceValueType::can_downcast(&output.dtype()) {
                let maps = extract_class_maps(output)?;
                let labels = labels_from_class_maps(&maps, n_rows, self.decision_threshold)?;
                debug!(model = %self.name, rows = n_rows, "Thresholded seq(map) probabilities");
                return Ok(labels);
            }

            let (shape, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Runtime(format!("probability output: {e}")))?;

            let dims: Vec<i64> = shape.iter().copied().collect();
            let labels = labels_from_probabilities(&dims, data, n_rows, self.decision_threshold)?;
            debug!(model = %self.name, rows = n_rows, "Thresholded probabilities");
            return Ok(labels);
        }

        Err(InferenceError::Runtime(
            "model has no usable output".to_string(),
        ))
    }
}

/// Turn a `[rows, classes]` or `[rows]` probability tensor into labels
fn labels_from_probabilities(
    dims: &[i64],
    data: &[f32],
    n_rows: usize,
    threshold: f64,
) -> Result<Vec<i64>, InferenceError> {
    let n_classes = match dims {
        [rows, classes] if *rows as usize == n_rows && *classes > 0 => *classes as usize,
        [rows] if *rows as usize == n_rows => 1,
        _ => {
            return Err(InferenceError::Runtime(format!(
                "unexpected probability shape {dims:?} for {n_rows} rows"
            )))
        }
    };

    if data.len() != n_rows * n_classes {
        return Err(InferenceError::Runtime(format!(
            "probability output holds {} values, shape {dims:?} needs {}",
            data.len(),
            n_rows * n_classes
        )));
    }

    // Fraud is class 1; a single column is already the fraud probability
    let fraud_col = if n_classes >= 2 { 1 } else { 0 };

    Ok((0..n_rows)
        .map(|row| {
            let prob = data[row * n_classes + fraud_col] as f64;
            i64::from(prob >= threshold)
        })
        .collect())
}

/// Read a seq(map(int64, float)) output as one class map per row
fn extract_class_maps(output: &DynValue) -> Result<Vec<Vec<(i64, f32)>>, InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| InferenceError::Runtime(format!("probability sequence: {e}")))?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| InferenceError::Runtime(format!("probability sequence: {e}")))?;

    maps.iter()
        .map(|map| {
            map.try_extract_key_values::<i64, f32>()
                .map_err(|e| InferenceError::Runtime(format!("probability map: {e}")))
        })
        .collect()
}

/// Threshold per-row class maps on the fraud probability
///
/// Uses class 1 when present, otherwise one minus class 0.
fn labels_from_class_maps(
    maps: &[Vec<(i64, f32)>],
    n_rows: usize,
    threshold: f64,
) -> Result<Vec<i64>, InferenceError> {
    if maps.len() != n_rows {
        return Err(InferenceError::Runtime(format!(
            "probability sequence holds {} maps for {n_rows} rows",
            maps.len()
        )));
    }

    maps.iter()
        .enumerate()
        .map(|(row, pairs)| {
            let class_prob = |class: i64| {
                pairs
                    .iter()
                    .find(|(id, _)| *id == class)
                    .map(|(_, p)| *p as f64)
            };
            let prob = class_prob(1)
                .or_else(|| class_prob(0).map(|p| 1.0 - p))
                .ok_or_else(|| {
                    InferenceError::Runtime(format!("no class probability in map for row {row}"))
                })?;
            Ok(i64::from(prob >= threshold))
        })
        .collect()
}
