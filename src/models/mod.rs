//! Classifier capability, ONNX loading and inference dispatch

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod onnx;

pub use classifier::{Classifier, FeatureMatrix};
pub use inference::InferenceDispatcher;
pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
