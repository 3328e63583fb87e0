//! UPI Fraud Check Library
//!
//! Encodes raw UPI transaction attributes into the fixed feature vector a
//! pre-trained fraud classifier expects, and dispatches single and bulk checks
//! to that classifier.

pub mod batch;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_encoder;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod schema;
pub mod service;
pub mod types;

pub use batch::{BatchDataset, CheckedBatch};
pub use config::AppConfig;
pub use error::{CheckError, EncodeError, InferenceError, SchemaError};
pub use feature_encoder::{FeatureEncoder, FeatureVector, UnknownCategoryPolicy};
pub use models::classifier::{Classifier, FeatureMatrix};
pub use models::inference::InferenceDispatcher;
pub use schema::{CategoryFamily, FeatureSchema};
pub use types::{transaction::RawTransaction, verdict::Verdict};
