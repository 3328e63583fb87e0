//! Inference dispatch: runs the injected classifier and maps labels to verdicts

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::batch::{BatchDataset, CheckedBatch};
use crate::error::{CheckError, InferenceError};
use crate::feature_encoder::FeatureEncoder;
use crate::models::classifier::{Classifier, FeatureMatrix};
use crate::types::transaction::RawTransaction;
use crate::types::verdict::Verdict;

/// Dispatches single and bulk fraud checks to a classifier.
///
/// The classifier is loaded once at startup and injected here; the
/// dispatcher holds no other state, so one instance can serve concurrent
/// requests.
#[derive(Clone)]
pub struct InferenceDispatcher {
    classifier: Arc<dyn Classifier>,
    encoder: FeatureEncoder,
}

impl InferenceDispatcher {
    pub fn new(classifier: Arc<dyn Classifier>, encoder: FeatureEncoder) -> Self {
        info!(
            classifier = %classifier.name(),
            unknown_category = ?encoder.policy(),
            "Inference dispatcher initialized"
        );
        Self {
            classifier,
            encoder,
        }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Encode one transaction and classify it
    pub fn check_one(&self, tx: &RawTransaction) -> Result<Verdict, CheckError> {
        let start = Instant::now();

        let features = self.encoder.encode(tx)?;
        let matrix = FeatureMatrix::from_vector(&features);
        let labels = self.predict(&matrix)?;
        let verdict = Verdict::from_label(labels[0])?;

        debug!(
            verdict = ?verdict,
            amount = tx.amount,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Single check complete"
        );

        Ok(verdict)
    }

    /// Classify a table already in feature-vector shape.
    ///
    /// The table is not re-encoded. Verdict `i` belongs to row `i`. One
    /// unexpected label fails the whole batch.
    pub fn check_batch(&self, dataset: BatchDataset) -> Result<CheckedBatch, CheckError> {
        let start = Instant::now();

        let matrix = dataset.to_matrix()?;
        let labels = self.predict(&matrix)?;
        let verdicts = labels
            .into_iter()
            .map(Verdict::from_label)
            .collect::<Result<Vec<_>, _>>()?;

        let checked = CheckedBatch::new(dataset, verdicts);
        let summary = checked.summary();

        info!(
            rows = summary.rows,
            fraudulent = summary.fraudulent,
            safe = summary.safe,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Batch check complete"
        );

        Ok(checked)
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<i64>, InferenceError> {
        let labels = self.classifier.predict(matrix)?;

        if labels.len() != matrix.n_rows() {
            return Err(InferenceError::LabelCount {
                expected: matrix.n_rows(),
                found: labels.len(),
            });
        }

        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchSummary;
    use crate::error::{EncodeError, SchemaError};
    use crate::models::classifier::stub::StubClassifier;
    use crate::schema::FeatureSchema;
    use crate::types::transaction::sample_transaction;

    fn dispatcher(labels: Vec<i64>) -> (InferenceDispatcher, Arc<StubClassifier>) {
        let stub = Arc::new(StubClassifier::new(labels));
        let dispatcher = InferenceDispatcher::new(stub.clone(), FeatureEncoder::default());
        (dispatcher, stub)
    }

    fn schema_dataset(rows: usize) -> BatchDataset {
        let schema = FeatureSchema::upi();
        let rows = (0..rows)
            .map(|i| {
                let mut row = vec![0.0; schema.len()];
                row[0] = 100.0 * (i + 1) as f64;
                row[1] = 2024.0;
                row[2] = 1.0;
                row
            })
            .collect();
        BatchDataset::new(schema.columns().to_vec(), rows)
    }

    #[test]
    fn test_check_one_fraudulent() {
        let (dispatcher, stub) = dispatcher(vec![1]);
        let tx = sample_transaction();

        assert_eq!(dispatcher.check_one(&tx).unwrap(), Verdict::Fraudulent);

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].n_rows(), 1);
        let expected = FeatureEncoder::default().encode(&tx).unwrap();
        assert_eq!(seen[0].row(0), Some(expected.values()));
    }

    #[test]
    fn test_check_one_safe() {
        let (dispatcher, _) = dispatcher(vec![0]);
        assert_eq!(
            dispatcher.check_one(&sample_transaction()).unwrap(),
            Verdict::Safe
        );
    }

    #[test]
    fn test_check_one_unexpected_label() {
        let (dispatcher, _) = dispatcher(vec![2]);
        assert!(matches!(
            dispatcher.check_one(&sample_transaction()),
            Err(CheckError::UnexpectedLabel(2))
        ));
    }

    #[test]
    fn test_check_one_unknown_category_never_reaches_classifier() {
        let (dispatcher, stub) = dispatcher(vec![0]);
        let mut tx = sample_transaction();
        tx.merchant_category = "Groceries".to_string();

        assert!(matches!(
            dispatcher.check_one(&tx),
            Err(CheckError::Encode(EncodeError::UnknownCategory { .. }))
        ));
        assert!(stub.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_check_batch_preserves_row_order() {
        let (dispatcher, _) = dispatcher(vec![0, 1, 0]);
        let dataset = schema_dataset(3);

        let checked = dispatcher.check_batch(dataset.clone()).unwrap();

        assert_eq!(checked.len(), 3);
        assert_eq!(
            checked.verdicts(),
            &[Verdict::Safe, Verdict::Fraudulent, Verdict::Safe]
        );
        assert_eq!(checked.dataset(), &dataset);
        let amounts: Vec<f64> = checked.iter().map(|(row, _)| row[0]).collect();
        assert_eq!(amounts, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_check_batch_header_only_table() {
        let (dispatcher, stub) = dispatcher(vec![]);

        let checked = dispatcher.check_batch(schema_dataset(0)).unwrap();

        assert!(checked.is_empty());
        assert_eq!(checked.summary(), BatchSummary::default());
        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].n_rows(), 0);
        assert_eq!(seen[0].n_cols(), 53);
    }

    #[test]
    fn test_classifier_name() {
        let (dispatcher, _) = dispatcher(vec![]);
        assert_eq!(dispatcher.classifier_name(), "stub");
    }

    #[test]
    fn test_check_batch_rejects_misordered_columns() {
        let (dispatcher, _) = dispatcher(vec![0]);
        let mut columns = FeatureSchema::upi().columns().to_vec();
        columns.swap(3, 4);
        let dataset = BatchDataset::new(columns, schema_dataset(1).rows().to_vec());

        assert!(matches!(
            dispatcher.check_batch(dataset),
            Err(CheckError::Inference(InferenceError::Schema(
                SchemaError::ColumnMismatch { position: 3, .. }
            )))
        ));
    }

    #[test]
    fn test_check_batch_rejects_missing_columns() {
        let (dispatcher, _) = dispatcher(vec![0]);
        let dataset = BatchDataset::new(
            vec!["amount".to_string(), "Year".to_string(), "Month".to_string()],
            vec![vec![10.0, 2024.0, 3.0]],
        );

        assert!(matches!(
            dispatcher.check_batch(dataset),
            Err(CheckError::Inference(InferenceError::Schema(
                SchemaError::WidthMismatch {
                    expected: 53,
                    found: 3
                }
            )))
        ));
    }

    #[test]
    fn test_check_batch_label_count_mismatch() {
        let (dispatcher, _) = dispatcher(vec![0, 1]);

        assert!(matches!(
            dispatcher.check_batch(schema_dataset(3)),
            Err(CheckError::Inference(InferenceError::LabelCount {
                expected: 3,
                found: 2
            }))
        ));
    }

    #[test]
    fn test_check_batch_unexpected_label_fails_whole_batch() {
        let (dispatcher, _) = dispatcher(vec![0, 7, 1]);

        assert!(matches!(
            dispatcher.check_batch(schema_dataset(3)),
            Err(CheckError::UnexpectedLabel(7))
        ));
    }
}
