//! Bulk check tables.
//!
//! A batch table must already be in feature-vector shape: the same 53
//! columns, in the same order, as [`FeatureSchema::upi`](crate::schema::FeatureSchema::upi).
//! It is not re-encoded. The classifier boundary rejects tables whose header
//! drifts from the schema.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{BatchError, InferenceError};
use crate::models::classifier::FeatureMatrix;
use crate::types::verdict::Verdict;

/// Name of the verdict column appended to checked tables
pub const STATUS_COLUMN: &str = "Fraud Status";

/// Numeric table submitted for bulk checking
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDataset {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl BatchDataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { columns, rows }
    }

    /// Read a CSV table with a header row
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, BatchError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, BatchError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            // Cells only: header names must match the schema byte for byte
            .trim(csv::Trim::Fields)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() {
            return Err(BatchError::MissingHeader);
        }

        let mut rows = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let values = record
                .iter()
                .zip(&columns)
                .map(|(cell, column)| {
                    cell.parse::<f64>().map_err(|_| BatchError::NotNumeric {
                        row,
                        column: column.clone(),
                        value: cell.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, BatchError>>()?;
            rows.push(values);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Matrix over the table's own columns, unchanged
    pub fn to_matrix(&self) -> Result<FeatureMatrix, InferenceError> {
        FeatureMatrix::new(self.columns.clone(), &self.rows)
    }
}

/// Batch table annotated with one verdict per row
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedBatch {
    dataset: BatchDataset,
    verdicts: Vec<Verdict>,
}

/// Verdict counts for a checked batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub fraudulent: usize,
    pub safe: usize,
}

impl CheckedBatch {
    /// `verdicts[i]` belongs to row `i`; callers guarantee equal lengths.
    pub(crate) fn new(dataset: BatchDataset, verdicts: Vec<Verdict>) -> Self {
        debug_assert_eq!(dataset.len(), verdicts.len());
        Self { dataset, verdicts }
    }

    pub fn dataset(&self) -> &BatchDataset {
        &self.dataset
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// Rows paired with their verdicts, in input order
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], Verdict)> + '_ {
        self.dataset
            .rows
            .iter()
            .map(Vec::as_slice)
            .zip(self.verdicts.iter().copied())
    }

    pub fn summary(&self) -> BatchSummary {
        let fraudulent = self.verdicts.iter().filter(|v| v.is_fraud()).count();
        BatchSummary {
            rows: self.verdicts.len(),
            fraudulent,
            safe: self.verdicts.len() - fraudulent,
        }
    }

    /// Write the original columns plus the status column
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), BatchError> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = self.dataset.columns.iter().map(String::as_str).collect();
        header.push(STATUS_COLUMN);
        wtr.write_record(&header)?;

        for (values, verdict) in self.iter() {
            let mut record: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            record.push(verdict.status().to_string());
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}
