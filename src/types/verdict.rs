//! Verdicts and the check request/response messages carried over NATS

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CheckError;
use crate::types::transaction::RawTransaction;

/// Binary outcome of a fraud check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Fraudulent,
    Safe,
}

impl Verdict {
    /// Map a classifier label (1 = fraud, 0 = legitimate)
    pub fn from_label(label: i64) -> Result<Self, CheckError> {
        match label {
            1 => Ok(Verdict::Fraudulent),
            0 => Ok(Verdict::Safe),
            other => Err(CheckError::UnexpectedLabel(other)),
        }
    }

    pub fn is_fraud(self) -> bool {
        self == Verdict::Fraudulent
    }

    /// Message shown for a single interactive check
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Fraudulent => "Fraudulent Transaction Detected!",
            Verdict::Safe => "Transaction is Safe!",
        }
    }

    /// Cell value for the batch status column
    pub fn status(self) -> &'static str {
        match self {
            Verdict::Fraudulent => "🚨 Fraud",
            Verdict::Safe => "✅ Safe",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Check request received on the check subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Caller-supplied correlation id; generated when absent
    #[serde(default)]
    pub request_id: Option<String>,

    pub transaction: RawTransaction,
}

/// Outcome published for every check request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub request_id: String,

    /// Set when the check succeeded
    pub verdict: Option<Verdict>,

    /// Set when the check failed
    pub error: Option<String>,

    pub processing_time_us: u64,

    pub timestamp: DateTime<Utc>,
}

impl CheckResponse {
    pub fn verdict(request_id: String, verdict: Verdict, processing_time_us: u64) -> Self {
        Self {
            request_id,
            verdict: Some(verdict),
            error: None,
            processing_time_us,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(request_id: String, error: String, processing_time_us: u64) -> Self {
        Self {
            request_id,
            verdict: None,
            error: Some(error),
            processing_time_us,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_label() {
        assert_eq!(Verdict::from_label(1).unwrap(), Verdict::Fraudulent);
        assert_eq!(Verdict::from_label(0).unwrap(), Verdict::Safe);
        assert!(matches!(
            Verdict::from_label(2),
            Err(CheckError::UnexpectedLabel(2))
        ));
        assert!(matches!(
            Verdict::from_label(-1),
            Err(CheckError::UnexpectedLabel(-1))
        ));
    }

    #[test]
    fn test_verdict_strings() {
        assert_eq!(Verdict::Fraudulent.status(), "🚨 Fraud");
        assert_eq!(Verdict::Safe.status(), "✅ Safe");
        assert_eq!(Verdict::Safe.to_string(), "Transaction is Safe!");
    }

    #[test]
    fn test_check_request_without_id() {
        let json = r#"{"transaction": {
            "amount": 10.0, "year": 2023, "month": 1,
            "transactionType": "Refund", "paymentGateway": "Other",
            "transactionState": "Goa", "merchantCategory": "Other"
        }}"#;

        let request: CheckRequest = serde_json::from_str(json).unwrap();
        assert!(request.request_id.is_none());
        assert_eq!(request.transaction.transaction_state, "Goa");
    }

    #[test]
    fn test_check_response_serialization() {
        let response = CheckResponse::verdict("req-1".to_string(), Verdict::Fraudulent, 42);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["request_id"], "req-1");
        assert_eq!(json["verdict"], "fraudulent");
        assert!(json["error"].is_null());
    }
}
