//! Raw UPI transaction as entered by a user or submitted over the wire

use serde::{Deserialize, Serialize};

use crate::error::CheckError;
use crate::schema::CategoryFamily;

/// Upper bound on the amount accepted by the entry form (INR)
pub const MAX_AMOUNT: f64 = 500_000.0;

/// Accepted transaction years
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

/// Human-entered transaction attributes, prior to encoding.
///
/// Categorical fields are kept as strings so that out-of-domain input from a
/// non-form surface reaches the encoder and is handled by its policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Transaction amount (INR)
    pub amount: f64,

    /// Transaction year
    pub year: i32,

    /// Transaction month (1-12)
    pub month: u32,

    /// One of the transaction type domain members
    pub transaction_type: String,

    /// One of the payment gateway domain members
    pub payment_gateway: String,

    /// One of the 27 state names
    pub transaction_state: String,

    /// One of the merchant category domain members
    pub merchant_category: String,
}

impl RawTransaction {
    /// Categorical value supplied for `family`
    pub fn category(&self, family: CategoryFamily) -> &str {
        match family {
            CategoryFamily::TransactionType => &self.transaction_type,
            CategoryFamily::PaymentGateway => &self.payment_gateway,
            CategoryFamily::TransactionState => &self.transaction_state,
            CategoryFamily::MerchantCategory => &self.merchant_category,
        }
    }

    /// Check the numeric bounds the entry form enforces.
    ///
    /// Categorical membership is left to the encoder.
    pub fn validate(&self) -> Result<(), CheckError> {
        if !self.amount.is_finite() || !(0.0..=MAX_AMOUNT).contains(&self.amount) {
            return Err(CheckError::InvalidField {
                field: "amount",
                reason: format!("{} is outside 0..={}", self.amount, MAX_AMOUNT),
            });
        }

        if !YEAR_RANGE.contains(&self.year) {
            return Err(CheckError::InvalidField {
                field: "year",
                reason: format!(
                    "{} is outside {}..={}",
                    self.year,
                    YEAR_RANGE.start(),
                    YEAR_RANGE.end()
                ),
            });
        }

        if !(1..=12).contains(&self.month) {
            return Err(CheckError::InvalidField {
                field: "month",
                reason: format!("{} is not a calendar month", self.month),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_transaction() -> RawTransaction {
    RawTransaction {
        amount: 1500.0,
        year: 2024,
        month: 6,
        transaction_type: "Purchase".to_string(),
        payment_gateway: "UPI Pay".to_string(),
        transaction_state: "Karnataka".to_string(),
        merchant_category: "Purchases".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_wire_names() {
        let json = r#"{
            "amount": 1500.0,
            "year": 2024,
            "month": 6,
            "transactionType": "Purchase",
            "paymentGateway": "UPI Pay",
            "transactionState": "Karnataka",
            "merchantCategory": "Purchases"
        }"#;

        let tx: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx, sample_transaction());
    }

    #[test]
    fn test_category_accessor() {
        let tx = sample_transaction();
        assert_eq!(tx.category(CategoryFamily::PaymentGateway), "UPI Pay");
        assert_eq!(tx.category(CategoryFamily::TransactionState), "Karnataka");
    }

    #[test]
    fn test_validate_bounds() {
        assert!(sample_transaction().validate().is_ok());

        let mut tx = sample_transaction();
        tx.amount = MAX_AMOUNT;
        assert!(tx.validate().is_ok());
        tx.amount = 500_000.01;
        assert!(matches!(
            tx.validate(),
            Err(CheckError::InvalidField { field: "amount", .. })
        ));

        let mut tx = sample_transaction();
        tx.year = 1999;
        assert!(matches!(
            tx.validate(),
            Err(CheckError::InvalidField { field: "year", .. })
        ));

        let mut tx = sample_transaction();
        tx.month = 13;
        assert!(matches!(
            tx.validate(),
            Err(CheckError::InvalidField { field: "month", .. })
        ));
    }
}
