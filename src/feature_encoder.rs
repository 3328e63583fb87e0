//! Feature encoding for the UPI fraud classifier.
//!
//! Turns a [`RawTransaction`] into the 53-column vector the classifier was
//! trained on: `amount`, `Year`, `Month` copied through, then one 0/1
//! indicator per member of each categorical family, in [`FeatureSchema::upi`]
//! order.

use serde::Deserialize;
use tracing::warn;

use crate::error::EncodeError;
use crate::schema::{CategoryFamily, FeatureSchema};
use crate::types::transaction::RawTransaction;

/// What to do with a categorical value outside its domain
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Fail with [`EncodeError::UnknownCategory`]
    #[default]
    Reject,
    /// Leave every indicator in the family at 0
    ZeroFill,
}

/// Encoded feature vector, laid out by [`FeatureSchema::upi`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    fn zeroed(schema: &FeatureSchema) -> Self {
        Self {
            values: vec![0.0; schema.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn columns(&self) -> &'static [String] {
        FeatureSchema::upi().columns()
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        FeatureSchema::upi()
            .index_of(column)
            .map(|idx| self.values[idx])
    }

    /// Indicator block of one family
    pub fn block(&self, family: CategoryFamily) -> &[f64] {
        &self.values[FeatureSchema::upi().block(family)]
    }

    /// `(column, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Encoder from raw transactions to classifier features.
///
/// Stateless apart from the unknown-category policy; `encode` is pure.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    policy: UnknownCategoryPolicy,
}

impl FeatureEncoder {
    pub fn new(policy: UnknownCategoryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnknownCategoryPolicy {
        self.policy
    }

    /// Number of features produced
    pub fn feature_count(&self) -> usize {
        FeatureSchema::upi().len()
    }

    pub fn feature_names(&self) -> &'static [String] {
        FeatureSchema::upi().columns()
    }

    /// Encode a transaction.
    ///
    /// Numeric fields are not scaled or normalised.
    pub fn encode(&self, tx: &RawTransaction) -> Result<FeatureVector, EncodeError> {
        let schema = FeatureSchema::upi();
        let mut features = FeatureVector::zeroed(schema);

        features.values[0] = tx.amount;
        features.values[1] = f64::from(tx.year);
        features.values[2] = f64::from(tx.month);

        for family in CategoryFamily::ALL {
            let value = tx.category(family);
            match family.position(value) {
                Some(offset) => {
                    features.values[schema.block(family).start + offset] = 1.0;
                }
                None => match self.policy {
                    UnknownCategoryPolicy::Reject => {
                        return Err(EncodeError::UnknownCategory {
                            family,
                            value: value.to_string(),
                        });
                    }
                    UnknownCategoryPolicy::ZeroFill => {
                        warn!(
                            family = %family,
                            value = %value,
                            "Unknown category, indicator block left at zero"
                        );
                    }
                },
            }
        }

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::sample_transaction;

    fn assert_one_hot(features: &FeatureVector) {
        for family in CategoryFamily::ALL {
            let block = features.block(family);
            assert_eq!(block.len(), family.members().len());
            assert_eq!(block.iter().filter(|&&v| v == 1.0).count(), 1, "{family}");
            assert!(block.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn test_karnataka_purchase() {
        let encoder = FeatureEncoder::default();
        let features = encoder.encode(&sample_transaction()).unwrap();

        assert_eq!(features.len(), 53);
        assert_eq!(features.get("amount"), Some(1500.0));
        assert_eq!(features.get("Year"), Some(2024.0));
        assert_eq!(features.get("Month"), Some(6.0));
        assert_eq!(features.get("Transaction_Type_Purchase"), Some(1.0));
        assert_eq!(features.get("Payment_Gateway_UPI Pay"), Some(1.0));
        assert_eq!(features.get("Transaction_State_Karnataka"), Some(1.0));
        assert_eq!(features.get("Merchant_Category_Purchases"), Some(1.0));

        let hot: Vec<&str> = features
            .iter()
            .skip(3)
            .filter(|(_, v)| *v == 1.0)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            hot,
            vec![
                "Transaction_Type_Purchase",
                "Payment_Gateway_UPI Pay",
                "Transaction_State_Karnataka",
                "Merchant_Category_Purchases",
            ]
        );
    }

    #[test]
    fn test_one_hot_for_every_member() {
        let encoder = FeatureEncoder::default();

        for family in CategoryFamily::ALL {
            for member in family.members() {
                let mut tx = sample_transaction();
                match family {
                    CategoryFamily::TransactionType => tx.transaction_type = member.to_string(),
                    CategoryFamily::PaymentGateway => tx.payment_gateway = member.to_string(),
                    CategoryFamily::TransactionState => tx.transaction_state = member.to_string(),
                    CategoryFamily::MerchantCategory => tx.merchant_category = member.to_string(),
                }

                let features = encoder.encode(&tx).unwrap();
                assert_one_hot(&features);
                assert_eq!(features.get(&family.column_name(member)), Some(1.0));
            }
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = FeatureEncoder::default();
        let tx = sample_transaction();
        assert_eq!(encoder.encode(&tx).unwrap(), encoder.encode(&tx).unwrap());
    }

    #[test]
    fn test_numeric_passthrough() {
        let encoder = FeatureEncoder::default();
        let mut tx = sample_transaction();
        tx.amount = 499_999.99;
        tx.year = 2100;
        tx.month = 12;

        let features = encoder.encode(&tx).unwrap();
        assert_eq!(&features.values()[..3], &[499_999.99, 2100.0, 12.0]);
    }

    #[test]
    fn test_column_order_is_stable() {
        let encoder = FeatureEncoder::default();
        let features = encoder.encode(&sample_transaction()).unwrap();
        let names: Vec<&str> = features.iter().map(|(name, _)| name).collect();

        assert_eq!(names.len(), encoder.feature_count());
        assert_eq!(names, encoder.feature_names().iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_category_rejected_by_default() {
        let encoder = FeatureEncoder::default();
        let mut tx = sample_transaction();
        tx.payment_gateway = "upi pay".to_string();

        assert_eq!(
            encoder.encode(&tx),
            Err(EncodeError::UnknownCategory {
                family: CategoryFamily::PaymentGateway,
                value: "upi pay".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_category_zero_fill() {
        let encoder = FeatureEncoder::new(UnknownCategoryPolicy::ZeroFill);
        let mut tx = sample_transaction();
        tx.transaction_state = "Karnataka ".to_string();

        let features = encoder.encode(&tx).unwrap();
        assert!(features
            .block(CategoryFamily::TransactionState)
            .iter()
            .all(|&v| v == 0.0));
        assert_eq!(features.get("Payment_Gateway_UPI Pay"), Some(1.0));
        assert_eq!(features.len(), 53);
    }
}
