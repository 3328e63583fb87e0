//! Canonical feature schema for the UPI fraud classifier.
//!
//! The classifier was trained on a 53-column frame: three numeric columns
//! followed by one-hot indicator blocks for four categorical families. Column
//! names and order here must match the training frame byte-for-byte. Both the
//! encoder and the model loader validate against [`FeatureSchema::upi`].

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Version tag written into the feature manifest at export time.
pub const SCHEMA_VERSION: &str = "upi-fraud-v1";

/// Numeric columns, copied through unchanged.
pub const NUMERIC_COLUMNS: [&str; 3] = ["amount", "Year", "Month"];

const TRANSACTION_TYPES: &[&str] = &[
    "Bill Payment",
    "Investment",
    "Other",
    "Purchase",
    "Refund",
    "Subscription",
];

const PAYMENT_GATEWAYS: &[&str] = &[
    "Bank of Data",
    "CReditPAY",
    "Dummy Bank",
    "Gamma Bank",
    "Other",
    "SamplePay",
    "Sigma Bank",
    "UPI Pay",
];

const TRANSACTION_STATES: &[&str] = &[
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

const MERCHANT_CATEGORIES: &[&str] = &[
    "Donations and Devotion",
    "Financial services and Taxes",
    "Home delivery",
    "Investment",
    "More Services",
    "Other",
    "Purchases",
    "Travel bookings",
    "Utilities",
];

/// A closed categorical attribute of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFamily {
    TransactionType,
    PaymentGateway,
    TransactionState,
    MerchantCategory,
}

impl CategoryFamily {
    /// Families in feature-vector order.
    pub const ALL: [CategoryFamily; 4] = [
        CategoryFamily::TransactionType,
        CategoryFamily::PaymentGateway,
        CategoryFamily::TransactionState,
        CategoryFamily::MerchantCategory,
    ];

    /// Column name prefix used by the training frame.
    pub fn prefix(self) -> &'static str {
        match self {
            CategoryFamily::TransactionType => "Transaction_Type",
            CategoryFamily::PaymentGateway => "Payment_Gateway",
            CategoryFamily::TransactionState => "Transaction_State",
            CategoryFamily::MerchantCategory => "Merchant_Category",
        }
    }

    /// Domain members in indicator order.
    pub fn members(self) -> &'static [&'static str] {
        match self {
            CategoryFamily::TransactionType => TRANSACTION_TYPES,
            CategoryFamily::PaymentGateway => PAYMENT_GATEWAYS,
            CategoryFamily::TransactionState => TRANSACTION_STATES,
            CategoryFamily::MerchantCategory => MERCHANT_CATEGORIES,
        }
    }

    /// Position of `value` within the domain. Matching is exact.
    pub fn position(self, value: &str) -> Option<usize> {
        self.members().iter().position(|m| *m == value)
    }

    pub fn contains(self, value: &str) -> bool {
        self.position(value).is_some()
    }

    pub fn column_name(self, member: &str) -> String {
        format!("{}_{}", self.prefix(), member)
    }
}

impl fmt::Display for CategoryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CategoryFamily::TransactionType => "transaction type",
            CategoryFamily::PaymentGateway => "payment gateway",
            CategoryFamily::TransactionState => "transaction state",
            CategoryFamily::MerchantCategory => "merchant category",
        };
        f.write_str(name)
    }
}

/// Ordered column layout of the classifier input.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    version: &'static str,
    columns: Vec<String>,
    blocks: [Range<usize>; 4],
}

static UPI_SCHEMA: LazyLock<FeatureSchema> = LazyLock::new(FeatureSchema::build);

impl FeatureSchema {
    /// The schema the deployed classifier was trained on.
    pub fn upi() -> &'static FeatureSchema {
        &UPI_SCHEMA
    }

    fn build() -> Self {
        let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut blocks: [Range<usize>; 4] = Default::default();

        for (slot, family) in CategoryFamily::ALL.into_iter().enumerate() {
            let start = columns.len();
            columns.extend(family.members().iter().map(|m| family.column_name(m)));
            blocks[slot] = start..columns.len();
        }

        Self {
            version: SCHEMA_VERSION,
            columns,
            blocks,
        }
    }

    pub fn version(&self) -> &str {
        self.version
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Index range of a family's indicator block.
    pub fn block(&self, family: CategoryFamily) -> Range<usize> {
        let slot = CategoryFamily::ALL
            .iter()
            .position(|f| *f == family)
            .unwrap_or_default();
        self.blocks[slot].clone()
    }

    /// Check that `columns` matches this schema exactly, in order.
    pub fn validate_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<(), SchemaError> {
        if columns.len() != self.columns.len() {
            return Err(SchemaError::WidthMismatch {
                expected: self.columns.len(),
                found: columns.len(),
            });
        }

        for (position, (expected, found)) in self.columns.iter().zip(columns).enumerate() {
            if expected != found.as_ref() {
                return Err(SchemaError::ColumnMismatch {
                    position,
                    expected: expected.clone(),
                    found: found.as_ref().to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn validate_version(&self, version: &str) -> Result<(), SchemaError> {
        if version != self.version {
            return Err(SchemaError::VersionMismatch {
                expected: self.version.to_string(),
                found: version.to_string(),
            });
        }
        Ok(())
    }
}
