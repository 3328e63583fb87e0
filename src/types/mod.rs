//! Type definitions for the fraud check service

pub mod transaction;
pub mod verdict;

pub use transaction::RawTransaction;
pub use verdict::{CheckRequest, CheckResponse, Verdict};
