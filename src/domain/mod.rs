//! Business rules that do not touch the database.
//!
//! Services load rows, hand plain values to these types and persist whatever
//! they decide. Everything here is covered by `tests/domain_rules.rs`.

pub mod allowance;
pub mod category;
pub mod order_status;
pub mod plan;
pub mod role;

use thiserror::Error;

/// Raised when a string from a request or a row does not name a known variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown plan: {0}")]
    Plan(String),

    #[error("Unknown category: {0}")]
    Category(String),

    #[error("Unknown role: {0}")]
    Role(String),
}
