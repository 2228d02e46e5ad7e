//! Unified error type for the crate.
//!
//! The allocation and consolidation engines never return errors; everything in
//! here belongs to the persistence, catalog and report layers around them.

use thiserror::Error;

/// Errors raised by persistence, configuration and report generation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or input-shape problem with a human readable message
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A money field was negative, NaN or infinite at save time
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected value
        amount: f64,
    },

    /// ND 30 + ND 39 does not add up to the total of the line
    #[error("ND allocation mismatch: total {total:.2}, ND 30 {nd30:.2}, ND 39 {nd39:.2}")]
    AllocationMismatch {
        /// Total of the budget line
        total: f64,
        /// ND 33.90.30 portion
        nd30: f64,
        /// ND 33.90.39 portion
        nd39: f64,
    },

    /// The total of the line is not what its payload computes to
    #[error("Total {total:.2} does not match the calculated {computed:.2}")]
    TotalMismatch {
        /// Total submitted with the record
        total: f64,
        /// Total computed from the payload
        computed: f64,
    },

    /// No plan with this id
    #[error("P Trab not found: {id}")]
    PtrabNotFound {
        /// Plan id that was looked up
        id: i64,
    },

    /// No expense record with this id
    #[error("Expense record not found: {id}")]
    RecordNotFound {
        /// Record id that was looked up
        id: i64,
    },

    /// Stored category tag is not one this crate knows
    #[error("Unknown expense category: {tag}")]
    UnknownCategory {
        /// The stored tag
        tag: String,
    },

    /// Stored payload JSON could not be (de)serialized
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Integer conversion failure
    #[error("Integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
