//! Record store error types.

use thiserror::Error;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored row could not be mapped back to a record
    #[error("Corrupt record in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    /// Value does not fit its INTEGER column
    #[error("{field} {value} is out of range for storage")]
    OutOfRange { field: &'static str, value: u32 },
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;
