//! Error types for TillStore core.

use crate::record::IdKey;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in TillStore core operations.
///
/// Reads never produce these: a failed read is logged and answered with a
/// default. Every write reports its outcome through this type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] tillstore_storage::StorageError),

    /// JSON encoding or decoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value that should be a record is not a JSON object.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },

    /// An import payload is malformed.
    #[error("invalid import payload: {message}")]
    InvalidPayload {
        /// Description of the problem.
        message: String,
    },

    /// A sale line item carries a quantity the configured policy rejects.
    #[error("invalid quantity {quantity} for product {product}")]
    InvalidQuantity {
        /// The product the line item refers to.
        product: IdKey,
        /// The rejected quantity.
        quantity: i64,
    },

    /// The identifier counter cannot advance any further.
    #[error("identifier space exhausted at {last}")]
    IdSpaceExhausted {
        /// The last identifier the counter holds.
        last: i64,
    },

    /// A destructive reset was not confirmed.
    #[error("reset declined: nothing was erased")]
    ResetDeclined,
}

impl CoreError {
    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates an invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}
