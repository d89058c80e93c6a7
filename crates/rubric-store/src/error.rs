//! Error types for the persistence gateway boundary.

use thiserror::Error;

/// Errors surfaced by gateway implementations.
///
/// `NotFound` on an update is the stale-reference signal the synchronizer
/// recovers from by re-issuing the operation as a create.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The referenced entity does not exist remotely.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Transport-level failure (connection dropped, timeout).
    #[error("gateway connection failed: {0}")]
    Connection(String),

    /// The remote side rejected the operation.
    #[error("gateway rejected operation: {0}")]
    Rejected(String),

    /// Payload serialization failure.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Convenience constructor for `NotFound`.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        GatewayError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True when the error indicates the target record no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}
