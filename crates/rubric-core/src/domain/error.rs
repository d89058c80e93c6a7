//! Domain-level error taxonomy for the rubric core.

use rubric_store::GatewayError;

/// Rubric domain errors.
///
/// Validation variants (`WeightExceeded`, `EmptyTitle`, `DisallowedMaxPoints`,
/// `InvalidOverride`) are resolved synchronously and never reach the gateway.
#[derive(Debug, thiserror::Error)]
pub enum RubricError {
    #[error("criteria weights would sum to {attempted}%, exceeding the 100% limit")]
    WeightExceeded { attempted: u32 },

    #[error("criterion title must not be empty")]
    EmptyTitle,

    #[error("max points {0} is not one of the allowed values")]
    DisallowedMaxPoints(u32),

    #[error("criterion not found in rubric: {0}")]
    CriterionNotFound(String),

    #[error("no authenticated user; sign in before saving")]
    Unauthenticated,

    #[error("rubric header persist failed: {0}")]
    HeaderPersistFailure(#[source] GatewayError),

    #[error("invalid override: {0}")]
    InvalidOverride(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Result type for rubric domain operations.
pub type Result<T> = std::result::Result<T, RubricError>;
