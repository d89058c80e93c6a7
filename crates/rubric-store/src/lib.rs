//! Rubric-Store: Persistence Abstractions for the Grading Core
//!
//! This crate defines the boundary between the rubric domain logic and
//! whatever backend actually stores rubrics (GraphQL API, SQL, in-memory).
//! It carries no backend of its own: consumers program against the
//! `RubricGateway` and `IdentityProvider` traits, and tests run against the
//! in-memory fakes.
//!
//! ## Key Components
//!
//! - `RubricGateway`: async create/update/delete/fetch for rubrics and criteria
//! - `IdentityProvider`: current user id and role
//! - `MemoryGateway` / `StaticIdentity`: in-memory fakes with operation
//!   logging and failure injection

mod error;
pub mod fakes;
pub mod gateway;

pub use error::GatewayError;
pub use gateway::{
    CriterionId, CriterionPatch, CriterionRecord, GatewayResult, IdentityProvider, NewCriterion,
    NewRubric, PerformanceLevel, RubricGateway, RubricId, RubricPatch, RubricRecord,
    RubricSummary, UserIdentity, UserRole,
};

/// Result type for rubric-store operations
pub type Result<T> = std::result::Result<T, GatewayError>;
