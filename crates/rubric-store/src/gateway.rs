//! Gateway trait definitions for the grading persistence layer.
//!
//! These traits define the external collaborators of the rubric core:
//! - `RubricGateway`: create/update/delete/fetch for rubrics and criteria
//! - `IdentityProvider`: the current user's id and role
//!
//! All gateway operations are async and backend-agnostic. In-memory fakes
//! are provided for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Remote identifier assigned to a rubric by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RubricId(pub String);

impl std::fmt::Display for RubricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote identifier assigned to a criterion by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

impl std::fmt::Display for CriterionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One performance band of a criterion: what a given score looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLevel {
    /// Description of work at this band.
    pub description: String,
    /// Score awarded for this band, within `0..=max_points`.
    pub score: u32,
}

impl PerformanceLevel {
    /// Single default band covering the criterion's full range.
    pub fn full_range(max_points: u32) -> Vec<PerformanceLevel> {
        vec![PerformanceLevel {
            description: "Full range".to_string(),
            score: max_points,
        }]
    }
}

/// A criterion as persisted by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionRecord {
    pub id: CriterionId,
    pub rubric_id: RubricId,
    pub title: String,
    pub description: String,
    /// Integer percentage share, 0–100.
    pub weight: u32,
    pub max_points: u32,
    pub levels: Vec<PerformanceLevel>,
}

/// A rubric as persisted by the gateway, with its criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricRecord {
    pub id: RubricId,
    pub title: String,
    pub description: String,
    /// Sum of the criteria's max points, persisted on the header.
    pub max_total_score: u32,
    pub owner_id: String,
    /// Whether this rubric is the one currently attached to assignments.
    pub is_active: bool,
    pub criteria: Vec<CriterionRecord>,
    pub created_at: DateTime<Utc>,
}

/// Listing entry returned by `fetch_all_rubrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricSummary {
    pub id: RubricId,
    pub title: String,
    pub description: String,
    pub criteria_count: usize,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Operation inputs
// ---------------------------------------------------------------------------

/// Input for `create_rubric`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRubric {
    pub title: String,
    pub description: String,
    pub max_total_score: u32,
    pub owner_id: String,
}

/// Input for `update_rubric` (header fields only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricPatch {
    pub id: RubricId,
    pub title: String,
    pub description: String,
    pub max_total_score: u32,
}

/// Input for `create_criterion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCriterion {
    pub rubric_id: RubricId,
    pub title: String,
    pub description: String,
    pub weight: u32,
    pub max_points: u32,
    pub levels: Vec<PerformanceLevel>,
}

/// Input for `update_criterion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionPatch {
    pub id: CriterionId,
    pub title: String,
    pub description: String,
    pub weight: u32,
    pub max_points: u32,
    pub levels: Vec<PerformanceLevel>,
}

// ---------------------------------------------------------------------------
// RubricGateway — Persistence Operations
// ---------------------------------------------------------------------------

/// Persistence gateway for rubrics and their criteria.
///
/// Guarantees:
/// - `create_*` assigns a fresh remote id and returns the stored record.
/// - `update_*` returns `GatewayError::NotFound` when the target record
///   no longer exists (stale reference).
/// - `fetch_rubric` returns the rubric with its full criteria list.
#[async_trait]
pub trait RubricGateway: Send + Sync {
    /// Create a rubric header, returning it with its assigned id.
    async fn create_rubric(&self, input: NewRubric) -> GatewayResult<RubricRecord>;

    /// Update a rubric header.
    async fn update_rubric(&self, patch: RubricPatch) -> GatewayResult<RubricRecord>;

    /// Delete a rubric and its criteria. Returns the deleted id.
    async fn delete_rubric(&self, id: &RubricId) -> GatewayResult<RubricId>;

    /// Fetch a rubric with its criteria.
    async fn fetch_rubric(&self, id: &RubricId) -> GatewayResult<RubricRecord>;

    /// List all rubrics visible to the caller.
    async fn fetch_all_rubrics(&self) -> GatewayResult<Vec<RubricSummary>>;

    /// Create a criterion under an existing rubric.
    async fn create_criterion(&self, input: NewCriterion) -> GatewayResult<CriterionRecord>;

    /// Update an existing criterion. `NotFound` signals a stale reference.
    async fn update_criterion(&self, patch: CriterionPatch) -> GatewayResult<CriterionRecord>;

    /// Delete a criterion. Deleting an absent id is a no-op returning the id.
    async fn delete_criterion(&self, id: &CriterionId) -> GatewayResult<CriterionId>;
}

// ---------------------------------------------------------------------------
// IdentityProvider — Session Identity
// ---------------------------------------------------------------------------

/// Role of the current user within the grading platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Teacher,
    Admin,
}

/// The authenticated user on whose behalf gateway calls are made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub role: UserRole,
}

/// Identity collaborator. Returns `None` when no session is established.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;
}
