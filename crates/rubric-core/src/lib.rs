//! Rubric Core Library
//!
//! Domain logic for a grading platform's rubric composition and
//! evaluation-scoring reconciliation:
//!
//! - `domain`: the in-memory rubric model and the weight-sum invariant
//!   (criteria weights never exceed 100%)
//! - `sync`: pure diffing of local vs last-persisted criteria, applied as a
//!   best-effort concurrent fan-out of gateway operations
//! - `scoring`: merging automated baseline scores with audited human
//!   overrides into one final score
//! - `session`: the editing-session controller that sequences the save
//!   protocol against the persistence gateway
//!
//! Persistence itself lives behind the traits in `rubric-store`; this crate
//! never touches a backend directly.

pub mod domain;
pub mod scoring;
pub mod session;
pub mod sync;
pub mod telemetry;

pub use domain::{
    Criterion, CriterionIdent, CriterionUpdate, Ident, LocalId, Result, Rubric, RubricError,
    RubricIdent, RubricModel, ALLOWED_MAX_POINTS, MAX_TOTAL_WEIGHT,
};
pub use scoring::{
    apply_override, baseline_scores, clear_override, compute_delta, compute_final, evaluate,
    CriterionScore, DeltaClass, EvaluationResult, ScoreDelta, ScoreOverride, FULL_SCALE,
};
pub use session::{RubricSession, SaveOutcome, SessionState};
pub use sync::{diff, synchronize, ChangeSet, ItemFailure, SyncOp, SyncReport};
