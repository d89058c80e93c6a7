//! Domain types for rubric composition.

pub mod error;
pub mod ident;
pub mod model;

pub use error::{Result, RubricError};
pub use ident::{CriterionIdent, Ident, LocalId, RubricIdent};
pub use model::{
    Criterion, CriterionUpdate, Rubric, RubricModel, ALLOWED_MAX_POINTS, MAX_TOTAL_WEIGHT,
};
