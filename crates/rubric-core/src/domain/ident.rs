//! Provisional/persisted identity tagging.
//!
//! An entity starts life with a locally generated id and acquires its remote
//! id on the first successful create call. Components pattern-match on the
//! tag; nothing in the workspace inspects id string shape to decide whether
//! an entity has been persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rubric_store::{CriterionId, RubricId};

/// Locally generated identifier for a not-yet-persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(Uuid);

impl LocalId {
    /// Generate a fresh local id.
    pub fn new() -> Self {
        LocalId(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an entity across the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Ident<R> {
    /// Created locally; the gateway has never seen this entity.
    Provisional { local_id: LocalId },
    /// Assigned by the gateway on a successful create.
    Persisted { remote_id: R },
}

impl<R> Ident<R> {
    /// Fresh provisional identity.
    pub fn provisional() -> Self {
        Ident::Provisional {
            local_id: LocalId::new(),
        }
    }

    /// Identity backed by a remote id.
    pub fn persisted(remote_id: R) -> Self {
        Ident::Persisted { remote_id }
    }

    /// True until the entity round-trips through the gateway.
    pub fn is_provisional(&self) -> bool {
        matches!(self, Ident::Provisional { .. })
    }

    /// The remote id, if the entity has been persisted.
    pub fn remote(&self) -> Option<&R> {
        match self {
            Ident::Provisional { .. } => None,
            Ident::Persisted { remote_id } => Some(remote_id),
        }
    }
}

impl<R: std::fmt::Display> std::fmt::Display for Ident<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ident::Provisional { local_id } => write!(f, "provisional:{local_id}"),
            Ident::Persisted { remote_id } => write!(f, "{remote_id}"),
        }
    }
}

/// Identity of a rubric header.
pub type RubricIdent = Ident<RubricId>;

/// Identity of a criterion.
pub type CriterionIdent = Ident<CriterionId>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_idents_are_distinct() {
        let a = CriterionIdent::provisional();
        let b = CriterionIdent::provisional();
        assert_ne!(a, b);
        assert!(a.is_provisional());
        assert!(a.remote().is_none());
    }

    #[test]
    fn persisted_ident_exposes_remote_id() {
        let ident = CriterionIdent::persisted(CriterionId("c-42".to_string()));
        assert!(!ident.is_provisional());
        assert_eq!(ident.remote(), Some(&CriterionId("c-42".to_string())));
        assert_eq!(ident.to_string(), "c-42");
    }
}
