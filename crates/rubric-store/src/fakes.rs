//! In-memory fakes for gateway traits (testing only)
//!
//! Provides `MemoryGateway` and `StaticIdentity` that satisfy the trait
//! contracts without any external dependencies. The gateway keeps an
//! append-only operation log and supports per-id failure injection so
//! tests can exercise partial-failure and idempotence behavior.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::gateway::*;

/// One recorded gateway call, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOp {
    CreateRubric { title: String },
    UpdateRubric { id: RubricId },
    DeleteRubric { id: RubricId },
    FetchRubric { id: RubricId },
    FetchAllRubrics,
    CreateCriterion { rubric_id: RubricId, title: String },
    UpdateCriterion { id: CriterionId },
    DeleteCriterion { id: CriterionId },
}

impl GatewayOp {
    /// True for criterion-level create/update/delete calls.
    pub fn is_criterion_write(&self) -> bool {
        matches!(
            self,
            GatewayOp::CreateCriterion { .. }
                | GatewayOp::UpdateCriterion { .. }
                | GatewayOp::DeleteCriterion { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// MemoryGateway
// ---------------------------------------------------------------------------

/// In-memory gateway backed by a `HashMap<rubric id, RubricRecord>`.
///
/// Every call is appended to the operation log before the injected-failure
/// check, so failed attempts are counted too.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    rubrics: Mutex<HashMap<String, RubricRecord>>,
    ops: Mutex<Vec<GatewayOp>>,
    fail_updates: Mutex<HashSet<String>>,
    fail_deletes: Mutex<HashSet<String>>,
    fail_creates: Mutex<HashSet<String>>,
    fail_next_rubric_write: Mutex<bool>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all calls issued so far, in order.
    pub fn ops(&self) -> Vec<GatewayOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Drop the operation log (e.g. after seeding state).
    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Make every `update_criterion` for this id fail with a connection error.
    pub fn fail_update_of(&self, id: &CriterionId) {
        self.fail_updates.lock().unwrap().insert(id.0.clone());
    }

    /// Make every `delete_criterion` for this id fail with a connection error.
    pub fn fail_delete_of(&self, id: &CriterionId) {
        self.fail_deletes.lock().unwrap().insert(id.0.clone());
    }

    /// Make every `create_criterion` with this title fail with a connection error.
    pub fn fail_create_titled(&self, title: &str) {
        self.fail_creates.lock().unwrap().insert(title.to_string());
    }

    /// Make the next rubric header create/update fail, then recover.
    pub fn fail_next_rubric_write(&self) {
        *self.fail_next_rubric_write.lock().unwrap() = true;
    }

    /// Stop failing updates for this id (remote side recovered).
    pub fn heal_update_of(&self, id: &CriterionId) {
        self.fail_updates.lock().unwrap().remove(&id.0);
    }

    /// Stop failing deletes for this id (remote side recovered).
    pub fn heal_delete_of(&self, id: &CriterionId) {
        self.fail_deletes.lock().unwrap().remove(&id.0);
    }

    fn record(&self, op: GatewayOp) {
        self.ops.lock().unwrap().push(op);
    }

    fn take_rubric_write_failure(&self) -> bool {
        let mut flag = self.fail_next_rubric_write.lock().unwrap();
        std::mem::take(&mut *flag)
    }
}

#[async_trait]
impl RubricGateway for MemoryGateway {
    async fn create_rubric(&self, input: NewRubric) -> GatewayResult<RubricRecord> {
        self.record(GatewayOp::CreateRubric {
            title: input.title.clone(),
        });
        if self.take_rubric_write_failure() {
            return Err(GatewayError::Connection(
                "injected rubric write failure".to_string(),
            ));
        }
        let record = RubricRecord {
            id: RubricId(Uuid::new_v4().to_string()),
            title: input.title,
            description: input.description,
            max_total_score: input.max_total_score,
            owner_id: input.owner_id,
            is_active: false,
            criteria: Vec::new(),
            created_at: Utc::now(),
        };
        let mut rubrics = self.rubrics.lock().unwrap();
        rubrics.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    async fn update_rubric(&self, patch: RubricPatch) -> GatewayResult<RubricRecord> {
        self.record(GatewayOp::UpdateRubric {
            id: patch.id.clone(),
        });
        if self.take_rubric_write_failure() {
            return Err(GatewayError::Connection(
                "injected rubric write failure".to_string(),
            ));
        }
        let mut rubrics = self.rubrics.lock().unwrap();
        let record = rubrics
            .get_mut(&patch.id.0)
            .ok_or_else(|| GatewayError::not_found("rubric", patch.id.0.clone()))?;
        record.title = patch.title;
        record.description = patch.description;
        record.max_total_score = patch.max_total_score;
        Ok(record.clone())
    }

    async fn delete_rubric(&self, id: &RubricId) -> GatewayResult<RubricId> {
        self.record(GatewayOp::DeleteRubric { id: id.clone() });
        let mut rubrics = self.rubrics.lock().unwrap();
        rubrics
            .remove(&id.0)
            .map(|_| id.clone())
            .ok_or_else(|| GatewayError::not_found("rubric", id.0.clone()))
    }

    async fn fetch_rubric(&self, id: &RubricId) -> GatewayResult<RubricRecord> {
        self.record(GatewayOp::FetchRubric { id: id.clone() });
        let rubrics = self.rubrics.lock().unwrap();
        rubrics
            .get(&id.0)
            .cloned()
            .ok_or_else(|| GatewayError::not_found("rubric", id.0.clone()))
    }

    async fn fetch_all_rubrics(&self) -> GatewayResult<Vec<RubricSummary>> {
        self.record(GatewayOp::FetchAllRubrics);
        let rubrics = self.rubrics.lock().unwrap();
        Ok(rubrics
            .values()
            .map(|r| RubricSummary {
                id: r.id.clone(),
                title: r.title.clone(),
                description: r.description.clone(),
                criteria_count: r.criteria.len(),
                is_active: r.is_active,
            })
            .collect())
    }

    async fn create_criterion(&self, input: NewCriterion) -> GatewayResult<CriterionRecord> {
        self.record(GatewayOp::CreateCriterion {
            rubric_id: input.rubric_id.clone(),
            title: input.title.clone(),
        });
        if self.fail_creates.lock().unwrap().contains(&input.title) {
            return Err(GatewayError::Connection(
                "injected criterion create failure".to_string(),
            ));
        }
        let mut rubrics = self.rubrics.lock().unwrap();
        let rubric = rubrics
            .get_mut(&input.rubric_id.0)
            .ok_or_else(|| GatewayError::not_found("rubric", input.rubric_id.0.clone()))?;
        let record = CriterionRecord {
            id: CriterionId(Uuid::new_v4().to_string()),
            rubric_id: input.rubric_id,
            title: input.title,
            description: input.description,
            weight: input.weight,
            max_points: input.max_points,
            levels: input.levels,
        };
        rubric.criteria.push(record.clone());
        Ok(record)
    }

    async fn update_criterion(&self, patch: CriterionPatch) -> GatewayResult<CriterionRecord> {
        self.record(GatewayOp::UpdateCriterion {
            id: patch.id.clone(),
        });
        if self.fail_updates.lock().unwrap().contains(&patch.id.0) {
            return Err(GatewayError::Connection(
                "injected criterion update failure".to_string(),
            ));
        }
        let mut rubrics = self.rubrics.lock().unwrap();
        for rubric in rubrics.values_mut() {
            if let Some(criterion) = rubric.criteria.iter_mut().find(|c| c.id == patch.id) {
                criterion.title = patch.title;
                criterion.description = patch.description;
                criterion.weight = patch.weight;
                criterion.max_points = patch.max_points;
                criterion.levels = patch.levels;
                return Ok(criterion.clone());
            }
        }
        Err(GatewayError::not_found("criterion", patch.id.0))
    }

    async fn delete_criterion(&self, id: &CriterionId) -> GatewayResult<CriterionId> {
        self.record(GatewayOp::DeleteCriterion { id: id.clone() });
        if self.fail_deletes.lock().unwrap().contains(&id.0) {
            return Err(GatewayError::Connection(
                "injected criterion delete failure".to_string(),
            ));
        }
        let mut rubrics = self.rubrics.lock().unwrap();
        for rubric in rubrics.values_mut() {
            rubric.criteria.retain(|c| c.id != *id);
        }
        // Absent ids are treated as already deleted.
        Ok(id.clone())
    }
}

// ---------------------------------------------------------------------------
// StaticIdentity
// ---------------------------------------------------------------------------

/// Fixed identity provider for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    /// A signed-in teacher with the given user id.
    pub fn teacher(id: &str) -> Self {
        Self {
            user: Some(UserIdentity {
                id: id.to_string(),
                role: UserRole::Teacher,
            }),
        }
    }

    /// A signed-in admin with the given user id.
    pub fn admin(id: &str) -> Self {
        Self {
            user: Some(UserIdentity {
                id: id.to_string(),
                role: UserRole::Admin,
            }),
        }
    }

    /// No established session.
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}
