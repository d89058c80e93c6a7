//! Rubric editing session orchestration.
//!
//! `RubricSession` is the only component that talks to the persistence
//! gateway. It owns the editable [`RubricModel`], sequences the save
//! protocol (header first, then criteria synchronization), and guards
//! against concurrent saves of the same rubric with a simple in-flight flag.

use std::sync::Arc;

use tracing::{debug, info, warn};

use rubric_store::{
    IdentityProvider, NewRubric, RubricGateway, RubricId, RubricPatch, RubricSummary, UserIdentity,
};

use crate::domain::error::{Result, RubricError};
use crate::domain::{Criterion, CriterionIdent, CriterionUpdate, Rubric, RubricModel};
use crate::sync::{self, ItemFailure};

// ---------------------------------------------------------------------------
// Session state and save outcome
// ---------------------------------------------------------------------------

/// Editing-session phase.
///
/// `Idle → Saving → Idle` around a save, `Idle → Loading → Idle` around a
/// rubric load. A save issued while one is in flight is ignored outright,
/// never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Saving,
    Loading,
}

/// Typed result of a save: the header gate succeeded, and each criterion
/// operation either landed or is reported as a discrete failure.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub rubric_id: RubricId,
    /// True when the header was created rather than updated.
    pub header_created: bool,
    /// Criterion operations that succeeded.
    pub synced: usize,
    /// Criterion operations that failed; the save as a whole still counts.
    pub failures: Vec<ItemFailure>,
}

impl SaveOutcome {
    /// True when every criterion operation landed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.failures.is_empty() {
            write!(f, "rubric saved")
        } else {
            write!(
                f,
                "rubric saved, {} criteria failed to sync",
                self.failures.len()
            )
        }
    }
}

// ---------------------------------------------------------------------------
// RubricSession
// ---------------------------------------------------------------------------

/// One rubric-editing session over the gateway.
pub struct RubricSession {
    gateway: Arc<dyn RubricGateway>,
    identity: Arc<dyn IdentityProvider>,
    model: RubricModel,
    state: SessionState,
}

impl RubricSession {
    /// Start a session with an empty provisional rubric.
    pub fn new(gateway: Arc<dyn RubricGateway>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            gateway,
            identity,
            model: RubricModel::fresh("Untitled rubric", ""),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn rubric(&self) -> &Rubric {
        self.model.rubric()
    }

    pub fn model(&self) -> &RubricModel {
        &self.model
    }

    // -- local mutation intents --------------------------------------------

    /// Begin the create-rubric flow: a fresh provisional rubric, discarding
    /// any local state from the previous one.
    pub fn start_rubric(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.model = RubricModel::fresh(name, description);
    }

    /// Rename the current rubric's header locally.
    pub fn rename_rubric(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.model.rename(name, description);
    }

    pub fn add_criterion(&mut self, criterion: Criterion) -> Result<()> {
        self.model.add_criterion(criterion)
    }

    pub fn update_criterion(&mut self, ident: &CriterionIdent, update: CriterionUpdate) -> Result<()> {
        self.model.update_criterion(ident, update)
    }

    pub fn delete_criterion(&mut self, ident: &CriterionIdent) -> Result<()> {
        self.model.delete_criterion(ident)
    }

    // -- gateway intents ----------------------------------------------------

    /// Load a persisted rubric into the session.
    pub async fn load_rubric(&mut self, id: &RubricId) -> Result<()> {
        self.state = SessionState::Loading;
        let fetched = self.gateway.fetch_rubric(id).await;
        self.state = SessionState::Idle;

        let record = fetched?;
        info!(rubric_id = %record.id, criteria = record.criteria.len(), "rubric loaded");
        self.model = RubricModel::from_record(&record);
        Ok(())
    }

    /// List rubrics visible to the caller.
    pub async fn list_rubrics(&self) -> Result<Vec<RubricSummary>> {
        Ok(self.gateway.fetch_all_rubrics().await?)
    }

    /// Delete a rubric remotely; local state is dropped only after the
    /// gateway confirms.
    pub async fn delete_rubric(&mut self, id: &RubricId) -> Result<()> {
        self.gateway.delete_rubric(id).await?;
        info!(rubric_id = %id, "rubric deleted");
        if self.model.rubric().ident.remote() == Some(id) {
            self.model = RubricModel::fresh("Untitled rubric", "");
        }
        Ok(())
    }

    /// Persist the rubric: header first, then criteria synchronization.
    ///
    /// Returns `Ok(None)` when a save is already in flight. The header call
    /// is an all-or-nothing gate; criterion failures are aggregated in the
    /// returned [`SaveOutcome`] instead of failing the save.
    pub async fn save(&mut self) -> Result<Option<SaveOutcome>> {
        if self.state == SessionState::Saving {
            debug!("save already in flight; ignoring");
            return Ok(None);
        }
        let user = self
            .identity
            .current_user()
            .ok_or(RubricError::Unauthenticated)?;

        self.state = SessionState::Saving;
        let result = self.save_inner(user).await;
        // Back to Idle on every path, not just success.
        self.state = SessionState::Idle;
        result.map(Some)
    }

    async fn save_inner(&mut self, user: UserIdentity) -> Result<SaveOutcome> {
        let rubric = self.model.rubric();
        let max_total_score = rubric.max_total_score();

        let (rubric_id, header_created) = match rubric.ident.remote() {
            None => {
                let record = self
                    .gateway
                    .create_rubric(NewRubric {
                        title: rubric.name.clone(),
                        description: rubric.description.clone(),
                        max_total_score,
                        owner_id: user.id,
                    })
                    .await
                    .map_err(RubricError::HeaderPersistFailure)?;
                (record.id, true)
            }
            Some(id) => {
                let record = self
                    .gateway
                    .update_rubric(RubricPatch {
                        id: id.clone(),
                        title: rubric.name.clone(),
                        description: rubric.description.clone(),
                        max_total_score,
                    })
                    .await
                    .map_err(RubricError::HeaderPersistFailure)?;
                (record.id, false)
            }
        };
        info!(rubric_id = %rubric_id, created = header_created, "rubric header persisted");

        if header_created {
            // The header now exists remotely even if the criteria phase
            // fails below; a retry must update, not re-create.
            self.model.mark_persisted(rubric_id.clone());
        }

        let changes = sync::diff(
            self.model.last_saved(),
            self.model.rubric(),
            self.model.pending_deletions(),
        );
        let planned = changes.len();
        let report = sync::synchronize(self.gateway.as_ref(), &rubric_id, changes).await?;

        let failures = report.failures.clone();
        self.model
            .adopt_snapshot(&report.snapshot, &report.confirmed_deletions);

        if !failures.is_empty() {
            warn!(
                rubric_id = %rubric_id,
                failed = failures.len(),
                "rubric saved with partial criteria sync"
            );
        }
        Ok(SaveOutcome {
            rubric_id,
            header_created,
            synced: planned - failures.len(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_store::fakes::{MemoryGateway, StaticIdentity};

    fn session(gateway: Arc<MemoryGateway>) -> RubricSession {
        RubricSession::new(gateway, Arc::new(StaticIdentity::teacher("t-1")))
    }

    #[tokio::test]
    async fn save_while_saving_is_ignored_outright() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = session(gateway.clone());
        session.start_rubric("Essays", "");

        session.state = SessionState::Saving;
        let outcome = session.save().await.unwrap();
        assert!(outcome.is_none());
        assert!(gateway.ops().is_empty());
    }

    #[tokio::test]
    async fn state_returns_to_idle_after_a_failed_save() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = session(gateway.clone());
        session.start_rubric("Essays", "");
        gateway.fail_next_rubric_write();

        assert!(session.save().await.is_err());
        assert_eq!(session.state(), SessionState::Idle);

        // The next save goes through.
        assert!(session.save().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn state_returns_to_idle_after_a_failed_load() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = session(gateway.clone());

        let missing = rubric_store::RubricId("ghost".to_string());
        assert!(session.load_rubric(&missing).await.is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }
}
