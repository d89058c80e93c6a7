//! Criteria synchronization: pure diff, then best-effort concurrent apply.
//!
//! A save converges remote criterion records to the locally edited rubric in
//! two steps. `diff` is a pure function from the last-saved snapshot and the
//! current rubric to a [`ChangeSet`]; `synchronize` applies that change set
//! against the gateway with concurrent fan-out per independent criterion.
//! There is no transaction boundary: one failing item never cancels the
//! others, and failures are aggregated per item rather than thrown.

use std::collections::BTreeSet;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use rubric_store::{CriterionId, GatewayResult, RubricGateway, RubricId, RubricRecord};

use crate::domain::{Criterion, Rubric};

// ---------------------------------------------------------------------------
// ChangeSet — pure diff output
// ---------------------------------------------------------------------------

/// Minimal gateway operations needed to converge remote state to local.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Provisional criteria the gateway has never seen.
    pub to_create: Vec<Criterion>,
    /// Persisted criteria whose fields changed since the last save.
    pub to_update: Vec<Criterion>,
    /// Remote ids awaiting deletion confirmation.
    pub to_delete: Vec<CriterionId>,
}

impl ChangeSet {
    /// True when a save needs no criterion operations at all.
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of operations this change set will issue.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

/// Compute the change set between the last-saved snapshot and the local
/// rubric.
///
/// Partitioning is by identity tag: provisional criteria become creates,
/// persisted ones become updates. A persisted criterion identical to its
/// last-saved counterpart is skipped entirely, so saving an unchanged rubric
/// issues zero criterion operations.
pub fn diff(
    last_saved: Option<&Rubric>,
    local: &Rubric,
    pending_deletions: &BTreeSet<CriterionId>,
) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for criterion in &local.criteria {
        match criterion.ident.remote() {
            None => changes.to_create.push(criterion.clone()),
            Some(remote_id) => {
                let unchanged = last_saved
                    .and_then(|before| {
                        before
                            .criteria
                            .iter()
                            .find(|c| c.ident.remote() == Some(remote_id))
                    })
                    .is_some_and(|before| before == criterion);
                if !unchanged {
                    changes.to_update.push(criterion.clone());
                }
            }
        }
    }

    changes.to_delete = pending_deletions.iter().cloned().collect();
    changes
}

// ---------------------------------------------------------------------------
// Synchronization report
// ---------------------------------------------------------------------------

/// Which gateway operation failed for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOp {
    Create,
    Update,
    Delete,
}

/// A single non-fatal item failure during synchronization.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub op: SyncOp,
    /// Criterion title for creates/updates, remote id for deletes.
    pub item: String,
    pub error: String,
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Authoritative post-sync snapshot fetched from the gateway.
    pub snapshot: RubricRecord,
    /// Deletions the gateway confirmed; safe to clear from pending.
    pub confirmed_deletions: Vec<CriterionId>,
    /// Item-level failures, aggregated rather than fatal.
    pub failures: Vec<ItemFailure>,
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Apply a change set against the gateway.
///
/// Deletions fan out first, then creates and updates fan out together.
/// An update hitting a stale reference (the remote record was deleted
/// elsewhere) is converted into a create rather than surfaced as an error.
/// Only the final re-fetch of the rubric is a hard failure.
pub async fn synchronize(
    gateway: &dyn RubricGateway,
    rubric_id: &RubricId,
    changes: ChangeSet,
) -> GatewayResult<SyncReport> {
    let mut failures = Vec::new();
    let mut confirmed_deletions = Vec::new();

    let deletes = changes.to_delete.iter().map(|id| async move {
        let result = gateway.delete_criterion(id).await;
        (id.clone(), result)
    });
    for (id, result) in join_all(deletes).await {
        match result {
            Ok(confirmed) => confirmed_deletions.push(confirmed),
            Err(err) => {
                warn!(criterion_id = %id, error = %err, "criterion delete failed");
                failures.push(ItemFailure {
                    op: SyncOp::Delete,
                    item: id.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    let creates = changes
        .to_create
        .iter()
        .map(|criterion| apply_create(gateway, rubric_id, criterion));
    let updates = changes
        .to_update
        .iter()
        .map(|criterion| apply_update(gateway, rubric_id, criterion));
    let (create_results, update_results) = futures::join!(join_all(creates), join_all(updates));
    failures.extend(create_results.into_iter().flatten());
    failures.extend(update_results.into_iter().flatten());

    let snapshot = gateway.fetch_rubric(rubric_id).await?;
    debug!(
        rubric_id = %rubric_id,
        criteria = snapshot.criteria.len(),
        failed = failures.len(),
        "criteria synchronized"
    );

    Ok(SyncReport {
        snapshot,
        confirmed_deletions,
        failures,
    })
}

async fn apply_create(
    gateway: &dyn RubricGateway,
    rubric_id: &RubricId,
    criterion: &Criterion,
) -> Option<ItemFailure> {
    match gateway.create_criterion(criterion.as_new(rubric_id)).await {
        Ok(record) => {
            debug!(criterion_id = %record.id, title = %record.title, "criterion created");
            None
        }
        Err(err) => Some(ItemFailure {
            op: SyncOp::Create,
            item: criterion.title.clone(),
            error: err.to_string(),
        }),
    }
}

async fn apply_update(
    gateway: &dyn RubricGateway,
    rubric_id: &RubricId,
    criterion: &Criterion,
) -> Option<ItemFailure> {
    // `as_patch` is Some for every to_update entry; diff only routes
    // persisted criteria here.
    let patch = criterion.as_patch()?;
    match gateway.update_criterion(patch).await {
        Ok(_) => None,
        Err(err) if err.is_not_found() => {
            // Stale reference: the record was deleted out from under us.
            // Recover by recreating instead of reporting an error.
            warn!(
                criterion = %criterion.ident,
                "stale criterion reference, recreating"
            );
            apply_create(gateway, rubric_id, criterion).await
        }
        Err(err) => Some(ItemFailure {
            op: SyncOp::Update,
            item: criterion.title.clone(),
            error: err.to_string(),
        }),
    }
}
