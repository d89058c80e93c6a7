//! In-memory rubric model and the weight-sum invariant.
//!
//! `RubricModel` owns the editable rubric, the last-persisted snapshot it is
//! diffed against on save, and the set of deletions awaiting remote
//! confirmation. All mutations here are synchronous and perform no I/O;
//! every exit path, including a rejected mutation, leaves the rubric in a
//! consistent state with `total_weight() <= 100`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use rubric_store::{
    CriterionId, CriterionPatch, CriterionRecord, NewCriterion, PerformanceLevel, RubricId,
    RubricRecord,
};

use crate::domain::error::{Result, RubricError};
use crate::domain::ident::{CriterionIdent, RubricIdent};

/// Max-points values a criterion may use.
pub const ALLOWED_MAX_POINTS: [u32; 5] = [5, 10, 15, 20, 25];

/// Upper bound on the sum of criteria weights.
pub const MAX_TOTAL_WEIGHT: u32 = 100;

// ---------------------------------------------------------------------------
// Criterion
// ---------------------------------------------------------------------------

/// One weighted, scorable dimension of a rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub ident: CriterionIdent,
    pub title: String,
    pub description: String,
    /// Integer percentage share of the rubric, 0–100.
    pub weight: u32,
    pub max_points: u32,
    /// Ordered performance bands. Defaults to a single full-range band.
    pub levels: Vec<PerformanceLevel>,
}

impl Criterion {
    /// New provisional criterion with a single full-range level.
    pub fn new(title: impl Into<String>, weight: u32, max_points: u32) -> Self {
        Self {
            ident: CriterionIdent::provisional(),
            title: title.into(),
            description: String::new(),
            weight,
            max_points,
            levels: PerformanceLevel::full_range(max_points),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_levels(mut self, levels: Vec<PerformanceLevel>) -> Self {
        self.levels = levels;
        self
    }

    pub(crate) fn from_record(record: &CriterionRecord) -> Self {
        Self {
            ident: CriterionIdent::persisted(record.id.clone()),
            title: record.title.clone(),
            description: record.description.clone(),
            weight: record.weight,
            max_points: record.max_points,
            levels: record.levels.clone(),
        }
    }

    /// Gateway create payload for this criterion.
    pub(crate) fn as_new(&self, rubric_id: &RubricId) -> NewCriterion {
        NewCriterion {
            rubric_id: rubric_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            weight: self.weight,
            max_points: self.max_points,
            levels: self.levels.clone(),
        }
    }

    /// Gateway update payload; `None` while the criterion is provisional.
    pub(crate) fn as_patch(&self) -> Option<CriterionPatch> {
        self.ident.remote().map(|id| CriterionPatch {
            id: id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            weight: self.weight,
            max_points: self.max_points,
            levels: self.levels.clone(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(RubricError::EmptyTitle);
        }
        if !ALLOWED_MAX_POINTS.contains(&self.max_points) {
            return Err(RubricError::DisallowedMaxPoints(self.max_points));
        }
        Ok(())
    }
}

/// Field-level patch applied by `RubricModel::update_criterion`.
/// `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct CriterionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weight: Option<u32>,
    pub max_points: Option<u32>,
    pub levels: Option<Vec<PerformanceLevel>>,
}

impl CriterionUpdate {
    /// Patch that only changes the weight.
    pub fn weight(weight: u32) -> Self {
        Self {
            weight: Some(weight),
            ..Self::default()
        }
    }

    fn apply_to(&self, criterion: &Criterion) -> Criterion {
        let mut next = criterion.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(weight) = self.weight {
            next.weight = weight;
        }
        if let Some(max_points) = self.max_points {
            next.max_points = max_points;
        }
        if let Some(levels) = &self.levels {
            next.levels = levels.clone();
        }
        next
    }
}

// ---------------------------------------------------------------------------
// Rubric
// ---------------------------------------------------------------------------

/// A named, weighted set of evaluation criteria.
///
/// Criteria keep insertion order; order matters for presentation, not for
/// scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub ident: RubricIdent,
    pub name: String,
    pub description: String,
    pub criteria: Vec<Criterion>,
    /// Whether this rubric is the one currently attached to assignments.
    pub is_active: bool,
}

impl Rubric {
    /// New provisional rubric with no criteria.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ident: RubricIdent::provisional(),
            name: name.into(),
            description: description.into(),
            criteria: Vec::new(),
            is_active: false,
        }
    }

    /// Sum of criteria weights. Never exceeds [`MAX_TOTAL_WEIGHT`] for a
    /// rubric mutated only through `RubricModel`.
    pub fn total_weight(&self) -> u32 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    /// A rubric is complete at exactly 100% total weight. Incompleteness is
    /// a warning condition, not an error.
    pub fn is_complete(&self) -> bool {
        self.total_weight() == MAX_TOTAL_WEIGHT
    }

    /// Sum of the criteria's max points, persisted on the header.
    pub fn max_total_score(&self) -> u32 {
        self.criteria.iter().map(|c| c.max_points).sum()
    }

    /// Look up a criterion by identity.
    pub fn criterion(&self, ident: &CriterionIdent) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.ident == *ident)
    }

    /// Rebuild from a persisted record; every criterion carries its remote id.
    pub fn from_record(record: &RubricRecord) -> Self {
        Self {
            ident: RubricIdent::persisted(record.id.clone()),
            name: record.title.clone(),
            description: record.description.clone(),
            criteria: record.criteria.iter().map(Criterion::from_record).collect(),
            is_active: record.is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// RubricModel
// ---------------------------------------------------------------------------

/// The editable rubric plus the bookkeeping needed to save it.
#[derive(Debug, Clone)]
pub struct RubricModel {
    rubric: Rubric,
    /// Snapshot of the rubric as of the last successful save. `None` until
    /// the rubric has been persisted at least once.
    last_saved: Option<Rubric>,
    /// Persisted criteria removed locally but not yet confirmed deleted
    /// remotely. Cleared per confirmed id after a save; survivors retry on
    /// the next save.
    pending_deletions: BTreeSet<CriterionId>,
}

impl RubricModel {
    /// Fresh provisional rubric.
    pub fn fresh(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            rubric: Rubric::new(name, description),
            last_saved: None,
            pending_deletions: BTreeSet::new(),
        }
    }

    /// Model over a persisted rubric; the record doubles as the last-saved
    /// snapshot.
    pub fn from_record(record: &RubricRecord) -> Self {
        let rubric = Rubric::from_record(record);
        Self {
            last_saved: Some(rubric.clone()),
            rubric,
            pending_deletions: BTreeSet::new(),
        }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn last_saved(&self) -> Option<&Rubric> {
        self.last_saved.as_ref()
    }

    pub fn pending_deletions(&self) -> &BTreeSet<CriterionId> {
        &self.pending_deletions
    }

    /// Rename the rubric header locally.
    pub fn rename(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.rubric.name = name.into();
        self.rubric.description = description.into();
    }

    /// Append a criterion, enforcing the weight-sum invariant.
    ///
    /// On failure the rubric is left byte-for-byte unchanged; the criterion
    /// is never partially added.
    pub fn add_criterion(&mut self, criterion: Criterion) -> Result<()> {
        criterion.validate()?;
        let attempted = self.rubric.total_weight() + criterion.weight;
        if attempted > MAX_TOTAL_WEIGHT {
            return Err(RubricError::WeightExceeded { attempted });
        }
        self.rubric.criteria.push(criterion);
        Ok(())
    }

    /// Patch a criterion atomically.
    ///
    /// The hypothetical post-update weight total is checked before anything
    /// is committed; a rejected update changes no field.
    pub fn update_criterion(&mut self, ident: &CriterionIdent, update: CriterionUpdate) -> Result<()> {
        let index = self
            .rubric
            .criteria
            .iter()
            .position(|c| c.ident == *ident)
            .ok_or_else(|| RubricError::CriterionNotFound(ident.to_string()))?;

        let candidate = update.apply_to(&self.rubric.criteria[index]);
        candidate.validate()?;

        let attempted =
            self.rubric.total_weight() - self.rubric.criteria[index].weight + candidate.weight;
        if attempted > MAX_TOTAL_WEIGHT {
            return Err(RubricError::WeightExceeded { attempted });
        }
        self.rubric.criteria[index] = candidate;
        Ok(())
    }

    /// Remove a criterion locally.
    ///
    /// Persisted criteria are additionally queued for remote deletion on the
    /// next save; provisional ones vanish without bookkeeping.
    pub fn delete_criterion(&mut self, ident: &CriterionIdent) -> Result<()> {
        let index = self
            .rubric
            .criteria
            .iter()
            .position(|c| c.ident == *ident)
            .ok_or_else(|| RubricError::CriterionNotFound(ident.to_string()))?;

        let removed = self.rubric.criteria.remove(index);
        if let Some(remote_id) = removed.ident.remote() {
            self.pending_deletions.insert(remote_id.clone());
        }
        Ok(())
    }

    /// Promote the rubric header to persisted after its first create call.
    pub(crate) fn mark_persisted(&mut self, id: RubricId) {
        self.rubric.ident = RubricIdent::persisted(id);
    }

    /// Replace local state with the authoritative post-save snapshot.
    ///
    /// Only deletions the gateway confirmed are cleared; the rest stay
    /// pending for the next save attempt.
    pub fn adopt_snapshot(&mut self, record: &RubricRecord, confirmed_deletions: &[CriterionId]) {
        for id in confirmed_deletions {
            self.pending_deletions.remove(id);
        }
        self.rubric = Rubric::from_record(record);
        self.last_saved = Some(self.rubric.clone());
    }
}
