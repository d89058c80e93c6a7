//! Evaluation scoring: automated baselines, human overrides, final
//! aggregation.
//!
//! Everything here is a pure function over value snapshots. A final score is
//! always derivable from the rubric's weights and each criterion's
//! baseline-or-override score; overrides carry a mandatory justification so
//! every deviation from the machine baseline stays auditable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rubric_store::CriterionId;

use crate::domain::error::{Result, RubricError};
use crate::domain::{Criterion, Rubric};

/// Display scale a final score is projected onto.
pub const FULL_SCALE: f64 = 10.0;

// ---------------------------------------------------------------------------
// Score types
// ---------------------------------------------------------------------------

/// Human replacement for a criterion's automated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOverride {
    /// Replacement score, within `[0, max_points]` of the criterion.
    pub new_score: f64,
    /// Mandatory justification for deviating from the baseline.
    pub reason: String,
    /// Optional free-form notes.
    pub comments: String,
}

/// Per-criterion score: automated baseline plus optional human override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion_id: CriterionId,
    /// Score assigned by the automated scoring collaborator.
    pub baseline: f64,
    /// When present, supersedes the baseline for final computation.
    pub manual_override: Option<ScoreOverride>,
}

impl CriterionScore {
    /// Baseline-only score for a criterion.
    pub fn from_baseline(criterion_id: CriterionId, baseline: f64) -> Self {
        Self {
            criterion_id,
            baseline,
            manual_override: None,
        }
    }

    /// The score that counts: override when present, baseline otherwise.
    pub fn effective(&self) -> f64 {
        self.manual_override
            .as_ref()
            .map(|o| o.new_score)
            .unwrap_or(self.baseline)
    }
}

/// Pair the rubric's criteria with baseline scores, in criteria order.
pub fn baseline_scores(rubric: &Rubric, baselines: &[f64]) -> Vec<CriterionScore> {
    rubric
        .criteria
        .iter()
        .zip(baselines)
        .filter_map(|(criterion, &score)| {
            criterion
                .ident
                .remote()
                .map(|id| CriterionScore::from_baseline(id.clone(), score))
        })
        .collect()
}

/// Aggregate evaluation over one rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub criteria_scores: Vec<CriterionScore>,
    /// Weighted aggregate on the [`FULL_SCALE`] scale.
    pub final_score: f64,
    /// True iff any criterion carries an override.
    pub is_modified: bool,
    pub evaluated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Override handling
// ---------------------------------------------------------------------------

/// Set a human override on one criterion's score.
///
/// Returns a new sequence; no other entry is touched. Rejected before any
/// state change when the reason is blank or the score falls outside
/// `[0, max_points]` for the referenced criterion.
pub fn apply_override(
    rubric: &Rubric,
    scores: &[CriterionScore],
    criterion_id: &CriterionId,
    new_score: f64,
    reason: &str,
    comments: &str,
) -> Result<Vec<CriterionScore>> {
    if reason.trim().is_empty() {
        return Err(RubricError::InvalidOverride(
            "a justification reason is required".to_string(),
        ));
    }
    let criterion = find_criterion(rubric, criterion_id)
        .ok_or_else(|| RubricError::CriterionNotFound(criterion_id.to_string()))?;
    let max = f64::from(criterion.max_points);
    if !(0.0..=max).contains(&new_score) {
        return Err(RubricError::InvalidOverride(format!(
            "score {new_score} is outside 0..={max} for \"{}\"",
            criterion.title
        )));
    }

    Ok(scores
        .iter()
        .map(|entry| {
            if entry.criterion_id == *criterion_id {
                CriterionScore {
                    manual_override: Some(ScoreOverride {
                        new_score,
                        reason: reason.to_string(),
                        comments: comments.to_string(),
                    }),
                    ..entry.clone()
                }
            } else {
                entry.clone()
            }
        })
        .collect())
}

/// Remove the override for one criterion, reverting it to the baseline.
pub fn clear_override(scores: &[CriterionScore], criterion_id: &CriterionId) -> Vec<CriterionScore> {
    scores
        .iter()
        .map(|entry| {
            if entry.criterion_id == *criterion_id {
                CriterionScore {
                    manual_override: None,
                    ..entry.clone()
                }
            } else {
                entry.clone()
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Final-score computation
// ---------------------------------------------------------------------------

/// Weighted final score on the [`FULL_SCALE`] scale:
///
/// `Σ (effective_i / max_points_i) × (weight_i / 100) × FULL_SCALE`
///
/// Each criterion is normalized to a fraction of its own max, weighted by
/// its percentage share, and projected onto the display scale. Zero-weight
/// criteria contribute nothing regardless of score. A rubric with total
/// weight below 100 still produces a numerically valid score; completeness
/// is surfaced separately via `Rubric::is_complete`.
pub fn compute_final(rubric: &Rubric, scores: &[CriterionScore]) -> f64 {
    scores
        .iter()
        .filter_map(|entry| {
            let criterion = find_criterion(rubric, &entry.criterion_id)?;
            if criterion.max_points == 0 {
                return None;
            }
            Some(
                entry.effective() / f64::from(criterion.max_points)
                    * (f64::from(criterion.weight) / 100.0)
                    * FULL_SCALE,
            )
        })
        .sum()
}

/// Bundle scores into an audited evaluation result.
pub fn evaluate(rubric: &Rubric, scores: Vec<CriterionScore>) -> EvaluationResult {
    let final_score = compute_final(rubric, &scores);
    let is_modified = scores.iter().any(|s| s.manual_override.is_some());
    EvaluationResult {
        criteria_scores: scores,
        final_score,
        is_modified,
        evaluated_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Delta reporting
// ---------------------------------------------------------------------------

/// Direction of the human adjustment relative to the machine score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaClass {
    MoreGenerous,
    MoreStrict,
    Unchanged,
}

/// Difference between the AI overall score and the reconciled final score.
/// Reporting only; never used for validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub difference: f64,
    pub classification: DeltaClass,
}

/// Classify how the final score deviates from the AI's overall score.
pub fn compute_delta(ai_overall: f64, final_score: f64) -> ScoreDelta {
    use std::cmp::Ordering;

    let classification = match final_score.partial_cmp(&ai_overall) {
        Some(Ordering::Greater) => DeltaClass::MoreGenerous,
        Some(Ordering::Less) => DeltaClass::MoreStrict,
        _ => DeltaClass::Unchanged,
    };
    ScoreDelta {
        difference: (final_score - ai_overall).abs(),
        classification,
    }
}

fn find_criterion<'a>(rubric: &'a Rubric, criterion_id: &CriterionId) -> Option<&'a Criterion> {
    rubric
        .criteria
        .iter()
        .find(|c| c.ident.remote() == Some(criterion_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CriterionIdent;

    const EPSILON: f64 = 1e-9;

    /// Reference rubric: weights [30, 25, 20, 15, 10], max points all 10.
    fn reference_rubric() -> Rubric {
        let mut rubric = Rubric::new("Essays", "");
        for (i, weight) in [30u32, 25, 20, 15, 10].into_iter().enumerate() {
            let mut criterion = Criterion::new(format!("C{}", i + 1), weight, 10);
            criterion.ident = CriterionIdent::persisted(CriterionId(format!("c-{}", i + 1)));
            rubric.criteria.push(criterion);
        }
        rubric
    }

    #[test]
    fn baseline_only_final_score_matches_the_formula() {
        let rubric = reference_rubric();
        let scores = baseline_scores(&rubric, &[8.0, 9.0, 7.0, 8.0, 9.0]);

        // 0.8*3 + 0.9*2.5 + 0.7*2 + 0.8*1.5 + 0.9*1 = 8.15
        let final_score = compute_final(&rubric, &scores);
        assert!((final_score - 8.15).abs() < EPSILON);

        let result = evaluate(&rubric, scores);
        assert!(!result.is_modified);
    }

    #[test]
    fn override_supersedes_baseline_for_its_criterion_only() {
        let rubric = reference_rubric();
        let scores = baseline_scores(&rubric, &[8.0, 9.0, 7.0, 8.0, 9.0]);
        let first = scores[0].criterion_id.clone();

        let adjusted = apply_override(&rubric, &scores, &first, 10.0, "x", "").unwrap();
        assert_eq!(adjusted[0].effective(), 10.0);
        for (before, after) in scores.iter().zip(&adjusted).skip(1) {
            assert_eq!(before, after);
        }

        // Raising the 30%-weight criterion from 8 to 10 adds 0.6.
        let final_score = compute_final(&rubric, &adjusted);
        assert!((final_score - 8.75).abs() < EPSILON);
        assert!(evaluate(&rubric, adjusted).is_modified);
    }

    #[test]
    fn blank_reason_is_rejected_without_touching_scores() {
        let rubric = reference_rubric();
        let scores = baseline_scores(&rubric, &[8.0, 9.0, 7.0, 8.0, 9.0]);
        let first = scores[0].criterion_id.clone();

        let err = apply_override(&rubric, &scores, &first, 10.0, "   ", "").unwrap_err();
        assert!(matches!(err, RubricError::InvalidOverride(_)));
        assert!(scores.iter().all(|s| s.manual_override.is_none()));
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let rubric = reference_rubric();
        let scores = baseline_scores(&rubric, &[8.0, 9.0, 7.0, 8.0, 9.0]);
        let first = scores[0].criterion_id.clone();

        assert!(apply_override(&rubric, &scores, &first, 10.5, "stretch", "").is_err());
        assert!(apply_override(&rubric, &scores, &first, -0.5, "harsh", "").is_err());
        assert!(apply_override(&rubric, &scores, &first, 0.0, "zero is fine", "").is_ok());
    }

    #[test]
    fn clearing_an_override_reverts_to_the_baseline() {
        let rubric = reference_rubric();
        let scores = baseline_scores(&rubric, &[8.0, 9.0, 7.0, 8.0, 9.0]);
        let first = scores[0].criterion_id.clone();

        let adjusted = apply_override(&rubric, &scores, &first, 10.0, "x", "").unwrap();
        let reverted = clear_override(&adjusted, &first);
        assert_eq!(reverted, scores);
    }

    #[test]
    fn zero_weight_criterion_contributes_nothing() {
        let mut rubric = reference_rubric();
        rubric.criteria[4].weight = 0;
        let scores = baseline_scores(&rubric, &[8.0, 9.0, 7.0, 8.0, 10.0]);

        // Last term drops out entirely: 2.4 + 2.25 + 1.4 + 1.2 = 7.25
        let final_score = compute_final(&rubric, &scores);
        assert!((final_score - 7.25).abs() < EPSILON);
    }

    #[test]
    fn incomplete_rubric_still_yields_a_score() {
        let mut rubric = Rubric::new("Partial", "");
        let mut criterion = Criterion::new("Only", 50, 10);
        criterion.ident = CriterionIdent::persisted(CriterionId("c-1".to_string()));
        rubric.criteria.push(criterion);
        assert!(!rubric.is_complete());

        let scores = baseline_scores(&rubric, &[10.0]);
        let final_score = compute_final(&rubric, &scores);
        assert!((final_score - 5.0).abs() < EPSILON);
    }

    #[test]
    fn delta_classification_is_three_way() {
        assert_eq!(
            compute_delta(7.0, 8.5).classification,
            DeltaClass::MoreGenerous
        );
        assert_eq!(
            compute_delta(9.0, 8.5).classification,
            DeltaClass::MoreStrict
        );
        let delta = compute_delta(8.5, 8.5);
        assert_eq!(delta.classification, DeltaClass::Unchanged);
        assert_eq!(delta.difference, 0.0);
    }
}
