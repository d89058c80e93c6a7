//! Trait contract tests for RubricGateway.
//!
//! These tests verify the behavioral contract of the gateway trait using
//! the in-memory fake. Any conforming implementation must pass these.

use rubric_store::fakes::{GatewayOp, MemoryGateway, StaticIdentity};
use rubric_store::gateway::*;
use rubric_store::GatewayError;

fn sample_rubric(title: &str) -> NewRubric {
    NewRubric {
        title: title.to_string(),
        description: "essay grading".to_string(),
        max_total_score: 50,
        owner_id: "teacher-1".to_string(),
    }
}

fn sample_criterion(rubric_id: &RubricId, title: &str, weight: u32) -> NewCriterion {
    NewCriterion {
        rubric_id: rubric_id.clone(),
        title: title.to_string(),
        description: String::new(),
        weight,
        max_points: 10,
        levels: PerformanceLevel::full_range(10),
    }
}

// ===========================================================================
// Rubric header contract
// ===========================================================================

#[tokio::test]
async fn create_rubric_assigns_id_and_round_trips() {
    let gateway = MemoryGateway::new();
    let created = gateway.create_rubric(sample_rubric("Essays")).await.unwrap();

    assert!(!created.id.0.is_empty());
    let fetched = gateway.fetch_rubric(&created.id).await.unwrap();
    assert_eq!(fetched.title, "Essays");
    assert_eq!(fetched.max_total_score, 50);
    assert!(fetched.criteria.is_empty());
}

#[tokio::test]
async fn update_rubric_changes_header_fields() {
    let gateway = MemoryGateway::new();
    let created = gateway.create_rubric(sample_rubric("Essays")).await.unwrap();

    let updated = gateway
        .update_rubric(RubricPatch {
            id: created.id.clone(),
            title: "Essays v2".to_string(),
            description: "revised".to_string(),
            max_total_score: 60,
        })
        .await
        .unwrap();

    assert_eq!(updated.title, "Essays v2");
    assert_eq!(updated.max_total_score, 60);
}

#[tokio::test]
async fn update_missing_rubric_is_not_found() {
    let gateway = MemoryGateway::new();
    let err = gateway
        .update_rubric(RubricPatch {
            id: RubricId("ghost".to_string()),
            title: "x".to_string(),
            description: String::new(),
            max_total_score: 10,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::NotFound { .. }));
}

#[tokio::test]
async fn delete_rubric_removes_it() {
    let gateway = MemoryGateway::new();
    let created = gateway.create_rubric(sample_rubric("Essays")).await.unwrap();

    let deleted = gateway.delete_rubric(&created.id).await.unwrap();
    assert_eq!(deleted, created.id);

    let err = gateway.fetch_rubric(&created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn fetch_all_rubrics_lists_summaries() {
    let gateway = MemoryGateway::new();
    let a = gateway.create_rubric(sample_rubric("A")).await.unwrap();
    gateway.create_rubric(sample_rubric("B")).await.unwrap();
    gateway
        .create_criterion(sample_criterion(&a.id, "Clarity", 40))
        .await
        .unwrap();

    let mut summaries = gateway.fetch_all_rubrics().await.unwrap();
    summaries.sort_by(|x, y| x.title.cmp(&y.title));

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].criteria_count, 1);
    assert_eq!(summaries[1].criteria_count, 0);
}

// ===========================================================================
// Criterion contract
// ===========================================================================

#[tokio::test]
async fn create_criterion_attaches_to_rubric() {
    let gateway = MemoryGateway::new();
    let rubric = gateway.create_rubric(sample_rubric("Essays")).await.unwrap();

    let criterion = gateway
        .create_criterion(sample_criterion(&rubric.id, "Argumentation", 30))
        .await
        .unwrap();

    let fetched = gateway.fetch_rubric(&rubric.id).await.unwrap();
    assert_eq!(fetched.criteria.len(), 1);
    assert_eq!(fetched.criteria[0].id, criterion.id);
    assert_eq!(fetched.criteria[0].weight, 30);
}

#[tokio::test]
async fn update_missing_criterion_is_stale_reference() {
    let gateway = MemoryGateway::new();
    gateway.create_rubric(sample_rubric("Essays")).await.unwrap();

    let err = gateway
        .update_criterion(CriterionPatch {
            id: CriterionId("gone".to_string()),
            title: "x".to_string(),
            description: String::new(),
            weight: 10,
            max_points: 10,
            levels: Vec::new(),
        })
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_absent_criterion_is_a_no_op() {
    let gateway = MemoryGateway::new();
    let id = CriterionId("already-gone".to_string());
    let confirmed = gateway.delete_criterion(&id).await.unwrap();
    assert_eq!(confirmed, id);
}

// ===========================================================================
// Operation log and failure injection
// ===========================================================================

#[tokio::test]
async fn operation_log_records_calls_in_order() {
    let gateway = MemoryGateway::new();
    let rubric = gateway.create_rubric(sample_rubric("Essays")).await.unwrap();
    gateway
        .create_criterion(sample_criterion(&rubric.id, "Clarity", 20))
        .await
        .unwrap();
    gateway.fetch_rubric(&rubric.id).await.unwrap();

    let ops = gateway.ops();
    assert_eq!(ops.len(), 3);
    assert!(matches!(ops[0], GatewayOp::CreateRubric { .. }));
    assert!(ops[1].is_criterion_write());
    assert!(matches!(ops[2], GatewayOp::FetchRubric { .. }));
}

#[tokio::test]
async fn injected_update_failure_is_a_connection_error() {
    let gateway = MemoryGateway::new();
    let rubric = gateway.create_rubric(sample_rubric("Essays")).await.unwrap();
    let criterion = gateway
        .create_criterion(sample_criterion(&rubric.id, "Clarity", 20))
        .await
        .unwrap();

    gateway.fail_update_of(&criterion.id);
    let err = gateway
        .update_criterion(CriterionPatch {
            id: criterion.id.clone(),
            title: "Clarity".to_string(),
            description: String::new(),
            weight: 25,
            max_points: 10,
            levels: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Connection(_)));

    gateway.heal_update_of(&criterion.id);
    assert!(gateway
        .update_criterion(CriterionPatch {
            id: criterion.id,
            title: "Clarity".to_string(),
            description: String::new(),
            weight: 25,
            max_points: 10,
            levels: Vec::new(),
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn rubric_write_failure_applies_once() {
    let gateway = MemoryGateway::new();
    gateway.fail_next_rubric_write();

    let err = gateway.create_rubric(sample_rubric("Essays")).await;
    assert!(err.is_err());

    // The flag is consumed; the retry succeeds.
    assert!(gateway.create_rubric(sample_rubric("Essays")).await.is_ok());
}

// ===========================================================================
// Identity provider
// ===========================================================================

#[test]
fn static_identity_reports_role() {
    let teacher = StaticIdentity::teacher("u-9");
    let user = teacher.current_user().unwrap();
    assert_eq!(user.id, "u-9");
    assert_eq!(user.role, UserRole::Teacher);

    assert!(StaticIdentity::anonymous().current_user().is_none());
}
