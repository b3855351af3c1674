//! End-to-end plan enforcement: snapshot provider -> guard -> advisor ->
//! billing gateway, the same path the dashboard and create-forms take.

use carelane_plans::usage::test::{InMemoryUsageProvider, RecordingBillingGateway};
use carelane_plans::{
    advisor, guard, limits, pricing, ActionKind, BillingCycle, BillingGateway, PlanCatalog,
    PlanChangeOutcome, PlanChangeRequest, PlanError, ResourceKind, TierId, UsageSnapshot,
    UsageSnapshotProvider,
};
use uuid::Uuid;

#[tokio::test]
async fn blocked_creation_drives_upgrade_to_checkout() {
    let catalog = PlanCatalog::standard();
    let provider = InMemoryUsageProvider::new();
    let gateway = RecordingBillingGateway::new();

    // A basic-plan office with its single user seat filled.
    let org = Uuid::new_v4();
    provider.seed(UsageSnapshot::new(org, 1, 50, 10));

    let plan = catalog.get(TierId::Basic);
    let usage = provider.fetch(org).await.unwrap();

    // The create-user form is blocked at the guard.
    let decision = guard::check_action(ActionKind::CreateUser, plan, &usage).unwrap();
    assert!(decision.is_blocked());

    // The advisor names users (100%) over patients (25%) and recommends
    // the professional tier.
    let rec = advisor::recommendation(plan, &usage).unwrap().unwrap();
    assert_eq!(rec.status.resource, ResourceKind::Users);
    assert_eq!(rec.recommended, Some(TierId::Professional));

    // The UI hands the chosen tier to the billing collaborator.
    let outcome = gateway
        .initiate_plan_change(
            org,
            PlanChangeRequest {
                target: rec.recommended.unwrap(),
                cycle: BillingCycle::Monthly,
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, PlanChangeOutcome::Redirect { .. }));

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.target, TierId::Professional);
}

#[tokio::test]
async fn approaching_limit_warns_but_permits() {
    let catalog = PlanCatalog::standard();
    let provider = InMemoryUsageProvider::new();

    // Professional office at 950 of 1000 patients.
    let org = Uuid::new_v4();
    provider.seed(UsageSnapshot::new(org, 2, 950, 50));

    let plan = catalog.get(TierId::Professional);
    let usage = provider.fetch(org).await.unwrap();

    let decision = guard::check_action(ActionKind::CreatePatient, plan, &usage).unwrap();
    assert!(decision.allowed);

    // The warning banner carries the remaining capacity.
    let warning = decision.warning().expect("should warn near the ceiling");
    assert_eq!(warning.usage_percentage, 95);
    assert_eq!(warning.remaining, 50);

    // And the prompt points one tier up.
    assert!(advisor::should_prompt_upgrade(plan, &usage).unwrap());
    let message = advisor::upgrade_message(plan, &usage).unwrap().unwrap();
    assert!(message.contains("950 of 1000"));
    assert!(message.contains("Enterprise"));
}

#[tokio::test]
async fn missing_snapshot_surfaces_retryable_error() {
    let provider = InMemoryUsageProvider::new();
    let err = provider.fetch(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, PlanError::DataUnavailable(_)));
    assert!(err.is_retryable());
}

#[test]
fn medical_records_ignore_every_ceiling() {
    let catalog = PlanCatalog::standard();
    let plan = catalog.get(TierId::Basic);

    // Every ceiling exhausted, yet records stay available: the action is
    // gated on the feature flag alone.
    let usage = UsageSnapshot::new(Uuid::new_v4(), 1, 200, 300);
    let decision = guard::check_action(ActionKind::CreateMedicalRecord, plan, &usage).unwrap();
    assert!(decision.allowed);
    assert!(decision.resource.is_none());
}

#[test]
fn dashboard_summary_matches_individual_evaluations() {
    let catalog = PlanCatalog::standard();
    let plan = catalog.get(TierId::Professional);
    let usage = UsageSnapshot::new(Uuid::new_v4(), 4, 812, 1650);

    let statuses = limits::summary(plan, &usage).unwrap();
    for status in &statuses {
        let single = limits::evaluate(plan, &usage, status.resource).unwrap();
        assert_eq!(*status, single);
    }

    // 4/5 users = 80%: the widget shows a warning while creation stays open.
    assert!(statuses[0].is_approaching);
    assert!(guard::check_action(ActionKind::CreateUser, plan, &usage)
        .unwrap()
        .allowed);
}

#[test]
fn pricing_page_figures() {
    let catalog = PlanCatalog::standard();
    let basic = catalog.get(TierId::Basic);
    let pro = catalog.get(TierId::Professional);

    // Yearly billing is pitched as roughly 17% off.
    let savings =
        pricing::annual_savings_percent(basic.monthly_price, basic.yearly_price).unwrap();
    assert_eq!(savings, 17);

    // About four cents per patient slot on professional.
    let per_patient = pricing::cost_per_unit(pro.monthly_price, pro.max_patients).unwrap();
    assert!((per_patient - 0.04).abs() < 0.001);

    // The comparison table can claim better capacity-per-dollar upstairs.
    let ratio = pricing::value_ratio(pro, basic, ResourceKind::Patients).unwrap();
    assert!(ratio > 1.0);
}
