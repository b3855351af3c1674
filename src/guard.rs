//! Action guard: the decision gate in front of resource-creating actions.
//!
//! Each guarded action either counts against a plan ceiling (new user,
//! patient, appointment) or is gated solely by a feature flag (medical
//! records). The guard returns data only; it never renders UI or mutates
//! state beyond its own decision. When a decision comes back blocked the
//! caller is expected to present an upgrade path, and when the resource is
//! approaching its ceiling the caller shows a non-blocking warning banner
//! but still permits the action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{Feature, PlanTier};
use crate::error::{PlanError, Result};
use crate::limits::{self, LimitStatus, ResourceKind};
use crate::usage::UsageSnapshot;

/// Actions that pass through the guard before executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateUser,
    CreatePatient,
    CreateAppointment,
    CreateMedicalRecord,
}

impl ActionKind {
    /// Action identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateUser => "create_user",
            ActionKind::CreatePatient => "create_patient",
            ActionKind::CreateAppointment => "create_appointment",
            ActionKind::CreateMedicalRecord => "create_medical_record",
        }
    }

    /// The ceiling-bound resource this action consumes, if any.
    ///
    /// Medical records are deliberately not ceiling-bound: creating one is
    /// gated on [`Feature::CreateMedicalRecords`] alone.
    #[must_use]
    pub fn resource(&self) -> Option<ResourceKind> {
        match self {
            ActionKind::CreateUser => Some(ResourceKind::Users),
            ActionKind::CreatePatient => Some(ResourceKind::Patients),
            ActionKind::CreateAppointment => Some(ResourceKind::Appointments),
            ActionKind::CreateMedicalRecord => None,
        }
    }

    /// The feature flag this action requires, if any.
    #[must_use]
    pub fn required_feature(&self) -> Option<Feature> {
        match self {
            ActionKind::CreateMedicalRecord => Some(Feature::CreateMedicalRecords),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create_user" => Ok(ActionKind::CreateUser),
            "create_patient" => Ok(ActionKind::CreatePatient),
            "create_appointment" => Ok(ActionKind::CreateAppointment),
            "create_medical_record" => Ok(ActionKind::CreateMedicalRecord),
            other => Err(PlanError::Configuration(format!(
                "no guard mapping for action '{other}'"
            ))),
        }
    }
}

/// Lifecycle of a guard evaluation.
///
/// `Idle` and `Evaluating` are for callers tracking an in-flight check
/// (typically while the usage snapshot is still being fetched); decisions
/// returned by [`check_action`] always carry a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardState {
    Idle,
    Evaluating,
    Allowed,
    Blocked,
}

impl GuardState {
    /// Check whether this state ends the evaluation.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Allowed | Self::Blocked)
    }
}

/// The guard's answer for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use = "guard decisions must be used to enforce access control"]
pub struct ActionDecision {
    /// The action that was checked.
    pub action: ActionKind,
    /// Whether the action may proceed.
    pub allowed: bool,
    /// The ceiling-bound resource involved, if any.
    pub resource: Option<ResourceKind>,
    /// Limit status for ceiling-gated actions; `None` for feature-gated ones.
    pub status: Option<LimitStatus>,
    /// Terminal state of the evaluation.
    pub state: GuardState,
}

impl ActionDecision {
    /// Check whether the action was blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.state == GuardState::Blocked
    }

    /// Limit status to show in a non-blocking warning banner, when the
    /// action is permitted but the resource is approaching its ceiling.
    #[must_use]
    pub fn warning(&self) -> Option<&LimitStatus> {
        self.status
            .as_ref()
            .filter(|s| self.allowed && s.is_approaching)
    }
}

/// Check an action against the plan's ceilings and feature flags.
///
/// Ceiling-gated actions are allowed iff the resource is not at its limit;
/// feature-gated actions are allowed iff the plan carries the flag,
/// independent of usage values.
///
/// # Errors
///
/// Returns [`PlanError::InvalidUsage`] if the snapshot carries a negative
/// count for the action's resource.
pub fn check_action(
    action: ActionKind,
    plan: &PlanTier,
    usage: &UsageSnapshot,
) -> Result<ActionDecision> {
    let (allowed, resource, status) = match action.resource() {
        Some(resource) => {
            let status = limits::evaluate(plan, usage, resource)?;
            (!status.is_at_limit, Some(resource), Some(status))
        }
        None => {
            let feature = action.required_feature().ok_or_else(|| {
                PlanError::Configuration(format!(
                    "action '{action}' is bound to neither a resource nor a feature"
                ))
            })?;
            (plan.has_feature(feature), None, None)
        }
    };

    let state = if allowed {
        GuardState::Allowed
    } else {
        GuardState::Blocked
    };

    if state == GuardState::Blocked {
        tracing::warn!(
            target: "carelane_plans::guard",
            organization_id = %usage.organization_id,
            action = %action,
            plan = %plan.id,
            "Action blocked by plan limits"
        );
    } else if let Some(s) = status.as_ref().filter(|s| s.is_approaching) {
        tracing::debug!(
            target: "carelane_plans::guard",
            organization_id = %usage.organization_id,
            action = %action,
            resource = %s.resource,
            remaining = s.remaining,
            "Action permitted while approaching limit"
        );
    }

    Ok(ActionDecision {
        action,
        allowed,
        resource,
        status,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PlanCatalog, TierId};
    use uuid::Uuid;

    fn snapshot(users: i64, patients: i64, appointments: i64) -> UsageSnapshot {
        UsageSnapshot::new(Uuid::new_v4(), users, patients, appointments)
    }

    #[test]
    fn test_blocked_at_user_ceiling() {
        // Basic allows exactly one staff user.
        let catalog = PlanCatalog::standard();
        let basic = catalog.get(TierId::Basic);
        let usage = snapshot(1, 10, 5);

        let decision = check_action(ActionKind::CreateUser, basic, &usage).unwrap();
        assert!(!decision.allowed);
        assert!(decision.is_blocked());
        assert_eq!(decision.state, GuardState::Blocked);
        assert_eq!(decision.resource, Some(ResourceKind::Users));
        let status = decision.status.unwrap();
        assert_eq!(status.current, 1);
        assert_eq!(status.max, 1);
    }

    #[test]
    fn test_allowed_under_ceiling() {
        let catalog = PlanCatalog::standard();
        let pro = catalog.get(TierId::Professional);
        let usage = snapshot(2, 100, 50);

        let decision = check_action(ActionKind::CreatePatient, pro, &usage).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.state, GuardState::Allowed);
        assert!(decision.warning().is_none());
    }

    #[test]
    fn test_allowed_with_warning_when_approaching() {
        let catalog = PlanCatalog::standard();
        let pro = catalog.get(TierId::Professional);
        let usage = snapshot(2, 950, 50);

        let decision = check_action(ActionKind::CreatePatient, pro, &usage).unwrap();
        assert!(decision.allowed);
        let warning = decision.warning().expect("should carry a warning");
        assert_eq!(warning.remaining, 50);
        assert_eq!(warning.usage_percentage, 95);
    }

    #[test]
    fn test_medical_record_feature_gated_only() {
        let catalog = PlanCatalog::standard();
        let mut plan = catalog.get(TierId::Basic).clone();
        plan.features.remove(&Feature::CreateMedicalRecords);

        // Denied regardless of usage values, even an empty office.
        for usage in [snapshot(0, 0, 0), snapshot(1, 200, 300)] {
            let decision = check_action(ActionKind::CreateMedicalRecord, &plan, &usage).unwrap();
            assert!(!decision.allowed);
            assert!(decision.is_blocked());
            assert_eq!(decision.resource, None);
            assert!(decision.status.is_none());
        }

        // Restoring the flag allows it even with every ceiling exhausted.
        plan.features.insert(Feature::CreateMedicalRecords);
        let usage = snapshot(1, 200, 300);
        let decision = check_action(ActionKind::CreateMedicalRecord, &plan, &usage).unwrap();
        assert!(decision.allowed);
    }

    #[test]
    fn test_appointment_ceiling() {
        let catalog = PlanCatalog::standard();
        let basic = catalog.get(TierId::Basic);

        let decision =
            check_action(ActionKind::CreateAppointment, basic, &snapshot(0, 0, 300)).unwrap();
        assert!(!decision.allowed);

        let decision =
            check_action(ActionKind::CreateAppointment, basic, &snapshot(0, 0, 299)).unwrap();
        assert!(decision.allowed);
    }

    #[test]
    fn test_negative_usage_propagates() {
        let catalog = PlanCatalog::standard();
        let basic = catalog.get(TierId::Basic);
        let usage = snapshot(0, -5, 0);

        let err = check_action(ActionKind::CreatePatient, basic, &usage).unwrap_err();
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_action_parsing() {
        let action: ActionKind = "create_user".parse().unwrap();
        assert_eq!(action, ActionKind::CreateUser);
        assert_eq!(
            "create_medical_record".parse::<ActionKind>().unwrap(),
            ActionKind::CreateMedicalRecord
        );

        let err = "delete_everything".parse::<ActionKind>().unwrap_err();
        assert!(matches!(err, PlanError::Configuration(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_guard_state_terminality() {
        assert!(!GuardState::Idle.is_terminal());
        assert!(!GuardState::Evaluating.is_terminal());
        assert!(GuardState::Allowed.is_terminal());
        assert!(GuardState::Blocked.is_terminal());
    }

    #[test]
    fn test_decision_serde() {
        let catalog = PlanCatalog::standard();
        let basic = catalog.get(TierId::Basic);
        let decision = check_action(ActionKind::CreateUser, basic, &snapshot(1, 0, 0)).unwrap();

        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["action"], "create_user");
        assert_eq!(json["allowed"], false);
        assert_eq!(json["state"], "blocked");
    }
}
