//! Limit evaluation: per-resource status against a plan's ceilings.
//!
//! All functions here are pure and synchronous. They operate entirely on
//! values passed in by the caller, so they are safe to call concurrently
//! from any number of request contexts.
//!
//! Every call site that needs progress-bar math goes through [`evaluate`] or
//! [`summary`]; the resource-to-field association lives in [`ResourceKind`]
//! and nowhere else, so the percentages shown on the dashboard, the guard,
//! and the upgrade prompt can never diverge.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::PlanTier;
use crate::error::{PlanError, Result};
use crate::usage::UsageSnapshot;

/// Percentage at which a resource enters the warning zone.
const APPROACHING_THRESHOLD: u32 = 80;

/// A countable, ceiling-bound resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Users,
    Patients,
    Appointments,
}

impl ResourceKind {
    /// All resource kinds, in the fixed order used for deterministic
    /// iteration and tie-breaking (users before patients before
    /// appointments).
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Users,
        ResourceKind::Patients,
        ResourceKind::Appointments,
    ];

    /// Resource kind as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Patients => "patients",
            ResourceKind::Appointments => "appointments",
        }
    }

    /// Human-facing name for limit banners.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Users => "staff users",
            ResourceKind::Patients => "patients",
            ResourceKind::Appointments => "appointments this month",
        }
    }

    /// The plan ceiling this resource is bound by.
    #[must_use]
    pub fn ceiling(&self, plan: &PlanTier) -> u32 {
        match self {
            ResourceKind::Users => plan.max_users,
            ResourceKind::Patients => plan.max_patients,
            ResourceKind::Appointments => plan.max_appointments_per_month,
        }
    }

    /// The snapshot count this resource is measured by.
    #[must_use]
    pub fn current(&self, usage: &UsageSnapshot) -> i64 {
        match self {
            ResourceKind::Users => usage.current_users,
            ResourceKind::Patients => usage.current_patients,
            ResourceKind::Appointments => usage.current_appointments_this_month,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived status of one resource against its plan ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitStatus {
    /// The resource this status describes.
    pub resource: ResourceKind,
    /// Current count from the snapshot.
    pub current: u64,
    /// Plan ceiling for this resource.
    pub max: u32,
    /// Capacity left before the ceiling, clamped at zero.
    pub remaining: u32,
    /// Rounded percentage of the ceiling in use. A zero ceiling reads as
    /// 100%.
    pub usage_percentage: u32,
    /// In the warning zone: 80% or more used, but not yet at the ceiling.
    pub is_approaching: bool,
    /// At or over the ceiling; further creations are blocked.
    pub is_at_limit: bool,
}

/// Compute the status of one resource for a plan and usage snapshot.
///
/// Deterministic and free of I/O: calling it twice with identical inputs
/// yields identical results.
///
/// # Errors
///
/// Returns [`PlanError::InvalidUsage`] if the snapshot carries a negative
/// count for the resource. Negative counts are upstream data bugs and are
/// rejected rather than clamped so they surface.
pub fn evaluate(
    plan: &PlanTier,
    usage: &UsageSnapshot,
    resource: ResourceKind,
) -> Result<LimitStatus> {
    let raw = resource.current(usage);
    if raw < 0 {
        tracing::warn!(
            target: "carelane_plans::limits",
            organization_id = %usage.organization_id,
            resource = %resource,
            value = raw,
            "Rejecting usage snapshot with negative count"
        );
        return Err(PlanError::InvalidUsage {
            resource,
            value: raw,
        });
    }
    let current = raw as u64;
    let max = resource.ceiling(plan);

    let usage_percentage = if max == 0 {
        100
    } else {
        ((current as f64 / f64::from(max)) * 100.0).round() as u32
    };
    let remaining = u64::from(max).saturating_sub(current) as u32;
    let is_at_limit = usage_percentage >= 100;
    let is_approaching = usage_percentage >= APPROACHING_THRESHOLD && !is_at_limit;

    Ok(LimitStatus {
        resource,
        current,
        max,
        remaining,
        usage_percentage,
        is_approaching,
        is_at_limit,
    })
}

/// Check whether one more unit of the resource can be created.
///
/// # Errors
///
/// Propagates [`PlanError::InvalidUsage`] from [`evaluate`].
pub fn can_add_resource(
    plan: &PlanTier,
    usage: &UsageSnapshot,
    resource: ResourceKind,
) -> Result<bool> {
    Ok(!evaluate(plan, usage, resource)?.is_at_limit)
}

/// Status of every resource, in the fixed order of [`ResourceKind::ALL`].
///
/// This is the feed for the plan-usage dashboard widget.
///
/// # Errors
///
/// Propagates [`PlanError::InvalidUsage`] from [`evaluate`].
pub fn summary(plan: &PlanTier, usage: &UsageSnapshot) -> Result<Vec<LimitStatus>> {
    ResourceKind::ALL
        .iter()
        .map(|resource| evaluate(plan, usage, *resource))
        .collect()
}
