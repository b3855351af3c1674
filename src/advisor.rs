//! Upgrade advisor: next-tier recommendations driven by limit pressure.
//!
//! When any resource enters the warning or blocking zone the advisor picks
//! the most urgent one and pairs it with the next tier up. The selection
//! logic is a behavioral contract: highest usage percentage wins, ties break
//! by the fixed order users, then patients, then appointments.

use serde::{Deserialize, Serialize};

use crate::catalog::{PlanTier, TierId};
use crate::error::Result;
use crate::limits::{self, LimitStatus};
use crate::usage::UsageSnapshot;

/// The tier to recommend from the given one.
///
/// Returns `None` at enterprise: there is no further upgrade, and callers
/// must handle that case (e.g. by suggesting contacting sales) instead of
/// fabricating a tier.
#[must_use]
pub fn recommended_tier(current: TierId) -> Option<TierId> {
    current.successor()
}

/// Whether the UI should offer an upgrade right now.
///
/// True iff at least one resource is approaching or at its limit, checked
/// across users, patients, and appointments in that fixed order.
///
/// # Errors
///
/// Propagates [`crate::PlanError::InvalidUsage`] from limit evaluation.
pub fn should_prompt_upgrade(plan: &PlanTier, usage: &UsageSnapshot) -> Result<bool> {
    Ok(limits::summary(plan, usage)?
        .iter()
        .any(|s| s.is_approaching || s.is_at_limit))
}

/// A concrete upgrade recommendation for the prompt workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeRecommendation {
    /// Status of the most urgent resource.
    pub status: LimitStatus,
    /// The tier to move to, or `None` when already at the top.
    pub recommended: Option<TierId>,
    /// Human-facing justification for the prompt.
    pub message: String,
}

/// Build the recommendation for the current limit pressure, if any.
///
/// The most urgent resource is the one with the highest usage percentage;
/// ties break in favor of users over patients over appointments.
///
/// # Errors
///
/// Propagates [`crate::PlanError::InvalidUsage`] from limit evaluation.
pub fn recommendation(
    plan: &PlanTier,
    usage: &UsageSnapshot,
) -> Result<Option<UpgradeRecommendation>> {
    let statuses = limits::summary(plan, usage)?;
    let most_urgent = statuses
        .into_iter()
        .filter(|s| s.is_approaching || s.is_at_limit)
        // `summary` yields the tie-break order, so only a strictly higher
        // percentage may displace an earlier resource.
        .reduce(|best, s| {
            if s.usage_percentage > best.usage_percentage {
                s
            } else {
                best
            }
        });

    let Some(status) = most_urgent else {
        return Ok(None);
    };

    let recommended = recommended_tier(plan.id);
    let message = compose_message(&status, recommended);

    tracing::debug!(
        target: "carelane_plans::advisor",
        organization_id = %usage.organization_id,
        plan = %plan.id,
        resource = %status.resource,
        usage_percentage = status.usage_percentage,
        recommended = recommended.map(|t| t.as_str()),
        "Upgrade prompt triggered"
    );

    Ok(Some(UpgradeRecommendation {
        status,
        recommended,
        message,
    }))
}

/// The upgrade prompt text, or `None` when no resource is under pressure.
///
/// # Errors
///
/// Propagates [`crate::PlanError::InvalidUsage`] from limit evaluation.
pub fn upgrade_message(plan: &PlanTier, usage: &UsageSnapshot) -> Result<Option<String>> {
    Ok(recommendation(plan, usage)?.map(|r| r.message))
}

fn compose_message(status: &LimitStatus, recommended: Option<TierId>) -> String {
    let resource = status.resource.display_name();
    match (status.is_at_limit, recommended) {
        (true, Some(tier)) => format!(
            "You have reached your limit of {} ({} of {}). Upgrade to the {} plan to keep going.",
            resource,
            status.current,
            status.max,
            tier.display_name()
        ),
        (true, None) => format!(
            "You have reached your limit of {} ({} of {}). Contact sales to extend your plan.",
            resource, status.current, status.max
        ),
        (false, Some(tier)) => format!(
            "You are approaching your limit of {} ({} of {}, {} remaining). Consider upgrading to the {} plan.",
            resource,
            status.current,
            status.max,
            status.remaining,
            tier.display_name()
        ),
        (false, None) => format!(
            "You are approaching your limit of {} ({} of {}, {} remaining). Contact sales if you need more capacity.",
            resource, status.current, status.max, status.remaining
        ),
    }
}
