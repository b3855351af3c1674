//! Pricing arithmetic for the plan comparison and pricing pages.
//!
//! Pure functions over catalog data. Nothing here feeds a gating decision;
//! the figures are display-only (per-unit cost, annual savings, value
//! ratios for marketing copy). Malformed inputs indicate a mis-authored
//! catalog and are rejected, which the catalog self-check turns into a
//! load-time failure.

use crate::catalog::PlanTier;
use crate::error::{PlanError, Result};
use crate::limits::ResourceKind;

/// Percentage saved by paying yearly instead of twelve monthly payments.
///
/// Computed as `round((monthly * 12 - yearly) / (monthly * 12) * 100)`.
///
/// # Errors
///
/// Returns [`PlanError::InvalidPrice`] if `monthly` is not positive.
pub fn annual_savings_percent(monthly: f64, yearly: f64) -> Result<i64> {
    if monthly <= 0.0 {
        return Err(PlanError::InvalidPrice(format!(
            "monthly price must be positive, got {monthly}"
        )));
    }
    let full_year = monthly * 12.0;
    Ok((((full_year - yearly) / full_year) * 100.0).round() as i64)
}

/// Monthly price per unit of capacity (e.g. cost per patient slot).
///
/// # Errors
///
/// Returns [`PlanError::DivisionByZero`] if `capacity` is zero.
pub fn cost_per_unit(monthly_price: f64, capacity: u32) -> Result<f64> {
    if capacity == 0 {
        return Err(PlanError::DivisionByZero("plan"));
    }
    Ok(monthly_price / f64::from(capacity))
}

/// How many times better the higher tier's capacity-per-dollar is on one
/// dimension.
///
/// Computed as `(higher[dim] / lower[dim]) / (higher.monthly / lower.monthly)`.
/// A ratio above 1.0 means the higher tier gives more capacity per dollar.
///
/// # Errors
///
/// Returns [`PlanError::DivisionByZero`] if the lower tier has zero capacity
/// on the dimension, or [`PlanError::InvalidPrice`] if either monthly price
/// is not positive.
pub fn value_ratio(higher: &PlanTier, lower: &PlanTier, dimension: ResourceKind) -> Result<f64> {
    if lower.monthly_price <= 0.0 || higher.monthly_price <= 0.0 {
        return Err(PlanError::InvalidPrice(
            "monthly prices must be positive for a value ratio".to_string(),
        ));
    }
    let lower_capacity = dimension.ceiling(lower);
    if lower_capacity == 0 {
        return Err(PlanError::DivisionByZero(dimension.as_str()));
    }

    let capacity_ratio = f64::from(dimension.ceiling(higher)) / f64::from(lower_capacity);
    let price_ratio = higher.monthly_price / lower.monthly_price;
    Ok(capacity_ratio / price_ratio)
}
