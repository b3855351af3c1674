//! Plan catalog: tier definitions, resource ceilings, and feature flags.
//!
//! The catalog is constant for the process lifetime. Construction validates
//! the tier ordering, pricing, and the capability-monotonicity invariant
//! (every higher tier is a superset of the one below), so a mis-authored
//! catalog fails at load time rather than at call time.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Identifier of a subscription tier, in ascending capability order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierId {
    Basic,
    Professional,
    Enterprise,
}

impl TierId {
    /// All tiers in ascending capability order.
    ///
    /// Order is significant: "next tier" derivation walks this sequence.
    pub const ALL: [TierId; 3] = [TierId::Basic, TierId::Professional, TierId::Enterprise];

    /// Get the tier identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TierId::Basic => "basic",
            TierId::Professional => "professional",
            TierId::Enterprise => "enterprise",
        }
    }

    /// Human-facing tier name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            TierId::Basic => "Basic",
            TierId::Professional => "Professional",
            TierId::Enterprise => "Enterprise",
        }
    }

    /// Numeric order of this tier (0 = lowest).
    #[must_use]
    pub fn order(&self) -> u8 {
        match self {
            TierId::Basic => 0,
            TierId::Professional => 1,
            TierId::Enterprise => 2,
        }
    }

    /// The next tier up, or `None` at the top of the ladder.
    ///
    /// Callers must handle the `None` case (e.g. by pointing at sales)
    /// rather than fabricating a tier.
    #[must_use]
    pub fn successor(&self) -> Option<TierId> {
        match self {
            TierId::Basic => Some(TierId::Professional),
            TierId::Professional => Some(TierId::Enterprise),
            TierId::Enterprise => None,
        }
    }

    /// Check if this tier is higher than another.
    #[must_use]
    pub fn is_higher_than(&self, other: TierId) -> bool {
        self.order() > other.order()
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TierId {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(TierId::Basic),
            "professional" => Ok(TierId::Professional),
            "enterprise" => Ok(TierId::Enterprise),
            other => Err(PlanError::UnknownTier(other.to_string())),
        }
    }
}

/// Feature flags a plan can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ManageUsers,
    ViewReports,
    IntegrateLabs,
    SendSms,
    ExportData,
    UseApi,
    MultipleBranches,
    CustomizeRoles,
    AuditLogs,
    IntegrateHis,
    CreateMedicalRecords,
}

/// Support level offered with a plan, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Email,
    Priority,
    #[serde(rename = "24/7")]
    AroundTheClock,
}

/// Backup level offered with a plan, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupLevel {
    Basic,
    Automatic,
    Enterprise,
}

/// An immutable, catalog-defined subscription tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTier {
    /// Tier identifier.
    pub id: TierId,
    /// Display name for pricing pages.
    pub display_name: String,
    /// Monthly price in the catalog currency.
    pub monthly_price: f64,
    /// Yearly price in the catalog currency.
    pub yearly_price: f64,
    /// Maximum number of staff users.
    pub max_users: u32,
    /// Maximum number of patients on file.
    pub max_patients: u32,
    /// Maximum appointments bookable per calendar month.
    pub max_appointments_per_month: u32,
    /// Features available on this plan.
    pub features: BTreeSet<Feature>,
    /// Support channel included with this plan.
    pub support_level: SupportLevel,
    /// Backup arrangement included with this plan.
    pub backup_level: BackupLevel,
}

impl PlanTier {
    /// Check if this plan has a specific feature.
    #[must_use]
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Check if this plan sits above another on the tier ladder.
    #[must_use]
    pub fn is_upgrade_from(&self, other: &PlanTier) -> bool {
        self.id.is_higher_than(other.id)
    }
}

/// The catalog of defined plan tiers.
///
/// Holds the three tiers in ascending capability order. Data is constant for
/// the process lifetime; there are no side effects.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<PlanTier>,
}

impl PlanCatalog {
    /// Build a catalog from tier definitions, running the load-time
    /// self-check.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidCatalog`] if the tiers are not exactly
    /// basic/professional/enterprise in ascending order, or if any ceiling,
    /// feature set, support level, or backup level decreases between
    /// adjacent tiers. Returns [`PlanError::InvalidPrice`] for non-positive
    /// prices or a yearly price that does not undercut twelve months.
    pub fn new(plans: Vec<PlanTier>) -> Result<Self> {
        let expected: Vec<TierId> = TierId::ALL.to_vec();
        let actual: Vec<TierId> = plans.iter().map(|p| p.id).collect();
        if actual != expected {
            return Err(PlanError::InvalidCatalog(format!(
                "expected tiers {:?} in order, got {:?}",
                expected, actual
            )));
        }

        for plan in &plans {
            if plan.monthly_price <= 0.0 {
                return Err(PlanError::InvalidPrice(format!(
                    "{}: monthly price must be positive, got {}",
                    plan.id, plan.monthly_price
                )));
            }
            if plan.yearly_price <= 0.0 {
                return Err(PlanError::InvalidPrice(format!(
                    "{}: yearly price must be positive, got {}",
                    plan.id, plan.yearly_price
                )));
            }
            if plan.yearly_price >= plan.monthly_price * 12.0 {
                return Err(PlanError::InvalidPrice(format!(
                    "{}: yearly price {} does not undercut 12 months at {}",
                    plan.id, plan.yearly_price, plan.monthly_price
                )));
            }
        }

        for pair in plans.windows(2) {
            let (lower, higher) = (&pair[0], &pair[1]);
            let ceilings = [
                ("max_users", lower.max_users, higher.max_users),
                ("max_patients", lower.max_patients, higher.max_patients),
                (
                    "max_appointments_per_month",
                    lower.max_appointments_per_month,
                    higher.max_appointments_per_month,
                ),
            ];
            for (name, low, high) in ceilings {
                if high < low {
                    return Err(PlanError::InvalidCatalog(format!(
                        "{} decreases from {} ({}) to {} ({})",
                        name, lower.id, low, higher.id, high
                    )));
                }
            }
            if !lower.features.is_subset(&higher.features) {
                return Err(PlanError::InvalidCatalog(format!(
                    "{} is missing features present in {}",
                    higher.id, lower.id
                )));
            }
            if higher.support_level < lower.support_level {
                return Err(PlanError::InvalidCatalog(format!(
                    "support level decreases from {} to {}",
                    lower.id, higher.id
                )));
            }
            if higher.backup_level < lower.backup_level {
                return Err(PlanError::InvalidCatalog(format!(
                    "backup level decreases from {} to {}",
                    lower.id, higher.id
                )));
            }
        }

        Ok(Self { plans })
    }

    /// The standard Carelane catalog.
    ///
    /// # Panics
    ///
    /// Panics if the built-in data fails the self-check, which indicates a
    /// mis-authored catalog and is a development-time defect.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(standard_tiers()).expect("built-in plan catalog must pass the self-check")
    }

    /// Get a plan by tier identifier.
    #[must_use]
    pub fn get(&self, id: TierId) -> &PlanTier {
        // Validated at construction: one plan per tier, in order.
        &self.plans[id.order() as usize]
    }

    /// Get a plan by its string identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnknownTier`] if the identifier does not name a
    /// defined tier.
    pub fn get_by_id(&self, id: &str) -> Result<&PlanTier> {
        let tier: TierId = id.parse()?;
        Ok(self.get(tier))
    }

    /// All plans in ascending capability order.
    #[must_use]
    pub fn list(&self) -> &[PlanTier] {
        &self.plans
    }

    /// The tier directly above the given one, if any.
    #[must_use]
    pub fn next_tier(&self, id: TierId) -> Option<&PlanTier> {
        id.successor().map(|next| self.get(next))
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_tiers() -> Vec<PlanTier> {
    use Feature::*;

    vec![
        PlanTier {
            id: TierId::Basic,
            display_name: "Basic".to_string(),
            monthly_price: 19.99,
            yearly_price: 199.99,
            max_users: 1,
            max_patients: 200,
            max_appointments_per_month: 300,
            features: BTreeSet::from([CreateMedicalRecords]),
            support_level: SupportLevel::Email,
            backup_level: BackupLevel::Basic,
        },
        PlanTier {
            id: TierId::Professional,
            display_name: "Professional".to_string(),
            monthly_price: 39.99,
            yearly_price: 399.99,
            max_users: 5,
            max_patients: 1000,
            max_appointments_per_month: 2000,
            features: BTreeSet::from([
                CreateMedicalRecords,
                ManageUsers,
                ViewReports,
                SendSms,
                ExportData,
            ]),
            support_level: SupportLevel::Priority,
            backup_level: BackupLevel::Automatic,
        },
        PlanTier {
            id: TierId::Enterprise,
            display_name: "Enterprise".to_string(),
            monthly_price: 79.99,
            yearly_price: 799.99,
            max_users: 100,
            max_patients: 10_000,
            max_appointments_per_month: 20_000,
            features: BTreeSet::from([
                CreateMedicalRecords,
                ManageUsers,
                ViewReports,
                IntegrateLabs,
                SendSms,
                ExportData,
                UseApi,
                MultipleBranches,
                CustomizeRoles,
                AuditLogs,
                IntegrateHis,
            ]),
            support_level: SupportLevel::AroundTheClock,
            backup_level: BackupLevel::Enterprise,
        },
    ]
}
