//! Usage snapshots and collaborator seams.
//!
//! The core never performs I/O of its own: usage counts arrive through
//! [`UsageSnapshotProvider`] and plan changes leave through
//! [`BillingGateway`]. Both are async boundaries strictly outside the core;
//! everything computed from a snapshot is pure and synchronous.
//!
//! Snapshot freshness is a caller policy. A snapshot is treated as acceptable
//! up to the provider's refresh interval; two concurrent creations both
//! reading "1 remaining" is an accepted eventual-consistency gap, not a
//! correctness bug of this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::TierId;
use crate::error::Result;

/// Point-in-time counts of billable resources for an organization.
///
/// Recomputed on demand from the resource store; never persisted by this
/// crate. Counts are carried as `i64` so that malformed upstream data can be
/// detected and rejected instead of silently wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Organization the counts belong to.
    pub organization_id: Uuid,
    /// Staff users currently registered.
    pub current_users: i64,
    /// Patients currently on file.
    pub current_patients: i64,
    /// Appointments booked in the current calendar month.
    pub current_appointments_this_month: i64,
    /// When the counts were computed.
    pub computed_at: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Create a snapshot timestamped now.
    #[must_use]
    pub fn new(organization_id: Uuid, users: i64, patients: i64, appointments: i64) -> Self {
        Self {
            organization_id,
            current_users: users,
            current_patients: patients,
            current_appointments_this_month: appointments,
            computed_at: Utc::now(),
        }
    }
}

/// Source of current resource counts for an organization.
#[async_trait]
pub trait UsageSnapshotProvider: Send + Sync {
    /// Fetch the current usage snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlanError::DataUnavailable`] when counts cannot be
    /// computed (e.g. the resource store is unreachable).
    async fn fetch(&self, organization_id: Uuid) -> Result<UsageSnapshot>;
}

/// Billing cycle for a plan-change transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// Billing cycle as the payment collaborator's interval string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// A plan-change request handed to the billing collaborator.
///
/// The core only decides *which* tier to request; how the transaction is
/// carried out is opaque to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanChangeRequest {
    /// Tier to move the organization to.
    pub target: TierId,
    /// Billing cycle for the new plan.
    pub cycle: BillingCycle,
}

/// Outcome of initiating a plan change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanChangeOutcome {
    /// The caller must redirect the user to complete checkout.
    Redirect { url: String },
    /// The change was applied directly (e.g. via a saved payment method).
    Confirmed,
}

/// External billing collaborator that carries out plan changes.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Start a checkout or portal session moving the organization to the
    /// requested plan.
    async fn initiate_plan_change(
        &self,
        organization_id: Uuid,
        request: PlanChangeRequest,
    ) -> Result<PlanChangeOutcome>;
}

pub mod test {
    //! In-memory test doubles for the collaborator seams.

    use super::*;
    use crate::error::PlanError;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// In-memory usage provider for testing.
    ///
    /// Wraps data in `Arc` for cheap cloning.
    #[derive(Default, Clone)]
    pub struct InMemoryUsageProvider {
        snapshots: Arc<RwLock<HashMap<Uuid, UsageSnapshot>>>,
    }

    impl InMemoryUsageProvider {
        /// Create a new empty provider.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a snapshot for an organization.
        pub fn seed(&self, snapshot: UsageSnapshot) {
            self.snapshots
                .write()
                .unwrap()
                .insert(snapshot.organization_id, snapshot);
        }
    }

    #[async_trait]
    impl UsageSnapshotProvider for InMemoryUsageProvider {
        async fn fetch(&self, organization_id: Uuid) -> Result<UsageSnapshot> {
            self.snapshots
                .read()
                .unwrap()
                .get(&organization_id)
                .cloned()
                .ok_or_else(|| {
                    PlanError::DataUnavailable(format!(
                        "no usage snapshot for organization {organization_id}"
                    ))
                })
        }
    }

    /// Billing gateway that records requests and returns a canned redirect.
    #[derive(Default, Clone)]
    pub struct RecordingBillingGateway {
        requests: Arc<RwLock<Vec<(Uuid, PlanChangeRequest)>>>,
    }

    impl RecordingBillingGateway {
        /// Create a new recording gateway.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Requests received so far.
        pub fn requests(&self) -> Vec<(Uuid, PlanChangeRequest)> {
            self.requests.read().unwrap().clone()
        }
    }

    #[async_trait]
    impl BillingGateway for RecordingBillingGateway {
        async fn initiate_plan_change(
            &self,
            organization_id: Uuid,
            request: PlanChangeRequest,
        ) -> Result<PlanChangeOutcome> {
            let url = format!(
                "https://billing.example.com/checkout?plan={}&cycle={}",
                request.target, request.cycle.as_str()
            );
            self.requests
                .write()
                .unwrap()
                .push((organization_id, request));
            Ok(PlanChangeOutcome::Redirect { url })
        }
    }
}
