//! carelane-plans - Plan limits and upgrade recommendations for Carelane
//!
//! This crate is the usage-enforcement core of the Carelane
//! practice-management platform: it decides whether an organization may
//! create another staff user, patient, appointment, or medical record under
//! its subscription plan, and which tier to recommend when it cannot.
//!
//! Everything here is pure, synchronous computation over values the caller
//! supplies. Fetching usage counts and carrying out plan changes are async
//! collaborator seams ([`UsageSnapshotProvider`], [`BillingGateway`]) that
//! live strictly outside the core.
//!
//! # Quick Start
//!
//! ```rust
//! use carelane_plans::{
//!     advisor, guard, limits, ActionKind, PlanCatalog, ResourceKind, TierId, UsageSnapshot,
//! };
//! use uuid::Uuid;
//!
//! let catalog = PlanCatalog::standard();
//! let plan = catalog.get(TierId::Basic);
//! let usage = UsageSnapshot::new(Uuid::new_v4(), 1, 50, 10);
//!
//! // Basic allows a single staff user, so this one is blocked.
//! let decision = guard::check_action(ActionKind::CreateUser, plan, &usage).unwrap();
//! assert!(!decision.allowed);
//!
//! // The advisor names the pressured resource and the next tier up.
//! let message = advisor::upgrade_message(plan, &usage).unwrap().unwrap();
//! assert!(message.contains("Professional"));
//!
//! // The dashboard widget feeds from one evaluation path.
//! let status = limits::evaluate(plan, &usage, ResourceKind::Patients).unwrap();
//! assert_eq!(status.usage_percentage, 25);
//! ```

pub mod advisor;
pub mod catalog;
mod error;
pub mod guard;
pub mod limits;
pub mod pricing;
pub mod usage;

// Re-exports for public API
pub use advisor::{recommendation, recommended_tier, should_prompt_upgrade, upgrade_message, UpgradeRecommendation};
pub use catalog::{BackupLevel, Feature, PlanCatalog, PlanTier, SupportLevel, TierId};
pub use error::{PlanError, Result};
pub use guard::{check_action, ActionDecision, ActionKind, GuardState};
pub use limits::{can_add_resource, evaluate, summary, LimitStatus, ResourceKind};
pub use pricing::{annual_savings_percent, cost_per_unit, value_ratio};
pub use usage::{
    BillingCycle, BillingGateway, PlanChangeOutcome, PlanChangeRequest, UsageSnapshot,
    UsageSnapshotProvider,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults
///
/// Call this early in the host application, before serving requests.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "carelane_plans=debug")
/// - `CARELANE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("CARELANE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
