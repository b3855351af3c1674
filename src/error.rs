//! Error taxonomy for the plan-limits core.
//!
//! All core errors are local and deterministic: they are raised synchronously
//! to the immediate caller and never retried inside this crate. Retry, if any,
//! belongs to the async collaborators (e.g. re-fetching a usage snapshot after
//! a transient failure).

use thiserror::Error;

use crate::limits::ResourceKind;

/// Errors produced by the plan-limits core.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A tier identifier does not name one of the defined plan tiers.
    ///
    /// This is a programmer error (bad identifier reached the catalog), not a
    /// user-facing condition.
    #[error("Unknown plan tier: {0}")]
    UnknownTier(String),

    /// A usage snapshot carried a negative count.
    ///
    /// Negative counts cannot come from a well-formed snapshot, so this is
    /// surfaced instead of silently clamped. Callers should log it and show a
    /// degraded-state banner rather than crash.
    #[error("Invalid usage snapshot: {resource} count is negative ({value})")]
    InvalidUsage {
        resource: ResourceKind,
        value: i64,
    },

    /// The action-to-resource association is malformed for a known action.
    ///
    /// A development-time defect, not a recoverable runtime condition.
    #[error("Invalid action configuration: {0}")]
    Configuration(String),

    /// A plan was authored with a non-positive price.
    #[error("Invalid plan price: {0}")]
    InvalidPrice(String),

    /// A per-unit calculation was asked to divide by a zero capacity.
    #[error("Division by zero: {0} capacity is zero")]
    DivisionByZero(&'static str),

    /// The catalog failed its load-time self-check.
    ///
    /// Never occurs with a correctly authored catalog; fatal at load time,
    /// not at call time.
    #[error("Invalid plan catalog: {0}")]
    InvalidCatalog(String),

    /// A collaborator could not supply usage data.
    #[error("Usage data unavailable: {0}")]
    DataUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlanError {
    /// Check whether this error indicates a data-integrity problem in an
    /// upstream snapshot rather than a caller mistake.
    #[must_use]
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::InvalidUsage { .. })
    }

    /// Check whether this error should be treated as fatal at startup.
    ///
    /// Catalog and configuration defects can only be fixed by a code change,
    /// so there is no point continuing with a broken plan table.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::InvalidPrice(_) | Self::InvalidCatalog(_)
        )
    }

    /// Check whether the operation is worth retrying.
    ///
    /// Only collaborator I/O failures qualify; every core computation is
    /// deterministic and will fail the same way again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }
}

/// Result type alias for plan-limits operations.
pub type Result<T> = std::result::Result<T, PlanError>;
