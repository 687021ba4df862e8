//! Structured errors for network construction and solving.
//!
//! Every error carries the offending entity id plus a human-readable
//! detail, and is propagated unchanged to the caller — the engine never
//! retries or silently degrades. Negative float and constraint violations
//! are *not* errors; they are valid computed results.

use thiserror::Error;

/// Errors produced by the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpmError {
    /// A field on an activity, relationship, or calendar is missing or invalid.
    /// Fatal; reported before any pass runs.
    #[error("malformed input on `{entity}`: {detail}")]
    MalformedInput { entity: String, detail: String },

    /// A relationship or activity points at an entity that does not exist.
    #[error("dangling reference from `{entity}`: {detail}")]
    DanglingReference { entity: String, detail: String },

    /// The precedence graph contains a cycle. At least one participating
    /// activity is named; no scheduling is attempted.
    #[error("precedence network contains a cycle involving activity `{entity}`")]
    CyclicNetwork { entity: String },

    /// A calendar definition is ambiguous (duplicate exception dates).
    #[error("ambiguous calendar `{entity}`: {detail}")]
    AmbiguousCalendar { entity: String, detail: String },

    /// An activity was left unresolved after a full traversal of an
    /// already-cycle-checked network. Indicates a solver bug.
    #[error("internal inconsistency at `{entity}`: {detail}")]
    InternalInconsistency { entity: String, detail: String },
}

impl CpmError {
    /// Creates a `MalformedInput` error.
    pub fn malformed(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    /// Creates a `DanglingReference` error.
    pub fn dangling(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DanglingReference {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    /// Creates a `CyclicNetwork` error naming a participating activity.
    pub fn cyclic(entity: impl Into<String>) -> Self {
        Self::CyclicNetwork {
            entity: entity.into(),
        }
    }

    /// Creates an `AmbiguousCalendar` error.
    pub fn ambiguous_calendar(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::AmbiguousCalendar {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    /// Creates an `InternalInconsistency` error.
    pub fn internal(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InternalInconsistency {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    /// The id of the entity this error refers to.
    pub fn entity(&self) -> &str {
        match self {
            Self::MalformedInput { entity, .. }
            | Self::DanglingReference { entity, .. }
            | Self::CyclicNetwork { entity }
            | Self::AmbiguousCalendar { entity, .. }
            | Self::InternalInconsistency { entity, .. } => entity,
        }
    }
}
