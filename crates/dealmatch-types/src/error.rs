//! Error types for the dealmatch solver.
//!
//! All errors use the `DM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Record errors (malformed or duplicate input)
//! - 2xx: Store / concurrency errors
//! - 3xx: Pair incompatibility (permanent for that pair)
//! - 4xx: Lifecycle errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::AgreementState;

/// Central error enum for all dealmatch operations.
#[derive(Debug, Error)]
pub enum SolverError {
    // =================================================================
    // Record Errors (1xx)
    // =================================================================
    /// The record failed validation (missing party, unpinned module, ...).
    #[error("DM_ERR_100: Invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// A different record is already stored under this identifier.
    #[error("DM_ERR_101: Duplicate id with different content: {0}")]
    DuplicateId(String),

    // =================================================================
    // Store / Concurrency Errors (2xx)
    // =================================================================
    /// No record with this identifier.
    #[error("DM_ERR_200: {kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The caller's view of the record is out of date.
    #[error("DM_ERR_201: Stale state for {id}: expected {expected}, found {actual}")]
    StaleState {
        id: String,
        expected: AgreementState,
        actual: AgreementState,
    },

    /// One of the offers left `Open` between scan and commit.
    #[error("DM_ERR_202: Offer already matched: {id} is {state}")]
    AlreadyMatched { id: String, state: AgreementState },

    /// Offers can only be removed while `Open`.
    #[error("DM_ERR_203: Offer {id} cannot be removed in state {state}")]
    NotRemovable { id: String, state: AgreementState },

    // =================================================================
    // Pair Incompatibility (3xx)
    // =================================================================
    /// The resource offer's allow-list excludes the job's module.
    #[error("DM_ERR_300: Module not allowed by resource offer: {module}")]
    ModuleNotAllowed { module: String },

    /// The resource offer is short on at least one component.
    #[error("DM_ERR_301: Insufficient capacity: short on {short}")]
    InsufficientCapacity { short: String },

    /// No mediator or directory trusted by both sides.
    #[error("DM_ERR_302: No trusted {parties} in common")]
    NoTrustOverlap { parties: &'static str },

    /// Both sides fixed their price and the terms differ.
    #[error("DM_ERR_303: Fixed-price terms differ")]
    PriceMismatch,

    /// Neither side fixed a price; there is no price discovery.
    #[error("DM_ERR_304: Both sides ask for market price; no fixed-price anchor")]
    AmbiguousPrice,

    // =================================================================
    // Lifecycle Errors (4xx)
    // =================================================================
    /// The state machine does not allow this move.
    #[error("DM_ERR_400: Invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: AgreementState,
        to: AgreementState,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("DM_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("DM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, zero intervals, ...).
    #[error("DM_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl SolverError {
    /// Caused by a concurrent modification; re-read and retry the whole
    /// operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleState { .. } | Self::AlreadyMatched { .. })
    }

    /// Permanent incompatibility between one job offer and one resource
    /// offer. The pair is skipped, not retried.
    #[must_use]
    pub fn is_pair_incompatibility(&self) -> bool {
        matches!(
            self,
            Self::ModuleNotAllowed { .. }
                | Self::InsufficientCapacity { .. }
                | Self::NoTrustOverlap { .. }
                | Self::PriceMismatch
                | Self::AmbiguousPrice
        )
    }

    /// The `DM_ERR_nnn` code.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidRecord { .. } => 100,
            Self::DuplicateId(_) => 101,
            Self::NotFound { .. } => 200,
            Self::StaleState { .. } => 201,
            Self::AlreadyMatched { .. } => 202,
            Self::NotRemovable { .. } => 203,
            Self::ModuleNotAllowed { .. } => 300,
            Self::InsufficientCapacity { .. } => 301,
            Self::NoTrustOverlap { .. } => 302,
            Self::PriceMismatch => 303,
            Self::AmbiguousPrice => 304,
            Self::InvalidTransition { .. } => 400,
            Self::Internal(_) => 900,
            Self::Serialization(_) => 901,
            Self::Configuration(_) => 902,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SolverError>;

impl From<serde_json::Error> for SolverError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SolverError::NotFound {
            kind: "job offer",
            id: "abc".into(),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("DM_ERR_200"), "Got: {msg}");
        assert!(msg.contains("job offer"));
    }

    #[test]
    fn stale_state_display() {
        let err = SolverError::StaleState {
            id: "x".into(),
            expected: AgreementState::Open,
            actual: AgreementState::Negotiating,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OPEN"));
        assert!(msg.contains("NEGOTIATING"));
    }

    #[test]
    fn code_matches_display_prefix() {
        let errors = vec![
            SolverError::PriceMismatch,
            SolverError::AmbiguousPrice,
            SolverError::DuplicateId("a".into()),
            SolverError::NoTrustOverlap { parties: "mediators" },
            SolverError::Internal("x".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with(&format!("DM_ERR_{}", err.code())),
                "code/display mismatch: {msg}"
            );
        }
    }

    #[test]
    fn classification() {
        assert!(
            SolverError::AlreadyMatched {
                id: "j".into(),
                state: AgreementState::Negotiating
            }
            .is_retryable()
        );
        assert!(SolverError::PriceMismatch.is_pair_incompatibility());
        assert!(!SolverError::PriceMismatch.is_retryable());
        assert!(
            !SolverError::InvalidRecord { reason: "x".into() }.is_pair_incompatibility()
        );
    }
}
