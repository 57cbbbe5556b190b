//! # Agreement state machine
//!
//! One closed set of states shared by deals and by the offer containers
//! they were built from. Once matched, an offer's state moves in lockstep
//! with its deal.
//!
//! ```text
//!   OPEN ──match──▶ NEGOTIATING ──agree──▶ AGREED ──submit──▶ RESULTS_SUBMITTED
//!                        │                    │                    │ judge
//!                        │ timeout            │ timeout            ▼
//!                        ▼                    ▼              RESULTS_JUDGED
//!                    CANCELLED ◀──────┐                       │        │
//!                                     │ reject / timeout  accept   dispute
//!                                     │                       ▼        ▼
//!                                 MEDIATING ──uphold──▶ COMPLETED   MEDIATING
//! ```
//!
//! A judging timeout moves `RESULTS_SUBMITTED` straight to `MEDIATING`.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an offer container or a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AgreementState {
    /// Posted and matchable. Offers only.
    Open,
    Negotiating,
    Agreed,
    ResultsSubmitted,
    ResultsJudged,
    Mediating,
    Completed,
    Cancelled,
}

impl AgreementState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::Open,
        Self::Negotiating,
        Self::Agreed,
        Self::ResultsSubmitted,
        Self::ResultsJudged,
        Self::Mediating,
        Self::Completed,
        Self::Cancelled,
    ];

    /// The transition table.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Negotiating)
                | (Self::Negotiating, Self::Agreed | Self::Cancelled)
                | (Self::Agreed, Self::ResultsSubmitted | Self::Cancelled)
                | (Self::ResultsSubmitted, Self::ResultsJudged | Self::Mediating)
                | (Self::ResultsJudged, Self::Completed | Self::Mediating)
                | (Self::Mediating, Self::Completed | Self::Cancelled)
        )
    }

    /// A resource offer in this state counts as occupied: compute is
    /// committed or running. From `ResultsSubmitted` on, the compute side
    /// is done and only payment and mediation remain.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Negotiating | Self::Agreed)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a deal in this state is still in flight.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal() && *self != Self::Open
    }
}

impl std::fmt::Display for AgreementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Negotiating => write!(f, "NEGOTIATING"),
            Self::Agreed => write!(f, "AGREED"),
            Self::ResultsSubmitted => write!(f, "RESULTS_SUBMITTED"),
            Self::ResultsJudged => write!(f, "RESULTS_JUDGED"),
            Self::Mediating => write!(f, "MEDIATING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Outcome reported by a judge (job creator) or a mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The results are correct.
    Accepted,
    /// The results are disputed (judge) or found incorrect (mediator).
    Rejected,
}

impl Verdict {
    /// Where a deal goes after `ResultsJudged`.
    #[must_use]
    pub fn after_judging(self) -> AgreementState {
        match self {
            Self::Accepted => AgreementState::Completed,
            Self::Rejected => AgreementState::Mediating,
        }
    }

    /// Where a deal goes after mediation.
    #[must_use]
    pub fn after_mediation(self) -> AgreementState {
        match self {
            Self::Accepted => AgreementState::Completed,
            Self::Rejected => AgreementState::Cancelled,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}
