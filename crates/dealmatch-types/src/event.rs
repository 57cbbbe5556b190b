//! Committed state transitions, as delivered to the notification sink.
//!
//! A deal and its two parent offers always move together, so one event
//! covers all three records. Execution and settlement backends consume
//! these; a timeout-forced transition is reported exactly like a
//! user-driven one, with [`TransitionCause::Timeout`] and the collateral to
//! forfeit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AgreementState, DealId, OfferId};

/// What triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionCause {
    /// The matching engine paired the offers.
    Match,
    /// An external signal (agreement, results, verdict).
    Signal,
    /// A stage deadline passed.
    Timeout,
}

/// One committed transition of a deal and both of its offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub deal_id: DealId,
    pub job_offer_id: OfferId,
    pub resource_offer_id: OfferId,
    pub from: AgreementState,
    pub to: AgreementState,
    pub cause: TransitionCause,
    /// Collateral the settlement layer should forfeit. Only set on
    /// timeout-driven transitions.
    pub forfeited_collateral: Option<u64>,
    pub at: DateTime<Utc>,
}

impl TransitionEvent {
    /// Whether `id` is the deal or one of its offers.
    #[must_use]
    pub fn touches(&self, id: &str) -> bool {
        self.deal_id.as_str() == id
            || self.job_offer_id.as_str() == id
            || self.resource_offer_id.as_str() == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_event_names_all_three_records() {
        let event = TransitionEvent {
            deal_id: DealId::new("d1"),
            job_offer_id: OfferId::new("j1"),
            resource_offer_id: OfferId::new("r1"),
            from: AgreementState::Agreed,
            to: AgreementState::Cancelled,
            cause: TransitionCause::Timeout,
            forfeited_collateral: Some(20),
            at: Utc::now(),
        };
        assert!(event.touches("d1"));
        assert!(event.touches("j1"));
        assert!(event.touches("r1"));
        assert!(!event.touches("r2"));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"job_offer_id\":\"j1\""));
    }
}
