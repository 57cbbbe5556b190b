//! Stage deadline enforcement.
//!
//! Each in-flight deal state has a deadline measured from the moment the
//! deal entered it. A missed deadline forces the deal (and its offers)
//! forward:
//!
//! | state              | deadline         | forced to   |
//! |--------------------|------------------|-------------|
//! | `Negotiating`      | `agree`          | `Cancelled` |
//! | `Agreed`           | `submit_results` | `Cancelled` |
//! | `ResultsSubmitted` | `judge_results`  | `Mediating` |
//! | `Mediating`        | `mediate_results`| `Cancelled` |
//!
//! A timeout of zero disables the stage's deadline. Every forced move is a
//! compare-and-set on the state the sweep observed, so running the sweep
//! twice, or concurrently with a signal, never double-applies.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use dealmatch_store::{DealQuery, SolverStore};
use dealmatch_types::{
    AgreementState, DealContainer, DealId, DealTimeout, DealTimeouts, Result, SolverError,
    TransitionCause,
};

use crate::controller::{DealController, Step};

/// One deal forced forward by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredDeal {
    pub deal_id: DealId,
    pub from: AgreementState,
    pub to: AgreementState,
    /// Collateral the settlement layer should forfeit.
    pub forfeited_collateral: u64,
}

/// The deadline that applies in `state` and where a miss sends the deal.
#[must_use]
pub fn stage_deadline(
    state: AgreementState,
    timeouts: &DealTimeouts,
) -> Option<(DealTimeout, AgreementState)> {
    match state {
        AgreementState::Negotiating => Some((timeouts.agree, AgreementState::Cancelled)),
        AgreementState::Agreed => Some((timeouts.submit_results, AgreementState::Cancelled)),
        AgreementState::ResultsSubmitted => {
            Some((timeouts.judge_results, AgreementState::Mediating))
        }
        AgreementState::Mediating => Some((timeouts.mediate_results, AgreementState::Cancelled)),
        _ => None,
    }
}

/// The missed deadline and its target state, if `deal` has overstayed its
/// current stage at `now`.
#[must_use]
pub fn expiry(deal: &DealContainer, now: DateTime<Utc>) -> Option<(DealTimeout, AgreementState)> {
    let (timeout, target) = stage_deadline(deal.state, &deal.deal.timeouts)?;
    if !timeout.is_enabled() {
        return None;
    }
    let elapsed = u64::try_from((now - deal.state_entered_at).num_seconds()).ok()?;
    (elapsed >= timeout.timeout).then_some((timeout, target))
}

const SWEPT_STATES: [AgreementState; 4] = [
    AgreementState::Negotiating,
    AgreementState::Agreed,
    AgreementState::ResultsSubmitted,
    AgreementState::Mediating,
];

impl DealController {
    /// Force every deal past its stage deadline forward, as of the
    /// controller's clock.
    ///
    /// A deal that moved concurrently is skipped; the next sweep sees its
    /// new state. Other per-deal failures are logged and the sweep goes on.
    pub fn enforce_timeouts(&self) -> Result<Vec<ExpiredDeal>> {
        let now = self.clock().now();
        let mut expired = Vec::new();

        for state in SWEPT_STATES {
            for deal in self.store().get_deals(&DealQuery::in_state(state))? {
                let Some((timeout, target)) = expiry(&deal, now) else {
                    continue;
                };

                let step = Step {
                    from: state,
                    to: target,
                    cause: TransitionCause::Timeout,
                    forfeited: Some(timeout.collateral),
                    result: None,
                };
                match self.advance(&deal.id, step) {
                    Ok(_) => {
                        warn!(
                            deal = %deal.id,
                            from = %state,
                            to = %target,
                            forfeited = timeout.collateral,
                            "Deal timed out"
                        );
                        expired.push(ExpiredDeal {
                            deal_id: deal.id,
                            from: state,
                            to: target,
                            forfeited_collateral: timeout.collateral,
                        });
                    }
                    Err(SolverError::StaleState { actual, .. }) => {
                        debug!(deal = %deal.id, %actual, "Deal moved before timeout applied");
                    }
                    Err(err) => {
                        warn!(deal = %deal.id, error = %err, "Timeout enforcement failed");
                    }
                }
            }
        }

        Ok(expired)
    }
}
