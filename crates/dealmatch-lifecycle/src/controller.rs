//! Deal lifecycle controller.
//!
//! Owns every state transition after an offer is stored:
//! 1. `create`: turn a compatible (job, resource) pair into a deal
//! 2. `agree`, `submit_results`, `judge`, `mediate`: external signals
//! 3. timeout enforcement (see [`crate::timeouts`])
//!
//! Deals and their parent offers always move together through
//! [`SolverStore::advance_deal`], and every committed move is reported to
//! the [`NotificationSink`] as a single event after the store write
//! succeeds.

use std::sync::Arc;

use tracing::{debug, error, info};

use dealmatch_matchcore::check_compatibility;
use dealmatch_store::{LockstepUpdate, SolverStore};
use dealmatch_types::{
    AgreementState, Clock, ContentAddresser, Deal, DealContainer, DealId, JobResult, OfferId,
    Result, SolverError, TransitionCause, TransitionEvent, Verdict,
};

use crate::notify::NotificationSink;

/// Drives deals through the agreement state machine.
pub struct DealController {
    store: Arc<dyn SolverStore>,
    addresser: Arc<dyn ContentAddresser>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    /// Extra attempts after a lost compare-and-set race.
    max_retries: u32,
}

impl DealController {
    #[must_use]
    pub fn new(
        store: Arc<dyn SolverStore>,
        addresser: Arc<dyn ContentAddresser>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
        max_retries: u32,
    ) -> Self {
        Self {
            store,
            addresser,
            clock,
            sink,
            max_retries,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SolverStore> {
        &self.store
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // -----------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------

    /// Create a deal between a job offer and a resource offer.
    ///
    /// Both offers are re-read and must still be `Open`; trust and pricing
    /// are resolved against the stored copies, so a stale plan cannot
    /// produce a deal on outdated terms.
    ///
    /// # Errors
    /// - `NotFound` if either offer is gone
    /// - `AlreadyMatched` if either offer left `Open`
    /// - any pair incompatibility from [`check_compatibility`]
    pub fn create(&self, job_id: &OfferId, resource_id: &OfferId) -> Result<DealContainer> {
        let job = self.store.get_job_offer(job_id)?;
        let resource = self.store.get_resource_offer(resource_id)?;
        if job.state != AgreementState::Open {
            return Err(SolverError::AlreadyMatched {
                id: job_id.to_string(),
                state: job.state,
            });
        }
        if resource.state != AgreementState::Open {
            return Err(SolverError::AlreadyMatched {
                id: resource_id.to_string(),
                state: resource.state,
            });
        }

        let resolved = check_compatibility(&job.job_offer, &resource.resource_offer)?;
        let mut deal = Deal::new(
            job.job_offer,
            resource.resource_offer,
            resolved.directory,
            resolved.mediators,
            resolved.terms,
        );
        deal.id = self.addresser.deal_id(&deal)?;

        let committed = self
            .store
            .commit_match(DealContainer::new(deal, self.clock.now()))?;

        let deal_id = committed.deal.id.clone();
        self.sink.notify(&TransitionEvent {
            deal_id: deal_id.clone(),
            job_offer_id: committed.job_offer.id.clone(),
            resource_offer_id: committed.resource_offer.id.clone(),
            from: AgreementState::Open,
            to: AgreementState::Negotiating,
            cause: TransitionCause::Match,
            forfeited_collateral: None,
            at: committed.deal.created_at,
        });

        info!(
            deal = %deal_id,
            job = %job_id.short(),
            resource = %resource_id.short(),
            price = committed.deal.deal.pricing.instruction_price,
            directory = %committed.deal.deal.members.directory,
            "Deal created"
        );
        Ok(committed.deal)
    }

    // -----------------------------------------------------------------
    // External signals
    // -----------------------------------------------------------------

    /// `Negotiating -> Agreed`. Agreeing twice is a no-op.
    pub fn agree(&self, id: &DealId) -> Result<DealContainer> {
        self.drive(id, "agree", None, |deal| match deal.state {
            AgreementState::Negotiating => Ok(Some(AgreementState::Agreed)),
            AgreementState::Agreed => Ok(None),
            other => Err(invalid(id, other, AgreementState::Agreed)),
        })
    }

    /// `Agreed -> ResultsSubmitted`, recording `result` on the deal in the
    /// same write when given.
    ///
    /// # Errors
    /// `InvalidRecord` if `result` names another deal; the deal is left
    /// untouched.
    pub fn submit_results(&self, id: &DealId, result: Option<JobResult>) -> Result<DealContainer> {
        let result = result.map(|r| r.bind_to(id)).transpose()?;
        self.drive(id, "submit_results", result.as_ref(), |deal| match deal.state {
            AgreementState::Agreed => Ok(Some(AgreementState::ResultsSubmitted)),
            other => Err(invalid(id, other, AgreementState::ResultsSubmitted)),
        })
    }

    /// Apply the job creator's verdict: `ResultsSubmitted -> ResultsJudged`,
    /// then on to `Completed` (accepted) or `Mediating` (disputed).
    pub fn judge(&self, id: &DealId, verdict: Verdict) -> Result<DealContainer> {
        self.drive(id, "judge", None, |deal| match deal.state {
            AgreementState::ResultsSubmitted => Ok(Some(AgreementState::ResultsJudged)),
            other => Err(invalid(id, other, AgreementState::ResultsJudged)),
        })?;

        let next = verdict.after_judging();
        self.drive(id, "judge", None, |deal| match deal.state {
            AgreementState::ResultsJudged => Ok(Some(next)),
            other => Err(invalid(id, other, next)),
        })
    }

    /// Apply a mediator's verdict: `Mediating -> Completed | Cancelled`.
    pub fn mediate(&self, id: &DealId, verdict: Verdict) -> Result<DealContainer> {
        let next = verdict.after_mediation();
        self.drive(id, "mediate", None, |deal| match deal.state {
            AgreementState::Mediating => Ok(Some(next)),
            other => Err(invalid(id, other, next)),
        })
    }

    /// Read-decide-advance loop shared by the signal handlers.
    ///
    /// `decide` returns the next state, or `None` when the deal is already
    /// where the signal would put it. A lost compare-and-set race re-reads
    /// the deal and decides again, up to `max_retries` times.
    fn drive<F>(
        &self,
        id: &DealId,
        op: &'static str,
        result: Option<&JobResult>,
        decide: F,
    ) -> Result<DealContainer>
    where
        F: Fn(&DealContainer) -> Result<Option<AgreementState>>,
    {
        let mut attempt = 0u32;
        loop {
            let current = self.store.get_deal(id)?;
            let next = match decide(&current) {
                Ok(Some(next)) => next,
                Ok(None) => return Ok(current),
                Err(err) => {
                    error!(deal = %id, op, state = %current.state, error = %err, "Rejected signal");
                    return Err(err);
                }
            };

            let step = Step {
                from: current.state,
                to: next,
                cause: TransitionCause::Signal,
                forfeited: None,
                result: result.cloned(),
            };
            match self.advance(id, step) {
                Ok(update) => return Ok(update.deal),
                Err(SolverError::StaleState { actual, .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    debug!(deal = %id, op, attempt, %actual, "Lost race, retrying");
                }
                Err(err) => {
                    if matches!(err, SolverError::InvalidTransition { .. }) {
                        error!(deal = %id, op, error = %err, "Invalid transition");
                    }
                    return Err(err);
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Commit + notify
    // -----------------------------------------------------------------

    /// Move a deal and both parent offers through `step`, then emit one
    /// event for the three records.
    pub(crate) fn advance(&self, id: &DealId, step: Step) -> Result<LockstepUpdate> {
        let Step {
            from,
            to,
            cause,
            forfeited,
            result,
        } = step;
        let at = self.clock.now();
        let update = self.store.advance_deal(id, from, to, result, at)?;

        self.sink.notify(&TransitionEvent {
            deal_id: id.clone(),
            job_offer_id: update.job_offer.id.clone(),
            resource_offer_id: update.resource_offer.id.clone(),
            from,
            to,
            cause,
            forfeited_collateral: forfeited,
            at,
        });

        debug!(deal = %id, %from, %to, ?cause, "Deal advanced");
        Ok(update)
    }
}

/// One lockstep move of a deal and its offers.
pub(crate) struct Step {
    pub from: AgreementState,
    pub to: AgreementState,
    pub cause: TransitionCause,
    /// Collateral to forfeit, for timeout moves.
    pub forfeited: Option<u64>,
    /// Results to attach in the same write.
    pub result: Option<JobResult>,
}

fn invalid(id: &DealId, from: AgreementState, to: AgreementState) -> SolverError {
    SolverError::InvalidTransition {
        id: id.as_str().to_string(),
        from,
        to,
    }
}
