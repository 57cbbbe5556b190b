//! Stateful containers: the units the store actually manages.
//!
//! The payload inside a container never changes after it is stored; only
//! `state`, `deal_id` and `state_entered_at` move.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, AgreementState, Deal, DealId, JobOffer, JobResult, OfferId, ResourceOffer};

/// Solver-side record of a job offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOfferContainer {
    pub id: OfferId,
    /// Set once the offer is matched.
    pub deal_id: Option<DealId>,
    pub job_creator: Address,
    pub state: AgreementState,
    /// When `state` was entered. Timeouts are measured from here.
    pub state_entered_at: DateTime<Utc>,
    pub job_offer: JobOffer,
}

impl JobOfferContainer {
    /// Wrap a hashed offer in state `Open`.
    #[must_use]
    pub fn new(job_offer: JobOffer, at: DateTime<Utc>) -> Self {
        Self {
            id: job_offer.id.clone(),
            deal_id: None,
            job_creator: job_offer.job_creator.clone(),
            state: AgreementState::Open,
            state_entered_at: at,
            job_offer,
        }
    }
}

/// Solver-side record of a resource offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOfferContainer {
    pub id: OfferId,
    pub deal_id: Option<DealId>,
    pub resource_provider: Address,
    pub state: AgreementState,
    pub state_entered_at: DateTime<Utc>,
    pub resource_offer: ResourceOffer,
}

impl ResourceOfferContainer {
    #[must_use]
    pub fn new(resource_offer: ResourceOffer, at: DateTime<Utc>) -> Self {
        Self {
            id: resource_offer.id.clone(),
            deal_id: None,
            resource_provider: resource_offer.resource_provider.clone(),
            state: AgreementState::Open,
            state_entered_at: at,
            resource_offer,
        }
    }

    /// Derived "currently occupied" flag, see [`AgreementState::is_active`].
    /// Providers use it to decide when to post more capacity.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

/// Solver-side record of a deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealContainer {
    pub id: DealId,
    pub job_creator: Address,
    pub resource_provider: Address,
    pub job_offer: OfferId,
    pub resource_offer: OfferId,
    pub state: AgreementState,
    pub state_entered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub deal: Deal,
    /// Executor-reported results, once submitted.
    #[serde(default)]
    pub result: Option<JobResult>,
}

impl DealContainer {
    /// Wrap a hashed deal in state `Negotiating`.
    #[must_use]
    pub fn new(deal: Deal, at: DateTime<Utc>) -> Self {
        Self {
            id: deal.id.clone(),
            job_creator: deal.members.job_creator.clone(),
            resource_provider: deal.members.resource_provider.clone(),
            job_offer: deal.job_offer.id.clone(),
            resource_offer: deal.resource_offer.id.clone(),
            state: AgreementState::Negotiating,
            state_entered_at: at,
            created_at: at,
            deal,
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MachineSpec, dummy};

    #[test]
    fn new_offer_containers_are_open_and_inactive() {
        let mut r = ResourceOffer::dummy("rp", MachineSpec::new(0, 1000, 1024), 0, 0);
        r.id = OfferId::new("r1");
        let c = ResourceOfferContainer::new(r, Utc::now());
        assert_eq!(c.state, AgreementState::Open);
        assert!(!c.is_active());
        assert_eq!(c.id, OfferId::new("r1"));
        assert_eq!(c.resource_provider, Address::new("rp"));
    }

    #[test]
    fn deal_container_copies_parties_and_parents() {
        let mut j = JobOffer::dummy("jc", MachineSpec::default(), 1);
        j.id = OfferId::new("j1");
        let mut r = ResourceOffer::dummy("rp", MachineSpec::default(), 0, 0);
        r.id = OfferId::new("r1");
        let terms = r.terms_for(&j.module_id());
        let mut deal = Deal::new(
            j,
            r,
            Address::new("directory-1"),
            dummy::dummy_trust().mediator,
            terms,
        );
        deal.id = DealId::new("d1");

        let c = DealContainer::new(deal, Utc::now());
        assert_eq!(c.state, AgreementState::Negotiating);
        assert_eq!(c.job_offer, OfferId::new("j1"));
        assert_eq!(c.resource_offer, OfferId::new("r1"));
        assert_eq!(c.job_creator, Address::new("jc"));
        assert_eq!(c.deal.pricing.instruction_price, 10);
        assert!(c.result.is_none());
    }
}
