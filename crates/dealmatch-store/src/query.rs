//! Query filters for the `Get*s` operations.
//!
//! Every field is optional; `None` means "don't filter on this". An empty
//! result is never an error.

use dealmatch_types::{
    Address, AgreementState, DealContainer, JobOfferContainer, ResourceOfferContainer,
};

/// Filter for job offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOfferQuery {
    pub job_creator: Option<Address>,
    pub state: Option<AgreementState>,
}

impl JobOfferQuery {
    /// All job offers still waiting for a match.
    #[must_use]
    pub fn open() -> Self {
        Self {
            job_creator: None,
            state: Some(AgreementState::Open),
        }
    }

    #[must_use]
    pub fn by_creator(job_creator: Address) -> Self {
        Self {
            job_creator: Some(job_creator),
            state: None,
        }
    }

    #[must_use]
    pub fn matches(&self, c: &JobOfferContainer) -> bool {
        self.job_creator.as_ref().is_none_or(|a| *a == c.job_creator)
            && self.state.is_none_or(|s| s == c.state)
    }
}

/// Filter for resource offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOfferQuery {
    pub resource_provider: Option<Address>,
    /// Filter on the derived "currently occupied" flag.
    pub active: Option<bool>,
    pub state: Option<AgreementState>,
}

impl ResourceOfferQuery {
    #[must_use]
    pub fn open() -> Self {
        Self {
            resource_provider: None,
            active: None,
            state: Some(AgreementState::Open),
        }
    }

    #[must_use]
    pub fn by_provider(resource_provider: Address) -> Self {
        Self {
            resource_provider: Some(resource_provider),
            active: None,
            state: None,
        }
    }

    /// Restrict to offers whose `active` flag equals `active`.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    #[must_use]
    pub fn matches(&self, c: &ResourceOfferContainer) -> bool {
        self.resource_provider
            .as_ref()
            .is_none_or(|a| *a == c.resource_provider)
            && self.active.is_none_or(|a| a == c.is_active())
            && self.state.is_none_or(|s| s == c.state)
    }
}

/// Filter for deals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealQuery {
    pub job_creator: Option<Address>,
    pub resource_provider: Option<Address>,
    pub state: Option<AgreementState>,
}

impl DealQuery {
    #[must_use]
    pub fn in_state(state: AgreementState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, c: &DealContainer) -> bool {
        self.job_creator.as_ref().is_none_or(|a| *a == c.job_creator)
            && self
                .resource_provider
                .as_ref()
                .is_none_or(|a| *a == c.resource_provider)
            && self.state.is_none_or(|s| s == c.state)
    }
}
