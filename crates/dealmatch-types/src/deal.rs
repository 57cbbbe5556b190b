//! Deal records.
//!
//! A [`Deal`] is the agreement both parties sign up to: who is involved,
//! the one concrete set of terms the solver resolved, and full copies of
//! the two offers it was built from so it can be audited or replayed
//! without the store.

use serde::{Deserialize, Serialize};

use crate::{
    Address, DealId, DealPricing, DealTerms, DealTimeouts, JobOffer, ResourceOffer, Result,
    SolverError,
};

/// The parties to a deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealMembers {
    pub job_creator: Address,
    pub resource_provider: Address,
    /// Chosen from the trust intersection (lowest address).
    pub directory: Address,
    /// The whole mediator trust intersection, sorted.
    pub mediators: Vec<Address>,
}

/// A binding match between one job offer and one resource offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Content hash of this deal with `id` set to empty.
    #[serde(default)]
    pub id: DealId,
    pub members: DealMembers,
    pub pricing: DealPricing,
    pub timeouts: DealTimeouts,
    pub job_offer: JobOffer,
    pub resource_offer: ResourceOffer,
}

impl Deal {
    /// Assemble an unhashed deal.
    #[must_use]
    pub fn new(
        job_offer: JobOffer,
        resource_offer: ResourceOffer,
        directory: Address,
        mediators: Vec<Address>,
        terms: DealTerms,
    ) -> Self {
        Self {
            id: DealId::default(),
            members: DealMembers {
                job_creator: job_offer.job_creator.clone(),
                resource_provider: resource_offer.resource_provider.clone(),
                directory,
                mediators,
            },
            pricing: terms.pricing,
            timeouts: terms.timeouts,
            job_offer,
            resource_offer,
        }
    }

    #[must_use]
    pub fn terms(&self) -> DealTerms {
        DealTerms {
            pricing: self.pricing,
            timeouts: self.timeouts,
        }
    }
}

/// Results reported by the executor once the job has run.
///
/// The solver records it on the deal container for audit; it never
/// interprets `data_id` (a content address of the output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Content hash of this result with `id` set to empty.
    #[serde(default)]
    pub id: String,
    pub deal_id: DealId,
    pub data_id: String,
    pub instruction_count: u64,
}

impl JobResult {
    /// Bind this result to `deal`.
    ///
    /// An empty `deal_id` is filled in.
    ///
    /// # Errors
    /// `InvalidRecord` if the result names a different deal.
    pub fn bind_to(mut self, deal: &DealId) -> Result<Self> {
        if self.deal_id.is_empty() {
            self.deal_id = deal.clone();
        }
        if self.deal_id == *deal {
            Ok(self)
        } else {
            Err(SolverError::InvalidRecord {
                reason: format!(
                    "result is for {} but was reported against {deal}",
                    self.deal_id
                ),
            })
        }
    }
}
