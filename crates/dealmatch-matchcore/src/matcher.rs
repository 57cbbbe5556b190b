//! Pure deterministic scan planner.
//!
//! Takes a snapshot of offer containers and decides which pairs become
//! deals. No store access and no transitions; the lifecycle controller
//! commits the plan.
//!
//! ```text
//! plan_matches(jobs, resources) -> MatchPlan
//! ```
//!
//! ## Ordering
//!
//! - Job offers ascending by `(created_at, job_creator, id)`: oldest first.
//! - Resource offers ascending by `(index, created_at, resource_provider, id)`:
//!   a provider's lower `index` is offered first.
//!
//! For each job the first compatible, still-unclaimed resource wins and both
//! leave the pass (greedy first-fit). Both keys end in the content id, so
//! the plan never depends on the order offers were submitted in.

use dealmatch_types::{
    Address, AgreementState, JobOffer, JobOfferContainer, OfferId, ResourceOffer,
    ResourceOfferContainer, SolverError,
};
use tracing::debug;

use crate::compat::{MatchTerms, check_compatibility};
use crate::determinism::compute_plan_root;

/// One pair the planner wants to turn into a deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedMatch {
    pub job_id: OfferId,
    pub resource_id: OfferId,
    pub terms: MatchTerms,
}

/// A pair that was considered and failed a compatibility check.
#[derive(Debug)]
pub struct Rejection {
    pub job_id: OfferId,
    pub resource_id: OfferId,
    pub reason: SolverError,
}

/// Output of one planning pass.
#[derive(Debug)]
pub struct MatchPlan {
    /// Proposed deals, in the order they were found.
    pub matches: Vec<ProposedMatch>,
    /// Every incompatible pair that was tried.
    pub rejections: Vec<Rejection>,
    /// Open job offers left without a partner, in scan order.
    pub unmatched_jobs: Vec<OfferId>,
    /// Open resource offers left unclaimed, in scan order.
    pub unmatched_resources: Vec<OfferId>,
    /// Hash over `matches`, see [`compute_plan_root`].
    pub plan_root: [u8; 32],
}

impl MatchPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    #[must_use]
    pub fn plan_root_hex(&self) -> String {
        hex::encode(self.plan_root)
    }
}

fn job_key(job: &JobOffer) -> (u64, &Address, &OfferId) {
    (job.created_at, &job.job_creator, &job.id)
}

fn resource_key(resource: &ResourceOffer) -> (u32, u64, &Address, &OfferId) {
    (
        resource.index,
        resource.created_at,
        &resource.resource_provider,
        &resource.id,
    )
}

/// Plan one matching pass over a snapshot of the store.
///
/// Containers not in `Open` are ignored, so callers may pass a wider
/// snapshot than strictly needed.
#[must_use]
pub fn plan_matches(
    jobs: &[JobOfferContainer],
    resources: &[ResourceOfferContainer],
) -> MatchPlan {
    let mut jobs: Vec<&JobOffer> = jobs
        .iter()
        .filter(|c| c.state == AgreementState::Open)
        .map(|c| &c.job_offer)
        .collect();
    jobs.sort_by(|a, b| job_key(a).cmp(&job_key(b)));

    let mut resources: Vec<&ResourceOffer> = resources
        .iter()
        .filter(|c| c.state == AgreementState::Open)
        .map(|c| &c.resource_offer)
        .collect();
    resources.sort_by(|a, b| resource_key(a).cmp(&resource_key(b)));

    let mut claimed = vec![false; resources.len()];
    let mut matches = Vec::new();
    let mut rejections = Vec::new();
    let mut unmatched_jobs = Vec::new();

    for job in jobs {
        let mut found = None;
        for (i, resource) in resources.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            match check_compatibility(job, resource) {
                Ok(terms) => {
                    found = Some((i, terms));
                    break;
                }
                Err(reason) => {
                    debug!(
                        job = %job.id.short(),
                        resource = %resource.id.short(),
                        %reason,
                        "Pair rejected"
                    );
                    rejections.push(Rejection {
                        job_id: job.id.clone(),
                        resource_id: resource.id.clone(),
                        reason,
                    });
                }
            }
        }

        match found {
            Some((i, terms)) => {
                claimed[i] = true;
                matches.push(ProposedMatch {
                    job_id: job.id.clone(),
                    resource_id: resources[i].id.clone(),
                    terms,
                });
            }
            None => unmatched_jobs.push(job.id.clone()),
        }
    }

    let unmatched_resources = resources
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(r, _)| r.id.clone())
        .collect();

    let plan_root = compute_plan_root(&matches);

    MatchPlan {
        matches,
        rejections,
        unmatched_jobs,
        unmatched_resources,
        plan_root,
    }
}
