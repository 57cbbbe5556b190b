//! The compatibility predicate for one (job offer, resource offer) pair.

use dealmatch_types::{Address, DealTerms, JobOffer, ResourceOffer, Result, SolverError};

use crate::pricing::resolve_pricing;
use crate::trust::resolve_trust;

/// Everything a deal needs beyond the two offers themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTerms {
    pub directory: Address,
    pub mediators: Vec<Address>,
    pub terms: DealTerms,
}

/// Run the four checks in order: module allow-list, capacity, trust,
/// pricing. The first failure is returned.
///
/// # Errors
/// `ModuleNotAllowed`, `InsufficientCapacity`, `NoTrustOverlap`,
/// `PriceMismatch` or `AmbiguousPrice`.
pub fn check_compatibility(job: &JobOffer, resource: &ResourceOffer) -> Result<MatchTerms> {
    let module = job.module_id();
    if !resource.accepts_module(&module) {
        return Err(SolverError::ModuleNotAllowed {
            module: module.to_string(),
        });
    }

    if !resource.spec.satisfies(&job.spec) {
        return Err(SolverError::InsufficientCapacity {
            short: resource.spec.shortfall(&job.spec).join(","),
        });
    }

    let trust = resolve_trust(&job.trusted_parties, &resource.trusted_parties)?;
    let terms = resolve_pricing(job, resource)?;

    Ok(MatchTerms {
        directory: trust.directory,
        mediators: trust.mediators,
        terms,
    })
}
