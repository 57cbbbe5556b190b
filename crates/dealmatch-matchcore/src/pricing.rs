//! Pricing resolution for a (job offer, resource offer) pair.
//!
//! Only a fixed-price side can anchor the deal's terms. There is no price
//! discovery: two market-price sides never match.

use dealmatch_types::{DealTerms, JobOffer, PricingMode, ResourceOffer, Result, SolverError};

/// Resolve the one set of terms a deal between `job` and `resource` runs on.
///
/// The resource side offers its per-module overrides for the job's module
/// where present and its defaults otherwise.
///
/// | job    | resource | outcome                                  |
/// |--------|----------|------------------------------------------|
/// | fixed  | fixed    | equal terms, else `PriceMismatch`        |
/// | fixed  | market   | job terms                                |
/// | market | fixed    | resource terms                           |
/// | market | market   | `AmbiguousPrice`                         |
///
/// # Errors
/// `PriceMismatch` or `AmbiguousPrice` per the table above.
pub fn resolve_pricing(job: &JobOffer, resource: &ResourceOffer) -> Result<DealTerms> {
    let asked = job.terms();
    let offered = resource.terms_for(&job.module_id());

    match (job.mode, resource.mode) {
        (PricingMode::FixedPrice, PricingMode::FixedPrice) => {
            if asked == offered {
                Ok(offered)
            } else {
                Err(SolverError::PriceMismatch)
            }
        }
        (PricingMode::FixedPrice, PricingMode::MarketPrice) => Ok(asked),
        (PricingMode::MarketPrice, PricingMode::FixedPrice) => Ok(offered),
        (PricingMode::MarketPrice, PricingMode::MarketPrice) => Err(SolverError::AmbiguousPrice),
    }
}

#[cfg(test)]
mod tests {
    use dealmatch_types::dummy::{dummy_pricing, dummy_timeouts};
    use dealmatch_types::{DealTimeout, MachineSpec};

    use super::*;

    fn pair() -> (JobOffer, ResourceOffer) {
        (
            JobOffer::dummy("jc", MachineSpec::default(), 0),
            ResourceOffer::dummy("rp", MachineSpec::default(), 0, 0),
        )
    }

    #[test]
    fn market_job_takes_fixed_resource_terms() {
        let (job, resource) = pair();
        let terms = resolve_pricing(&job, &resource).unwrap();
        assert_eq!(terms.pricing.instruction_price, 10);
        assert_eq!(terms.timeouts, dummy_timeouts());
    }

    #[test]
    fn fixed_job_wins_over_market_resource() {
        let (mut job, mut resource) = pair();
        job.mode = PricingMode::FixedPrice;
        job.pricing = dummy_pricing(3);
        resource.mode = PricingMode::MarketPrice;
        let terms = resolve_pricing(&job, &resource).unwrap();
        assert_eq!(terms.pricing.instruction_price, 3);
    }

    #[test]
    fn fixed_fixed_requires_identical_terms() {
        let (mut job, resource) = pair();
        job.mode = PricingMode::FixedPrice;
        job.pricing = dummy_pricing(10);
        assert_eq!(
            resolve_pricing(&job, &resource).unwrap().pricing,
            dummy_pricing(10)
        );

        job.timeouts.agree = DealTimeout::new(61, 10);
        assert!(matches!(
            resolve_pricing(&job, &resource),
            Err(SolverError::PriceMismatch)
        ));
    }

    #[test]
    fn market_market_is_ambiguous() {
        let (job, mut resource) = pair();
        resource.mode = PricingMode::MarketPrice;
        assert!(matches!(
            resolve_pricing(&job, &resource),
            Err(SolverError::AmbiguousPrice)
        ));
    }

    #[test]
    fn module_override_applies_to_that_module_only() {
        let (job, mut resource) = pair();
        resource
            .module_pricing
            .insert(job.module_id(), dummy_pricing(42));
        let terms = resolve_pricing(&job, &resource).unwrap();
        assert_eq!(terms.pricing.instruction_price, 42);
        assert_eq!(terms.timeouts, resource.default_timeouts);
    }

    #[test]
    fn zero_price_is_valid() {
        let (job, mut resource) = pair();
        resource.default_pricing = dummy_pricing(0);
        let terms = resolve_pricing(&job, &resource).unwrap();
        assert_eq!(terms.pricing.instruction_price, 0);
    }
}
