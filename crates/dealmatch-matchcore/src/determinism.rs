//! Determinism verification for cross-observer consistency.
//!
//! Every observer planning over the same set of open offers must propose
//! the exact same matches. The `plan_root` is a hash over the proposed
//! matches that lets observers compare plans without exchanging them.

use sha2::{Digest, Sha256};

use crate::matcher::ProposedMatch;

/// Compute the plan root over proposed matches, in plan order.
///
/// Covers both offer ids, the chosen directory and mediators, and every
/// field of the resolved terms.
#[must_use]
pub fn compute_plan_root(matches: &[ProposedMatch]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"dealmatch:plan_root:v1:");
    hasher.update((matches.len() as u64).to_le_bytes());

    for m in matches {
        hash_str(&mut hasher, m.job_id.as_str());
        hash_str(&mut hasher, m.resource_id.as_str());
        hash_str(&mut hasher, m.terms.directory.as_str());
        hasher.update((m.terms.mediators.len() as u64).to_le_bytes());
        for mediator in &m.terms.mediators {
            hash_str(&mut hasher, mediator.as_str());
        }

        let pricing = &m.terms.terms.pricing;
        for v in [
            pricing.instruction_price,
            pricing.payment_collateral,
            pricing.results_collateral_multiple,
            pricing.mediation_fee,
        ] {
            hasher.update(v.to_le_bytes());
        }
        let timeouts = &m.terms.terms.timeouts;
        for t in [
            timeouts.agree,
            timeouts.submit_results,
            timeouts.judge_results,
            timeouts.mediate_results,
        ] {
            hasher.update(t.timeout.to_le_bytes());
            hasher.update(t.collateral.to_le_bytes());
        }
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Length-prefixed so adjacent strings cannot run together.
fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Recompute the root and compare with `expected_root`.
#[must_use]
pub fn verify_plan_root(matches: &[ProposedMatch], expected_root: &[u8; 32]) -> bool {
    compute_plan_root(matches) == *expected_root
}
