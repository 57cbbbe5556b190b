//! Trust resolution: which directory and mediators both sides accept.

use std::collections::BTreeSet;

use dealmatch_types::{Address, Result, SolverError, TrustedParties};

/// The parties a deal will name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrust {
    /// Lowest address in the directory intersection.
    pub directory: Address,
    /// The whole mediator intersection, sorted and de-duplicated.
    pub mediators: Vec<Address>,
}

fn intersect(a: &[Address], b: &[Address]) -> BTreeSet<Address> {
    let left: BTreeSet<&Address> = a.iter().filter(|x| !x.is_empty()).collect();
    b.iter()
        .filter(|x| left.contains(x))
        .cloned()
        .collect()
}

/// Intersect the trusted parties of a job offer and a resource offer.
///
/// Mediators are checked before directories.
///
/// # Errors
/// `NoTrustOverlap` naming the list whose intersection is empty.
pub fn resolve_trust(job: &TrustedParties, resource: &TrustedParties) -> Result<ResolvedTrust> {
    let mediators = intersect(&job.mediator, &resource.mediator);
    if mediators.is_empty() {
        return Err(SolverError::NoTrustOverlap {
            parties: "mediators",
        });
    }

    let directory = intersect(&job.directory, &resource.directory)
        .into_iter()
        .next()
        .ok_or(SolverError::NoTrustOverlap {
            parties: "directories",
        })?;

    Ok(ResolvedTrust {
        directory,
        mediators: mediators.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties(mediators: &[&str], directories: &[&str]) -> TrustedParties {
        TrustedParties::new(
            mediators.iter().map(|a| Address::new(*a)).collect(),
            directories.iter().map(|a| Address::new(*a)).collect(),
        )
    }

    #[test]
    fn picks_lowest_directory_and_all_common_mediators() {
        let job = parties(&["m3", "m1", "m2"], &["d2", "d1", "d9"]);
        let resource = parties(&["m2", "m3", "m4"], &["d9", "d2"]);
        let trust = resolve_trust(&job, &resource).unwrap();
        assert_eq!(trust.directory, Address::new("d2"));
        assert_eq!(
            trust.mediators,
            vec![Address::new("m2"), Address::new("m3")]
        );
    }

    #[test]
    fn result_does_not_depend_on_side_or_order() {
        let a = parties(&["m2", "m1"], &["d1", "d2"]);
        let b = parties(&["m1", "m2", "m1"], &["d2", "d1"]);
        assert_eq!(resolve_trust(&a, &b).unwrap(), resolve_trust(&b, &a).unwrap());
        assert_eq!(resolve_trust(&a, &b).unwrap().mediators.len(), 2);
    }

    #[test]
    fn empty_mediator_overlap_is_named() {
        let job = parties(&["m1"], &["d1"]);
        let resource = parties(&["m2"], &["d1"]);
        let err = resolve_trust(&job, &resource).unwrap_err();
        assert!(matches!(
            err,
            SolverError::NoTrustOverlap {
                parties: "mediators"
            }
        ));
    }

    #[test]
    fn empty_directory_overlap_is_named() {
        let job = parties(&["m1"], &["d1"]);
        let resource = parties(&["m1"], &["d2"]);
        let err = resolve_trust(&job, &resource).unwrap_err();
        assert!(matches!(
            err,
            SolverError::NoTrustOverlap {
                parties: "directories"
            }
        ));
    }

    #[test]
    fn blank_addresses_never_match() {
        let job = parties(&[""], &["d1"]);
        let resource = parties(&[""], &["d1"]);
        assert!(resolve_trust(&job, &resource).is_err());
    }
}
