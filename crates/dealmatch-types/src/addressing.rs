//! Content addressing for offers and deals.
//!
//! Identifiers are derived from canonical content so that identical
//! content always yields the same identifier. The canonical form is the
//! JSON encoding of the record with its `id` field emptied; all maps in
//! the data model are ordered, so the encoding is stable.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Deal, DealId, JobOffer, OfferId, ResourceOffer, Result};

/// Derives identifiers from record content.
///
/// The solver consumes this as an injected collaborator so deployments can
/// plug in the identifier scheme the rest of the network uses (e.g. CIDs).
pub trait ContentAddresser: Send + Sync {
    fn job_offer_id(&self, offer: &JobOffer) -> Result<OfferId>;
    fn resource_offer_id(&self, offer: &ResourceOffer) -> Result<OfferId>;
    fn deal_id(&self, deal: &Deal) -> Result<DealId>;
}

/// Hex SHA-256 over a domain tag and the canonical JSON encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Addresser;

impl Sha256Addresser {
    fn hash<T: Serialize>(domain: &[u8], value: &T) -> Result<String> {
        let bytes = serde_json::to_vec(value)?;
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

impl ContentAddresser for Sha256Addresser {
    fn job_offer_id(&self, offer: &JobOffer) -> Result<OfferId> {
        let mut blank = offer.clone();
        blank.id = OfferId::default();
        Self::hash(b"dealmatch:job_offer:v1:", &blank).map(OfferId)
    }

    fn resource_offer_id(&self, offer: &ResourceOffer) -> Result<OfferId> {
        let mut blank = offer.clone();
        blank.id = OfferId::default();
        Self::hash(b"dealmatch:resource_offer:v1:", &blank).map(OfferId)
    }

    fn deal_id(&self, deal: &Deal) -> Result<DealId> {
        let mut blank = deal.clone();
        blank.id = DealId::default();
        Self::hash(b"dealmatch:deal:v1:", &blank).map(DealId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MachineSpec;

    #[test]
    fn identical_content_same_id() {
        let a = JobOffer::dummy("jc", MachineSpec::new(0, 500, 1024), 1);
        let b = a.clone();
        let addr = Sha256Addresser;
        assert_eq!(addr.job_offer_id(&a).unwrap(), addr.job_offer_id(&b).unwrap());
    }

    #[test]
    fn id_field_is_ignored() {
        let a = JobOffer::dummy("jc", MachineSpec::new(0, 500, 1024), 1);
        let mut b = a.clone();
        b.id = OfferId::new("already-set");
        let addr = Sha256Addresser;
        assert_eq!(addr.job_offer_id(&a).unwrap(), addr.job_offer_id(&b).unwrap());
    }

    #[test]
    fn nonce_separates_same_instant_offers() {
        let a = ResourceOffer::dummy("rp", MachineSpec::new(0, 1000, 2048), 0, 7);
        let mut b = a.clone();
        b.nonce = crate::OfferNonce::new();
        let addr = Sha256Addresser;
        assert_ne!(
            addr.resource_offer_id(&a).unwrap(),
            addr.resource_offer_id(&b).unwrap()
        );
    }

    #[test]
    fn ids_are_hex_sha256() {
        let addr = Sha256Addresser;
        let id = addr
            .job_offer_id(&JobOffer::dummy("jc", MachineSpec::default(), 0))
            .unwrap();
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
