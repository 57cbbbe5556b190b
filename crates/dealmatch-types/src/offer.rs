//! Offers posted to the solver.
//!
//! A [`JobOffer`] is a job creator's request for compute; a
//! [`ResourceOffer`] is a resource provider's advertised capacity. Both are
//! immutable once hashed: the solver only ever changes the state of the
//! container that wraps them.
//!
//! Maps use `BTreeMap` so the canonical JSON encoding (and therefore the
//! content hash) does not depend on insertion order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Address, DealPricing, DealTerms, DealTimeouts, MachineSpec, ModuleConfig, ModuleId, OfferId,
    OfferNonce, PricingMode, Result, SolverError, TrustedParties,
};

/// Posted by a job creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOffer {
    /// Content hash of this offer with `id` set to empty.
    #[serde(default)]
    pub id: OfferId,
    /// Logical creation timestamp. Orders the scan (oldest first).
    pub created_at: u64,
    /// Uniqueness salt; not used for ordering.
    pub nonce: OfferNonce,
    pub job_creator: Address,
    pub module: ModuleConfig,
    /// Minimum machine required, hoisted from the module.
    pub spec: MachineSpec,
    /// User inputs that parameterise the module template.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    pub mode: PricingMode,
    pub pricing: DealPricing,
    pub timeouts: DealTimeouts,
    pub trusted_parties: TrustedParties,
}

impl JobOffer {
    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module.module_id()
    }

    /// The terms this job creator asks for.
    #[must_use]
    pub fn terms(&self) -> DealTerms {
        DealTerms {
            pricing: self.pricing,
            timeouts: self.timeouts,
        }
    }

    /// Structural validation applied before the offer is stored.
    pub fn validate(&self) -> Result<()> {
        if self.job_creator.is_empty() {
            return Err(SolverError::InvalidRecord {
                reason: "job offer has no job_creator".into(),
            });
        }
        if !self.module.is_pinned() {
            return Err(SolverError::InvalidRecord {
                reason: "job offer module must pin repo, hash and path".into(),
            });
        }
        Ok(())
    }
}

/// Posted by a resource provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOffer {
    /// Content hash of this offer with `id` set to empty.
    #[serde(default)]
    pub id: OfferId,
    pub created_at: u64,
    pub nonce: OfferNonce,
    pub resource_provider: Address,
    /// Disambiguates several equivalent offers from the same provider.
    pub index: u32,
    /// Absolute capacity being offered.
    pub spec: MachineSpec,
    /// Module allow-list. Empty means every module is accepted.
    #[serde(default)]
    pub modules: Vec<ModuleId>,
    pub mode: PricingMode,
    pub default_pricing: DealPricing,
    pub default_timeouts: DealTimeouts,
    /// Per-module pricing overrides.
    #[serde(default)]
    pub module_pricing: BTreeMap<ModuleId, DealPricing>,
    /// Per-module timeout overrides.
    #[serde(default)]
    pub module_timeouts: BTreeMap<ModuleId, DealTimeouts>,
    pub trusted_parties: TrustedParties,
}

impl ResourceOffer {
    /// Whether this offer is willing to run `module`.
    #[must_use]
    pub fn accepts_module(&self, module: &ModuleId) -> bool {
        self.modules.is_empty() || self.modules.contains(module)
    }

    /// Terms for `module`: overrides where present, defaults otherwise.
    /// Pricing and timeouts are overridden independently.
    #[must_use]
    pub fn terms_for(&self, module: &ModuleId) -> DealTerms {
        DealTerms {
            pricing: self
                .module_pricing
                .get(module)
                .copied()
                .unwrap_or(self.default_pricing),
            timeouts: self
                .module_timeouts
                .get(module)
                .copied()
                .unwrap_or(self.default_timeouts),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.resource_provider.is_empty() {
            return Err(SolverError::InvalidRecord {
                reason: "resource offer has no resource_provider".into(),
            });
        }
        if self.modules.iter().any(|m| m.as_str().trim().is_empty()) {
            return Err(SolverError::InvalidRecord {
                reason: "resource offer allow-list contains an empty module id".into(),
            });
        }
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
pub mod dummy {
    use super::*;

    /// Terms used by the dummy constructors.
    pub fn dummy_pricing(instruction_price: u64) -> DealPricing {
        DealPricing {
            instruction_price,
            payment_collateral: 100,
            results_collateral_multiple: 2,
            mediation_fee: 5,
        }
    }

    pub fn dummy_timeouts() -> DealTimeouts {
        DealTimeouts {
            agree: crate::DealTimeout::new(60, 10),
            submit_results: crate::DealTimeout::new(600, 20),
            judge_results: crate::DealTimeout::new(60, 30),
            mediate_results: crate::DealTimeout::new(600, 40),
        }
    }

    pub fn dummy_trust() -> TrustedParties {
        TrustedParties::new(
            vec![Address::new("mediator-1")],
            vec![Address::new("directory-1")],
        )
    }

    pub fn dummy_module() -> ModuleConfig {
        ModuleConfig::new("https://github.com/dealmatch/modules", "v1", "cowsay.tmpl")
    }

    impl JobOffer {
        /// Market-price job offer for `spec`, created at `created_at`.
        pub fn dummy(job_creator: &str, spec: MachineSpec, created_at: u64) -> Self {
            Self {
                id: OfferId::default(),
                created_at,
                nonce: OfferNonce::new(),
                job_creator: Address::new(job_creator),
                module: dummy_module(),
                spec,
                inputs: BTreeMap::new(),
                mode: PricingMode::MarketPrice,
                pricing: DealPricing::default(),
                timeouts: dummy_timeouts(),
                trusted_parties: dummy_trust(),
            }
        }
    }

    impl ResourceOffer {
        /// Fixed-price resource offer accepting every module.
        pub fn dummy(
            resource_provider: &str,
            spec: MachineSpec,
            index: u32,
            created_at: u64,
        ) -> Self {
            Self {
                id: OfferId::default(),
                created_at,
                nonce: OfferNonce::new(),
                resource_provider: Address::new(resource_provider),
                index,
                spec,
                modules: Vec::new(),
                mode: PricingMode::FixedPrice,
                default_pricing: dummy_pricing(10),
                default_timeouts: dummy_timeouts(),
                module_pricing: BTreeMap::new(),
                module_timeouts: BTreeMap::new(),
                trusted_parties: dummy_trust(),
            }
        }
    }
}
