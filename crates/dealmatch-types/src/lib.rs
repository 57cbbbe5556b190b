//! # dealmatch-types
//!
//! Shared types, errors, and configuration for the **dealmatch** solver.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OfferId`], [`DealId`], [`Address`], [`OfferNonce`], [`ModuleId`]
//! - **Resources**: [`MachineSpec`], [`Module`], [`ModuleConfig`]
//! - **Terms**: [`PricingMode`], [`DealPricing`], [`DealTimeout`], [`DealTimeouts`], [`TrustedParties`]
//! - **Offers**: [`JobOffer`], [`ResourceOffer`]
//! - **Deals**: [`Deal`], [`DealMembers`], [`JobResult`]
//! - **Containers**: [`JobOfferContainer`], [`ResourceOfferContainer`], [`DealContainer`]
//! - **Lifecycle**: [`AgreementState`], [`Verdict`], [`TransitionEvent`]
//! - **Collaborators**: [`Clock`], [`ContentAddresser`]
//! - **Configuration**: [`SolverConfig`], [`LogConfig`]
//! - **Errors**: [`SolverError`] with `DM_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod addressing;
pub mod clock;
pub mod config;
pub mod constants;
pub mod container;
pub mod deal;
pub mod error;
pub mod event;
pub mod ids;
pub mod machine;
pub mod offer;
pub mod pricing;
pub mod state;

// Re-export all primary types at crate root for ergonomic imports:
//   use dealmatch_types::{JobOffer, ResourceOffer, Deal, AgreementState, ...};

pub use addressing::*;
pub use clock::*;
pub use config::*;
pub use container::*;
pub use deal::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use machine::*;
pub use offer::*;
pub use pricing::*;
pub use state::*;

// Constants are accessed via `dealmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
