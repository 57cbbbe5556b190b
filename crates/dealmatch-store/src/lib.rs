//! # dealmatch-store
//!
//! **Offer Store**: persistence of job offers, resource offers and deals,
//! keyed by content identifier.
//!
//! ## Architecture
//!
//! The solver talks to storage only through the [`SolverStore`] capability
//! trait, so the matching engine and lifecycle controller can run against
//! [`MemoryStore`] in tests and against a durable backend in production.
//!
//! Three tables, each row a container with its embedded payload:
//! 1. **Job offers**: secondary index on job creator
//! 2. **Resource offers**: secondary indexes on resource provider and on
//!    the derived `active` flag
//! 3. **Deals**: secondary indexes on job creator and resource provider
//!
//! ## Consistency
//!
//! Every operation on a single id is linearizable. Deal creation
//! ([`SolverStore::commit_match`]) and lockstep deal transitions
//! ([`SolverStore::advance_deal`]) touch three records and commit all of
//! them or none.

pub mod index;
pub mod memory;
pub mod query;
pub mod store;

pub use memory::MemoryStore;
pub use query::{DealQuery, JobOfferQuery, ResourceOfferQuery};
pub use store::{CommittedMatch, LockstepUpdate, SolverStore};
