//! # dealmatch-matchcore
//!
//! **Pure deterministic matching engine for dealmatch.**
//!
//! MatchCore takes a snapshot of open job offers and open resource offers
//! and decides which pairs should become deals. It has:
//!
//! - **Zero side effects**: no store writes, no state transitions
//! - **Deterministic output**: same offers in any order -> same plan on every
//!   observer, checked with a `plan_root` hash
//! - **Four-way compatibility**: module allow-list, capacity, trust overlap,
//!   pricing agreement
//!
//! The lifecycle crate turns each proposed match into a committed deal.

pub mod compat;
pub mod determinism;
pub mod matcher;
pub mod pricing;
pub mod trust;

pub use compat::{MatchTerms, check_compatibility};
pub use determinism::{compute_plan_root, verify_plan_root};
pub use matcher::{MatchPlan, ProposedMatch, Rejection, plan_matches};
pub use pricing::resolve_pricing;
pub use trust::{ResolvedTrust, resolve_trust};
