//! The `SolverStore` capability trait.

use chrono::{DateTime, Utc};
use dealmatch_types::{
    AgreementState, DealContainer, DealId, JobOfferContainer, JobResult, OfferId,
    ResourceOfferContainer, Result,
};

use crate::query::{DealQuery, JobOfferQuery, ResourceOfferQuery};

/// The three records written by [`SolverStore::commit_match`].
#[derive(Debug, Clone)]
pub struct CommittedMatch {
    pub deal: DealContainer,
    pub job_offer: JobOfferContainer,
    pub resource_offer: ResourceOfferContainer,
}

/// The three records written by [`SolverStore::advance_deal`], plus the
/// state they all left.
#[derive(Debug, Clone)]
pub struct LockstepUpdate {
    pub from: AgreementState,
    pub deal: DealContainer,
    pub job_offer: JobOfferContainer,
    pub resource_offer: ResourceOfferContainer,
}

/// Storage used by the matching engine and lifecycle controller.
///
/// Implementations must make every operation linearizable per id and
/// must apply `commit_match` and `advance_deal` atomically across all
/// records they touch.
pub trait SolverStore: Send + Sync {
    // -----------------------------------------------------------------
    // Add
    // -----------------------------------------------------------------

    /// Store a new job offer container.
    ///
    /// Re-adding identical content is a no-op that returns the stored
    /// container.
    ///
    /// # Errors
    /// - `InvalidRecord` for missing ids or parties
    /// - `DuplicateId` if the id is taken by different content
    fn add_job_offer(&self, container: JobOfferContainer) -> Result<JobOfferContainer>;

    fn add_resource_offer(
        &self,
        container: ResourceOfferContainer,
    ) -> Result<ResourceOfferContainer>;

    /// Store a deal without touching its parent offers (import/replay).
    /// New matches go through [`SolverStore::commit_match`].
    fn add_deal(&self, container: DealContainer) -> Result<DealContainer>;

    // -----------------------------------------------------------------
    // Get
    // -----------------------------------------------------------------

    /// # Errors
    /// `NotFound` if absent.
    fn get_job_offer(&self, id: &OfferId) -> Result<JobOfferContainer>;

    fn get_resource_offer(&self, id: &OfferId) -> Result<ResourceOfferContainer>;

    fn get_deal(&self, id: &DealId) -> Result<DealContainer>;

    /// Matching job offers in id order. Empty when nothing matches.
    fn get_job_offers(&self, query: &JobOfferQuery) -> Result<Vec<JobOfferContainer>>;

    fn get_resource_offers(
        &self,
        query: &ResourceOfferQuery,
    ) -> Result<Vec<ResourceOfferContainer>>;

    fn get_deals(&self, query: &DealQuery) -> Result<Vec<DealContainer>>;

    // -----------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------

    /// Compare-and-set the state of one job offer.
    ///
    /// `deal_id` replaces the stored association when `Some`; `None` keeps
    /// it.
    ///
    /// # Errors
    /// - `NotFound` if absent
    /// - `StaleState` if the stored state is not `expected`
    /// - `InvalidTransition` if `expected -> state` is not allowed
    fn update_job_offer_state(
        &self,
        id: &OfferId,
        expected: AgreementState,
        deal_id: Option<DealId>,
        state: AgreementState,
        at: DateTime<Utc>,
    ) -> Result<JobOfferContainer>;

    fn update_resource_offer_state(
        &self,
        id: &OfferId,
        expected: AgreementState,
        deal_id: Option<DealId>,
        state: AgreementState,
        at: DateTime<Utc>,
    ) -> Result<ResourceOfferContainer>;

    /// Compare-and-set the state of a deal alone. Lifecycle transitions
    /// use [`SolverStore::advance_deal`] instead.
    fn update_deal_state(
        &self,
        id: &DealId,
        expected: AgreementState,
        state: AgreementState,
        at: DateTime<Utc>,
    ) -> Result<DealContainer>;

    /// Attach executor-reported results to a deal.
    fn record_result(&self, id: &DealId, result: JobResult) -> Result<DealContainer>;

    // -----------------------------------------------------------------
    // Remove
    // -----------------------------------------------------------------

    /// # Errors
    /// - `NotFound` if absent
    /// - `NotRemovable` unless the offer is `Open`
    fn remove_job_offer(&self, id: &OfferId) -> Result<()>;

    fn remove_resource_offer(&self, id: &OfferId) -> Result<()>;

    // -----------------------------------------------------------------
    // Multi-record transactions
    // -----------------------------------------------------------------

    /// Insert a freshly built deal (state `Negotiating`) and move both of
    /// its parent offers from `Open` to `Negotiating`, all or nothing.
    ///
    /// # Errors
    /// - `NotFound` if either parent offer is absent
    /// - `AlreadyMatched` if either parent offer is no longer `Open`
    /// - `DuplicateId` if the deal id is already taken
    fn commit_match(&self, deal: DealContainer) -> Result<CommittedMatch>;

    /// Move a deal and both of its parent offers from `expected` to
    /// `next`, all or nothing. `result`, when given, is attached to the
    /// deal in the same write.
    ///
    /// # Errors
    /// - `InvalidRecord` if `result` names a different deal
    /// - `NotFound` if the deal or a parent offer is absent
    /// - `StaleState` if the deal is not in `expected`
    /// - `InvalidTransition` if `expected -> next` is not allowed
    fn advance_deal(
        &self,
        id: &DealId,
        expected: AgreementState,
        next: AgreementState,
        result: Option<JobResult>,
        at: DateTime<Utc>,
    ) -> Result<LockstepUpdate>;
}
