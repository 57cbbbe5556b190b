//! In-memory [`SolverStore`].
//!
//! One `RwLock` per table. Multi-table operations take the locks in a fixed
//! order (job offers, then resource offers, then deals) and check every
//! precondition before mutating anything, so a failed call leaves no
//! partial state.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use dealmatch_types::{
    AgreementState, DealContainer, DealId, JobOfferContainer, JobResult, OfferId,
    ResourceOfferContainer, Result, SolverError,
};
use parking_lot::RwLock;
use tracing::debug;

use crate::index::OwnerIndex;
use crate::query::{DealQuery, JobOfferQuery, ResourceOfferQuery};
use crate::store::{CommittedMatch, LockstepUpdate, SolverStore};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct JobTable {
    rows: HashMap<OfferId, JobOfferContainer>,
    by_creator: OwnerIndex<OfferId>,
}

impl JobTable {
    fn get(&self, id: &OfferId) -> Result<&JobOfferContainer> {
        self.rows.get(id).ok_or_else(|| not_found("job offer", id.as_str()))
    }

    fn apply_state(
        &mut self,
        id: &OfferId,
        state: AgreementState,
        deal_id: Option<DealId>,
        at: DateTime<Utc>,
    ) -> Option<JobOfferContainer> {
        let row = self.rows.get_mut(id)?;
        row.state = state;
        row.state_entered_at = at;
        if deal_id.is_some() {
            row.deal_id = deal_id;
        }
        Some(row.clone())
    }
}

#[derive(Debug, Default)]
struct ResourceTable {
    rows: HashMap<OfferId, ResourceOfferContainer>,
    by_provider: OwnerIndex<OfferId>,
    /// Ids whose derived `active` flag is set.
    active: BTreeSet<OfferId>,
}

impl ResourceTable {
    fn get(&self, id: &OfferId) -> Result<&ResourceOfferContainer> {
        self.rows
            .get(id)
            .ok_or_else(|| not_found("resource offer", id.as_str()))
    }

    fn apply_state(
        &mut self,
        id: &OfferId,
        state: AgreementState,
        deal_id: Option<DealId>,
        at: DateTime<Utc>,
    ) -> Option<ResourceOfferContainer> {
        let row = self.rows.get_mut(id)?;
        row.state = state;
        row.state_entered_at = at;
        if deal_id.is_some() {
            row.deal_id = deal_id;
        }
        let snapshot = row.clone();
        if snapshot.is_active() {
            self.active.insert(id.clone());
        } else {
            self.active.remove(id);
        }
        Some(snapshot)
    }
}

#[derive(Debug, Default)]
struct DealTable {
    rows: HashMap<DealId, DealContainer>,
    by_job_creator: OwnerIndex<DealId>,
    by_resource_provider: OwnerIndex<DealId>,
}

impl DealTable {
    fn get(&self, id: &DealId) -> Result<&DealContainer> {
        self.rows.get(id).ok_or_else(|| not_found("deal", id.as_str()))
    }

    fn insert(&mut self, container: DealContainer) {
        self.by_job_creator
            .insert(&container.job_creator, container.id.clone());
        self.by_resource_provider
            .insert(&container.resource_provider, container.id.clone());
        self.rows.insert(container.id.clone(), container);
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn not_found(kind: &'static str, id: &str) -> SolverError {
    SolverError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn invalid(reason: impl Into<String>) -> SolverError {
    SolverError::InvalidRecord {
        reason: reason.into(),
    }
}

/// Compare-and-set precondition: the caller saw the latest state and the
/// move is in the transition table.
fn check_result(id: &DealId, result: &JobResult) -> Result<()> {
    if result.deal_id == *id {
        Ok(())
    } else {
        Err(invalid(format!(
            "result is for {} but was reported against {id}",
            result.deal_id
        )))
    }
}

fn check_transition(
    id: &str,
    expected: AgreementState,
    actual: AgreementState,
    next: AgreementState,
) -> Result<()> {
    if actual != expected {
        return Err(SolverError::StaleState {
            id: id.to_string(),
            expected,
            actual,
        });
    }
    if !expected.can_transition_to(next) {
        return Err(SolverError::InvalidTransition {
            id: id.to_string(),
            from: expected,
            to: next,
        });
    }
    Ok(())
}

fn validate_job(c: &JobOfferContainer) -> Result<()> {
    if c.id.is_empty() {
        return Err(invalid("job offer container has no id"));
    }
    if c.id != c.job_offer.id {
        return Err(invalid(format!(
            "container id {} does not match job offer id {}",
            c.id, c.job_offer.id
        )));
    }
    if c.job_creator != c.job_offer.job_creator {
        return Err(invalid("container job_creator does not match job offer"));
    }
    c.job_offer.validate()
}

fn validate_resource(c: &ResourceOfferContainer) -> Result<()> {
    if c.id.is_empty() {
        return Err(invalid("resource offer container has no id"));
    }
    if c.id != c.resource_offer.id {
        return Err(invalid(format!(
            "container id {} does not match resource offer id {}",
            c.id, c.resource_offer.id
        )));
    }
    if c.resource_provider != c.resource_offer.resource_provider {
        return Err(invalid(
            "container resource_provider does not match resource offer",
        ));
    }
    c.resource_offer.validate()
}

fn validate_deal(c: &DealContainer) -> Result<()> {
    if c.id.is_empty() || c.id != c.deal.id {
        return Err(invalid("deal container id is empty or does not match deal"));
    }
    if c.job_offer.is_empty() || c.job_offer != c.deal.job_offer.id {
        return Err(invalid("deal container job offer id mismatch"));
    }
    if c.resource_offer.is_empty() || c.resource_offer != c.deal.resource_offer.id {
        return Err(invalid("deal container resource offer id mismatch"));
    }
    let members = &c.deal.members;
    if members.job_creator.is_empty() || members.resource_provider.is_empty() {
        return Err(invalid("deal is missing a party"));
    }
    if members.directory.is_empty() || members.mediators.is_empty() {
        return Err(invalid("deal has no directory or mediators"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    job_offers: RwLock<JobTable>,
    resource_offers: RwLock<ResourceTable>,
    deals: RwLock<DealTable>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn job_offer_count(&self) -> usize {
        self.job_offers.read().rows.len()
    }

    #[must_use]
    pub fn resource_offer_count(&self) -> usize {
        self.resource_offers.read().rows.len()
    }

    #[must_use]
    pub fn deal_count(&self) -> usize {
        self.deals.read().rows.len()
    }
}

impl SolverStore for MemoryStore {
    fn add_job_offer(&self, container: JobOfferContainer) -> Result<JobOfferContainer> {
        validate_job(&container)?;
        let mut table = self.job_offers.write();

        if let Some(existing) = table.rows.get(&container.id) {
            if existing.job_offer == container.job_offer {
                return Ok(existing.clone());
            }
            return Err(SolverError::DuplicateId(container.id.to_string()));
        }

        table
            .by_creator
            .insert(&container.job_creator, container.id.clone());
        table.rows.insert(container.id.clone(), container.clone());
        debug!(id = %container.id.short(), creator = %container.job_creator, "Job offer stored");
        Ok(container)
    }

    fn add_resource_offer(
        &self,
        container: ResourceOfferContainer,
    ) -> Result<ResourceOfferContainer> {
        validate_resource(&container)?;
        let mut table = self.resource_offers.write();

        if let Some(existing) = table.rows.get(&container.id) {
            if existing.resource_offer == container.resource_offer {
                return Ok(existing.clone());
            }
            return Err(SolverError::DuplicateId(container.id.to_string()));
        }

        table
            .by_provider
            .insert(&container.resource_provider, container.id.clone());
        if container.is_active() {
            table.active.insert(container.id.clone());
        }
        table.rows.insert(container.id.clone(), container.clone());
        debug!(
            id = %container.id.short(),
            provider = %container.resource_provider,
            index = container.resource_offer.index,
            "Resource offer stored"
        );
        Ok(container)
    }

    fn add_deal(&self, container: DealContainer) -> Result<DealContainer> {
        validate_deal(&container)?;
        let mut table = self.deals.write();

        if let Some(existing) = table.rows.get(&container.id) {
            if existing.deal == container.deal {
                return Ok(existing.clone());
            }
            return Err(SolverError::DuplicateId(container.id.to_string()));
        }

        table.insert(container.clone());
        Ok(container)
    }

    fn get_job_offer(&self, id: &OfferId) -> Result<JobOfferContainer> {
        self.job_offers.read().get(id).cloned()
    }

    fn get_resource_offer(&self, id: &OfferId) -> Result<ResourceOfferContainer> {
        self.resource_offers.read().get(id).cloned()
    }

    fn get_deal(&self, id: &DealId) -> Result<DealContainer> {
        self.deals.read().get(id).cloned()
    }

    fn get_job_offers(&self, query: &JobOfferQuery) -> Result<Vec<JobOfferContainer>> {
        let table = self.job_offers.read();
        let mut out: Vec<JobOfferContainer> = match &query.job_creator {
            Some(creator) => table
                .by_creator
                .ids(creator)
                .filter_map(|id| table.rows.get(id))
                .filter(|c| query.matches(c))
                .cloned()
                .collect(),
            None => table
                .rows
                .values()
                .filter(|c| query.matches(c))
                .cloned()
                .collect(),
        };
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    fn get_resource_offers(
        &self,
        query: &ResourceOfferQuery,
    ) -> Result<Vec<ResourceOfferContainer>> {
        let table = self.resource_offers.read();
        let mut out: Vec<ResourceOfferContainer> =
            match (&query.resource_provider, query.active) {
                (Some(provider), _) => table
                    .by_provider
                    .ids(provider)
                    .filter_map(|id| table.rows.get(id))
                    .filter(|c| query.matches(c))
                    .cloned()
                    .collect(),
                (None, Some(true)) => table
                    .active
                    .iter()
                    .filter_map(|id| table.rows.get(id))
                    .filter(|c| query.matches(c))
                    .cloned()
                    .collect(),
                (None, _) => table
                    .rows
                    .values()
                    .filter(|c| query.matches(c))
                    .cloned()
                    .collect(),
            };
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    fn get_deals(&self, query: &DealQuery) -> Result<Vec<DealContainer>> {
        let table = self.deals.read();
        let mut out: Vec<DealContainer> = match (&query.job_creator, &query.resource_provider) {
            (Some(jc), _) => table
                .by_job_creator
                .ids(jc)
                .filter_map(|id| table.rows.get(id))
                .filter(|c| query.matches(c))
                .cloned()
                .collect(),
            (None, Some(rp)) => table
                .by_resource_provider
                .ids(rp)
                .filter_map(|id| table.rows.get(id))
                .filter(|c| query.matches(c))
                .cloned()
                .collect(),
            (None, None) => table
                .rows
                .values()
                .filter(|c| query.matches(c))
                .cloned()
                .collect(),
        };
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    fn update_job_offer_state(
        &self,
        id: &OfferId,
        expected: AgreementState,
        deal_id: Option<DealId>,
        state: AgreementState,
        at: DateTime<Utc>,
    ) -> Result<JobOfferContainer> {
        let mut table = self.job_offers.write();
        let actual = table.get(id)?.state;
        check_transition(id.as_str(), expected, actual, state)?;
        table
            .apply_state(id, state, deal_id, at)
            .ok_or_else(|| not_found("job offer", id.as_str()))
    }

    fn update_resource_offer_state(
        &self,
        id: &OfferId,
        expected: AgreementState,
        deal_id: Option<DealId>,
        state: AgreementState,
        at: DateTime<Utc>,
    ) -> Result<ResourceOfferContainer> {
        let mut table = self.resource_offers.write();
        let actual = table.get(id)?.state;
        check_transition(id.as_str(), expected, actual, state)?;
        table
            .apply_state(id, state, deal_id, at)
            .ok_or_else(|| not_found("resource offer", id.as_str()))
    }

    fn update_deal_state(
        &self,
        id: &DealId,
        expected: AgreementState,
        state: AgreementState,
        at: DateTime<Utc>,
    ) -> Result<DealContainer> {
        let mut table = self.deals.write();
        let row = table
            .rows
            .get_mut(id)
            .ok_or_else(|| not_found("deal", id.as_str()))?;
        check_transition(id.as_str(), expected, row.state, state)?;
        row.state = state;
        row.state_entered_at = at;
        Ok(row.clone())
    }

    fn record_result(&self, id: &DealId, result: JobResult) -> Result<DealContainer> {
        check_result(id, &result)?;
        let mut table = self.deals.write();
        let row = table
            .rows
            .get_mut(id)
            .ok_or_else(|| not_found("deal", id.as_str()))?;
        row.result = Some(result);
        Ok(row.clone())
    }

    fn remove_job_offer(&self, id: &OfferId) -> Result<()> {
        let mut table = self.job_offers.write();
        let (state, creator) = {
            let row = table.get(id)?;
            (row.state, row.job_creator.clone())
        };
        if state != AgreementState::Open {
            return Err(SolverError::NotRemovable {
                id: id.to_string(),
                state,
            });
        }
        table.rows.remove(id);
        table.by_creator.remove(&creator, id);
        debug!(id = %id.short(), "Job offer removed");
        Ok(())
    }

    fn remove_resource_offer(&self, id: &OfferId) -> Result<()> {
        let mut table = self.resource_offers.write();
        let (state, provider) = {
            let row = table.get(id)?;
            (row.state, row.resource_provider.clone())
        };
        if state != AgreementState::Open {
            return Err(SolverError::NotRemovable {
                id: id.to_string(),
                state,
            });
        }
        table.rows.remove(id);
        table.by_provider.remove(&provider, id);
        table.active.remove(id);
        debug!(id = %id.short(), "Resource offer removed");
        Ok(())
    }

    fn commit_match(&self, deal: DealContainer) -> Result<CommittedMatch> {
        validate_deal(&deal)?;
        if deal.state != AgreementState::Negotiating {
            return Err(invalid(format!(
                "new deal must start NEGOTIATING, got {}",
                deal.state
            )));
        }

        let mut jobs = self.job_offers.write();
        let mut resources = self.resource_offers.write();
        let mut deals = self.deals.write();

        if deals.rows.contains_key(&deal.id) {
            return Err(SolverError::DuplicateId(deal.id.to_string()));
        }
        for (id, state) in [
            (&deal.job_offer, jobs.get(&deal.job_offer)?.state),
            (&deal.resource_offer, resources.get(&deal.resource_offer)?.state),
        ] {
            if state != AgreementState::Open {
                return Err(SolverError::AlreadyMatched {
                    id: id.to_string(),
                    state,
                });
            }
        }

        // All preconditions hold; nothing below can fail.
        let at = deal.created_at;
        let job_offer = jobs
            .apply_state(
                &deal.job_offer,
                AgreementState::Negotiating,
                Some(deal.id.clone()),
                at,
            )
            .ok_or_else(|| SolverError::Internal("job offer vanished under lock".into()))?;
        let resource_offer = resources
            .apply_state(
                &deal.resource_offer,
                AgreementState::Negotiating,
                Some(deal.id.clone()),
                at,
            )
            .ok_or_else(|| SolverError::Internal("resource offer vanished under lock".into()))?;
        deals.insert(deal.clone());

        Ok(CommittedMatch {
            deal,
            job_offer,
            resource_offer,
        })
    }

    fn advance_deal(
        &self,
        id: &DealId,
        expected: AgreementState,
        next: AgreementState,
        result: Option<JobResult>,
        at: DateTime<Utc>,
    ) -> Result<LockstepUpdate> {
        if let Some(result) = &result {
            check_result(id, result)?;
        }
        let mut jobs = self.job_offers.write();
        let mut resources = self.resource_offers.write();
        let mut deals = self.deals.write();

        let (job_id, resource_id) = {
            let row = deals.get(id)?;
            check_transition(id.as_str(), expected, row.state, next)?;
            (row.job_offer.clone(), row.resource_offer.clone())
        };
        jobs.get(&job_id)?;
        resources.get(&resource_id)?;

        let job_offer = jobs
            .apply_state(&job_id, next, None, at)
            .ok_or_else(|| SolverError::Internal("job offer vanished under lock".into()))?;
        let resource_offer = resources
            .apply_state(&resource_id, next, None, at)
            .ok_or_else(|| SolverError::Internal("resource offer vanished under lock".into()))?;
        let deal = {
            let row = deals
                .rows
                .get_mut(id)
                .ok_or_else(|| SolverError::Internal("deal vanished under lock".into()))?;
            row.state = next;
            row.state_entered_at = at;
            if result.is_some() {
                row.result = result;
            }
            row.clone()
        };

        Ok(LockstepUpdate {
            from: expected,
            deal,
            job_offer,
            resource_offer,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
