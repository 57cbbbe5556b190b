//! The `Solver` facade: the surface external callers use.
//!
//! Wires the store, the matching engine and the lifecycle controller
//! together behind one type:
//! 1. **Submission** assigns content ids and stores offers as `Open`
//! 2. **Queries** read through to the store
//! 3. **Signals** (`report_*`) drive deals through the controller
//! 4. **`run_scan`** plans a matching pass and commits each proposal
//! 5. **`enforce_timeouts`** sweeps stage deadlines

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{info, warn};

use dealmatch_matchcore::plan_matches;
use dealmatch_store::{
    DealQuery, JobOfferQuery, MemoryStore, ResourceOfferQuery, SolverStore,
};
use dealmatch_types::{
    Clock, ContentAddresser, DealContainer, DealId, JobOffer, JobOfferContainer, JobResult,
    OfferId, ResourceOffer, ResourceOfferContainer, Result, Sha256Addresser, SolverConfig,
    SolverError, SystemClock, Verdict,
};

use crate::controller::DealController;
use crate::notify::{NotificationSink, TracingSink};
use crate::timeouts::ExpiredDeal;

/// Summary of one matching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Root of the plan the pass executed.
    pub plan_root: [u8; 32],
    /// Proposals the planner produced.
    pub proposed: usize,
    /// Deals actually committed.
    pub created: Vec<DealId>,
    /// Proposals that failed at commit (an offer moved, terms changed).
    pub failed: usize,
    /// Incompatible pairs the planner tried.
    pub rejected_pairs: usize,
    pub unmatched_jobs: usize,
    pub unmatched_resources: usize,
}

/// Solver service.
pub struct Solver {
    store: Arc<dyn SolverStore>,
    addresser: Arc<dyn ContentAddresser>,
    clock: Arc<dyn Clock>,
    controller: DealController,
    config: SolverConfig,
    /// Held for a whole scan: one active pass at a time.
    scan_lock: Mutex<()>,
    scan_trigger: Arc<Notify>,
}

impl Solver {
    /// Build a solver over injected collaborators.
    ///
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn new(
        store: Arc<dyn SolverStore>,
        addresser: Arc<dyn ContentAddresser>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
        config: SolverConfig,
    ) -> Result<Self> {
        config.validate()?;
        let controller = DealController::new(
            store.clone(),
            addresser.clone(),
            clock.clone(),
            sink,
            config.max_transition_retries,
        );
        Ok(Self {
            store,
            addresser,
            clock,
            controller,
            config,
            scan_lock: Mutex::new(()),
            scan_trigger: Arc::new(Notify::new()),
        })
    }

    /// In-memory store, SHA-256 ids, wall clock, tracing notifications.
    pub fn in_memory(config: SolverConfig) -> Result<Self> {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Sha256Addresser),
            Arc::new(SystemClock),
            Arc::new(TracingSink),
            config,
        )
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    #[must_use]
    pub fn controller(&self) -> &DealController {
        &self.controller
    }

    /// Notified whenever a submission asks for an early scan.
    #[must_use]
    pub fn scan_trigger(&self) -> Arc<Notify> {
        self.scan_trigger.clone()
    }

    // -----------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------

    /// Store a job offer and return its content id.
    ///
    /// Resubmitting identical content returns the same id and stores
    /// nothing new.
    ///
    /// # Errors
    /// - `InvalidRecord` if the offer fails validation or carries an id
    ///   that does not match its content
    /// - `DuplicateId` if the id is taken by different content
    pub fn submit_job_offer(&self, mut offer: JobOffer) -> Result<OfferId> {
        offer.validate()?;
        let id = self.addresser.job_offer_id(&offer)?;
        check_claimed_id(&offer.id, &id)?;
        offer.id = id.clone();

        self.store
            .add_job_offer(JobOfferContainer::new(offer, self.clock.now()))?;
        info!(id = %id.short(), "Job offer submitted");
        self.request_scan();
        Ok(id)
    }

    /// Store a resource offer and return its content id.
    pub fn submit_resource_offer(&self, mut offer: ResourceOffer) -> Result<OfferId> {
        offer.validate()?;
        let id = self.addresser.resource_offer_id(&offer)?;
        check_claimed_id(&offer.id, &id)?;
        offer.id = id.clone();

        self.store
            .add_resource_offer(ResourceOfferContainer::new(offer, self.clock.now()))?;
        info!(id = %id.short(), "Resource offer submitted");
        self.request_scan();
        Ok(id)
    }

    fn request_scan(&self) {
        if self.config.scan_on_submit {
            self.scan_trigger.notify_one();
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn get_job_offer(&self, id: &OfferId) -> Result<JobOfferContainer> {
        self.store.get_job_offer(id)
    }

    pub fn get_resource_offer(&self, id: &OfferId) -> Result<ResourceOfferContainer> {
        self.store.get_resource_offer(id)
    }

    pub fn get_deal(&self, id: &DealId) -> Result<DealContainer> {
        self.store.get_deal(id)
    }

    pub fn get_job_offers(&self, query: &JobOfferQuery) -> Result<Vec<JobOfferContainer>> {
        self.store.get_job_offers(query)
    }

    pub fn get_resource_offers(
        &self,
        query: &ResourceOfferQuery,
    ) -> Result<Vec<ResourceOfferContainer>> {
        self.store.get_resource_offers(query)
    }

    pub fn get_deals(&self, query: &DealQuery) -> Result<Vec<DealContainer>> {
        self.store.get_deals(query)
    }

    // -----------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------

    /// # Errors
    /// `NotRemovable` once the offer has been matched.
    pub fn remove_job_offer(&self, id: &OfferId) -> Result<()> {
        self.store.remove_job_offer(id)
    }

    pub fn remove_resource_offer(&self, id: &OfferId) -> Result<()> {
        self.store.remove_resource_offer(id)
    }

    // -----------------------------------------------------------------
    // Signals
    // -----------------------------------------------------------------

    pub fn report_agreement(&self, id: &DealId) -> Result<DealContainer> {
        self.controller.agree(id)
    }

    pub fn report_results_submitted(
        &self,
        id: &DealId,
        result: Option<JobResult>,
    ) -> Result<DealContainer> {
        self.controller.submit_results(id, result)
    }

    pub fn report_judgement(&self, id: &DealId, verdict: Verdict) -> Result<DealContainer> {
        self.controller.judge(id, verdict)
    }

    pub fn report_mediation(&self, id: &DealId, verdict: Verdict) -> Result<DealContainer> {
        self.controller.mediate(id, verdict)
    }

    // -----------------------------------------------------------------
    // Scan + sweep
    // -----------------------------------------------------------------

    /// Run one matching pass over every open offer.
    ///
    /// A proposal that fails at commit is logged and skipped; the pass
    /// never aborts on a single pair.
    ///
    /// # Errors
    /// Only if the store cannot be read.
    pub fn run_scan(&self) -> Result<ScanReport> {
        let _guard = self.scan_lock.lock();

        let jobs = self.store.get_job_offers(&JobOfferQuery::open())?;
        let resources = self.store.get_resource_offers(&ResourceOfferQuery::open())?;
        let plan = plan_matches(&jobs, &resources);

        let mut report = ScanReport {
            plan_root: plan.plan_root,
            proposed: plan.matches.len(),
            rejected_pairs: plan.rejections.len(),
            unmatched_jobs: plan.unmatched_jobs.len(),
            unmatched_resources: plan.unmatched_resources.len(),
            ..ScanReport::default()
        };

        for proposal in &plan.matches {
            match self
                .controller
                .create(&proposal.job_id, &proposal.resource_id)
            {
                Ok(deal) => report.created.push(deal.id),
                Err(err) => {
                    warn!(
                        job = %proposal.job_id.short(),
                        resource = %proposal.resource_id.short(),
                        code = err.code(),
                        error = %err,
                        "Proposed match not committed"
                    );
                    report.failed += 1;
                }
            }
        }

        if !plan.is_empty() || report.failed > 0 {
            info!(
                plan_root = %plan.plan_root_hex(),
                proposed = report.proposed,
                created = report.created.len(),
                failed = report.failed,
                open_jobs = report.unmatched_jobs,
                open_resources = report.unmatched_resources,
                "Scan complete"
            );
        }
        Ok(report)
    }

    /// Force every deal past its stage deadline forward.
    pub fn enforce_timeouts(&self) -> Result<Vec<ExpiredDeal>> {
        self.controller.enforce_timeouts()
    }
}

/// A caller may pre-compute the id; if it does, it has to be the right one.
fn check_claimed_id(claimed: &OfferId, computed: &OfferId) -> Result<()> {
    if claimed.is_empty() || claimed == computed {
        Ok(())
    } else {
        Err(SolverError::InvalidRecord {
            reason: format!("offer id {claimed} does not match content id {computed}"),
        })
    }
}
