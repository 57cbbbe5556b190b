//! End-to-end tests across the whole solver.
//!
//! These tests drive the `Solver` facade the way an external caller does:
//! Submission -> Offer Store -> `MatchCore` scan -> Lifecycle Controller
//!
//! They verify the documented marketplace scenarios: idempotent
//! submission, first-fit matching with index preference, the full
//! agreement lifecycle with disputes, timeout enforcement, and
//! order-independent scans.

use std::sync::Arc;

use dealmatch_lifecycle::{ChannelSink, RecordingSink, Solver};
use dealmatch_store::{DealQuery, JobOfferQuery, MemoryStore, ResourceOfferQuery};
use dealmatch_types::dummy::dummy_pricing;
use dealmatch_types::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Helper: a solver on a manual clock that records every notification.
struct Market {
    solver: Solver,
    clock: Arc<ManualClock>,
    sink: Arc<RecordingSink>,
}

impl Market {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::at_epoch());
        let sink = Arc::new(RecordingSink::new());
        let solver = Solver::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Sha256Addresser),
            clock.clone(),
            sink.clone(),
            SolverConfig::default(),
        )
        .unwrap();
        Self {
            solver,
            clock,
            sink,
        }
    }

    fn job(&self, creator: &str, cpu: u64, ram: u64, created_at: u64) -> OfferId {
        self.solver
            .submit_job_offer(job_offer(creator, cpu, ram, created_at, 0))
            .unwrap()
    }

    fn resource(&self, provider: &str, cpu: u64, ram: u64, index: u32, created_at: u64) -> OfferId {
        self.solver
            .submit_resource_offer(resource_offer(provider, cpu, ram, index, created_at, 0))
            .unwrap()
    }

    /// Scan and return the single deal it must have created.
    fn match_one(&self) -> DealContainer {
        let report = self.solver.run_scan().unwrap();
        assert_eq!(report.created.len(), 1, "expected exactly one deal: {report:?}");
        self.solver.get_deal(&report.created[0]).unwrap()
    }
}

fn job_offer(creator: &str, cpu: u64, ram: u64, created_at: u64, salt: u128) -> JobOffer {
    let mut offer = JobOffer::dummy(creator, MachineSpec::new(0, cpu, ram), created_at);
    offer.nonce = OfferNonce::from_u128(salt);
    offer
}

fn resource_offer(
    provider: &str,
    cpu: u64,
    ram: u64,
    index: u32,
    created_at: u64,
    salt: u128,
) -> ResourceOffer {
    let mut offer = ResourceOffer::dummy(provider, MachineSpec::new(0, cpu, ram), index, created_at);
    offer.nonce = OfferNonce::from_u128(salt);
    offer
}

/// Submit everything to a fresh solver, scan once, and return the plan
/// root, the created deal ids and the leftover resource ids.
fn scan_fresh_market(
    jobs: &[JobOffer],
    resources: &[ResourceOffer],
) -> ([u8; 32], Vec<DealId>, Vec<OfferId>) {
    let m = Market::new();
    for r in resources {
        m.solver.submit_resource_offer(r.clone()).unwrap();
    }
    for j in jobs {
        m.solver.submit_job_offer(j.clone()).unwrap();
    }
    let report = m.solver.run_scan().unwrap();
    let mut deals = report.created.clone();
    deals.sort();
    let leftovers = m
        .solver
        .get_resource_offers(&ResourceOfferQuery::open())
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    (report.plan_root, deals, leftovers)
}

// =========================================================================
// Submission
// =========================================================================

#[test]
fn resubmission_is_idempotent() {
    let m = Market::new();
    let offer = job_offer("alice", 1000, 1024, 1, 42);
    let first = m.solver.submit_job_offer(offer.clone()).unwrap();
    let second = m.solver.submit_job_offer(offer).unwrap();
    assert_eq!(first, second);

    let stored = m
        .solver
        .get_job_offers(&JobOfferQuery::by_creator(Address::new("alice")))
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[test]
fn same_content_with_different_salt_is_a_different_offer() {
    let m = Market::new();
    let a = m.solver.submit_job_offer(job_offer("alice", 1000, 1024, 1, 1)).unwrap();
    let b = m.solver.submit_job_offer(job_offer("alice", 1000, 1024, 1, 2)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn open_offers_can_be_withdrawn() {
    let m = Market::new();
    let id = m.resource("bob", 1000, 1024, 0, 0);
    m.solver.remove_resource_offer(&id).unwrap();
    assert!(matches!(
        m.solver.get_resource_offer(&id),
        Err(SolverError::NotFound { .. })
    ));
}

// =========================================================================
// Matching scenarios
// =========================================================================

#[test]
fn single_job_single_resource_scenario() {
    let m = Market::new();
    let j1 = m.job("alice", 1000, 1024, 1);
    let r1 = m.resource("bob", 2000, 4096, 0, 0);

    let deal = m.match_one();
    assert_eq!(deal.deal.pricing.instruction_price, 10);
    assert_eq!(deal.job_offer, j1);
    assert_eq!(deal.resource_offer, r1);
    assert_eq!(deal.deal.members.directory, Address::new("directory-1"));
    assert_eq!(deal.deal.members.mediators, vec![Address::new("mediator-1")]);

    let job = m.solver.get_job_offer(&j1).unwrap();
    let resource = m.solver.get_resource_offer(&r1).unwrap();
    assert_eq!(job.state, AgreementState::Negotiating);
    assert_eq!(resource.state, AgreementState::Negotiating);
    assert_eq!(job.deal_id.as_ref(), Some(&deal.id));
    assert_eq!(resource.deal_id.as_ref(), Some(&deal.id));
    assert!(matches!(
        m.solver.remove_job_offer(&j1),
        Err(SolverError::NotRemovable { .. })
    ));
}

#[test]
fn lower_index_wins_regardless_of_age() {
    let m = Market::new();
    m.job("alice", 1000, 1024, 10);
    let _index1 = m.resource("bob", 2000, 2048, 1, 0);
    let index0 = m.resource("bob", 2000, 2048, 0, 5);

    let deal = m.match_one();
    assert_eq!(deal.resource_offer, index0);
}

#[test]
fn capacity_boundary_is_exact() {
    let m = Market::new();
    m.resource("bob", 1000, 4096, 0, 0);
    m.job("alice", 1000, 4097, 1);
    let report = m.solver.run_scan().unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.rejected_pairs, 1);

    m.job("carol", 1000, 4096, 2);
    let deal = m.match_one();
    assert_eq!(deal.job_creator, Address::new("carol"));
}

#[test]
fn fixed_price_disagreement_prevents_match() {
    let m = Market::new();
    let mut job = job_offer("alice", 1000, 1024, 1, 0);
    job.mode = PricingMode::FixedPrice;
    job.pricing = dummy_pricing(7);
    m.solver.submit_job_offer(job).unwrap();
    m.resource("bob", 2000, 2048, 0, 0);

    let report = m.solver.run_scan().unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.unmatched_jobs, 1);
    assert_eq!(report.unmatched_resources, 1);
}

/// Ten jobs and eight resources of mixed size, owners and index.
fn mixed_market() -> (Vec<JobOffer>, Vec<ResourceOffer>) {
    let jobs: Vec<JobOffer> = (0..10u64)
        .map(|i| {
            job_offer(
                &format!("jc{}", i % 3),
                500 * (i % 3 + 1),
                1024 * (i % 4 + 1),
                i / 3,
                u128::from(i),
            )
        })
        .collect();
    let resources: Vec<ResourceOffer> = (0..8u32)
        .map(|i| {
            resource_offer(
                &format!("rp{}", i % 2),
                1000 * u64::from(i % 3 + 1),
                1024 * u64::from(i % 5 + 1),
                i % 3,
                u64::from(i),
                u128::from(i) + 100,
            )
        })
        .collect();
    (jobs, resources)
}

#[test]
fn scan_is_independent_of_submission_order() {
    let (jobs, resources) = mixed_market();
    let reference = scan_fresh_market(&jobs, &resources);
    assert!(!reference.1.is_empty());

    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..10 {
        let mut jobs = jobs.clone();
        let mut resources = resources.clone();
        jobs.shuffle(&mut rng);
        resources.shuffle(&mut rng);
        assert_eq!(scan_fresh_market(&jobs, &resources), reference);
    }
}

#[test]
fn concurrent_scans_never_double_match() {
    let (jobs, resources) = mixed_market();
    let (_, expected, _) = scan_fresh_market(&jobs, &resources);

    let m = Market::new();
    for r in &resources {
        m.solver.submit_resource_offer(r.clone()).unwrap();
    }
    for j in &jobs {
        m.solver.submit_job_offer(j.clone()).unwrap();
    }

    let reports: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| m.solver.run_scan().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(reports.iter().all(|r| r.failed == 0));
    let mut created: Vec<DealId> = reports.iter().flat_map(|r| r.created.clone()).collect();
    created.sort();
    assert_eq!(created, expected);

    let deals = m.solver.get_deals(&DealQuery::default()).unwrap();
    assert_eq!(deals.len(), expected.len());
    let mut jobs_used: Vec<&OfferId> = deals.iter().map(|d| &d.job_offer).collect();
    let mut resources_used: Vec<&OfferId> = deals.iter().map(|d| &d.resource_offer).collect();
    jobs_used.sort();
    jobs_used.dedup();
    resources_used.sort();
    resources_used.dedup();
    assert_eq!(jobs_used.len(), deals.len());
    assert_eq!(resources_used.len(), deals.len());
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn dispute_resolved_by_mediator() {
    let m = Market::new();
    m.job("alice", 1000, 1024, 1);
    m.resource("bob", 2000, 2048, 0, 0);
    let id = m.match_one().id;

    m.solver.report_agreement(&id).unwrap();
    m.solver
        .report_results_submitted(
            &id,
            Some(JobResult {
                id: "result-1".into(),
                deal_id: id.clone(),
                data_id: "bafyresult".into(),
                instruction_count: 5_000,
            }),
        )
        .unwrap();
    let judged = m.solver.report_judgement(&id, Verdict::Rejected).unwrap();
    assert_eq!(judged.state, AgreementState::Mediating);

    let done = m.solver.report_mediation(&id, Verdict::Accepted).unwrap();
    assert_eq!(done.state, AgreementState::Completed);
    assert_eq!(done.result.unwrap().instruction_count, 5_000);

    let path: Vec<AgreementState> = m.sink.for_deal(&id).iter().map(|e| e.to).collect();
    assert_eq!(
        path,
        vec![
            AgreementState::Negotiating,
            AgreementState::Agreed,
            AgreementState::ResultsSubmitted,
            AgreementState::ResultsJudged,
            AgreementState::Mediating,
            AgreementState::Completed,
        ]
    );
}

#[test]
fn active_flag_follows_the_lifecycle() {
    let m = Market::new();
    m.job("alice", 1000, 1024, 1);
    let r = m.resource("bob", 2000, 2048, 0, 0);
    let active = || {
        m.solver
            .get_resource_offers(&ResourceOfferQuery::by_provider(Address::new("bob")).with_active(true))
            .unwrap()
            .len()
    };

    assert_eq!(active(), 0);
    let id = m.match_one().id;
    assert_eq!(active(), 1);
    m.solver.report_agreement(&id).unwrap();
    assert_eq!(active(), 1);
    m.solver.report_results_submitted(&id, None).unwrap();
    assert_eq!(active(), 0);
    m.solver.report_judgement(&id, Verdict::Accepted).unwrap();
    assert_eq!(active(), 0);

    let stored = m.solver.get_resource_offer(&r).unwrap();
    assert_eq!(stored.state, AgreementState::Completed);
    for state in AgreementState::ALL {
        let expected = matches!(state, AgreementState::Negotiating | AgreementState::Agreed);
        assert_eq!(state.is_active(), expected, "{state}");
    }
}

#[test]
fn missed_results_deadline_cancels_deal() {
    let m = Market::new();
    let j = m.job("alice", 1000, 1024, 1);
    let r = m.resource("bob", 2000, 2048, 0, 0);
    let id = m.match_one().id;
    m.solver.report_agreement(&id).unwrap();
    m.sink.clear();

    m.clock.advance_secs(599);
    assert!(m.solver.enforce_timeouts().unwrap().is_empty());
    m.clock.advance_secs(1);

    let expired = m.solver.enforce_timeouts().unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].from, AgreementState::Agreed);
    assert_eq!(expired[0].to, AgreementState::Cancelled);
    assert_eq!(expired[0].forfeited_collateral, 20);

    let events = m.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].deal_id, id);
    assert_eq!(events[0].job_offer_id, j);
    assert_eq!(events[0].resource_offer_id, r);
    assert_eq!(events[0].cause, TransitionCause::Timeout);
    assert_eq!(events[0].forfeited_collateral, Some(20));

    assert!(m.solver.enforce_timeouts().unwrap().is_empty());
    assert_eq!(m.sink.len(), 1);

    assert_eq!(
        m.solver.get_deal(&id).unwrap().state,
        AgreementState::Cancelled
    );
    assert_eq!(
        m.solver.get_job_offer(&j).unwrap().state,
        AgreementState::Cancelled
    );
    assert!(!m.solver.get_resource_offer(&r).unwrap().is_active());
    assert!(matches!(
        m.solver.report_results_submitted(&id, None),
        Err(SolverError::InvalidTransition { .. })
    ));
}

#[test]
fn deals_are_queryable_by_party_and_state() {
    let m = Market::new();
    m.job("alice", 1000, 1024, 1);
    m.job("carol", 1000, 1024, 2);
    m.resource("bob", 2000, 2048, 0, 0);
    m.resource("dave", 2000, 2048, 1, 0);
    let report = m.solver.run_scan().unwrap();
    assert_eq!(report.created.len(), 2);

    let bobs = m
        .solver
        .get_deals(&DealQuery {
            resource_provider: Some(Address::new("bob")),
            ..DealQuery::default()
        })
        .unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].job_creator, Address::new("alice"));

    m.solver.report_agreement(&bobs[0].id).unwrap();
    let agreed = m
        .solver
        .get_deals(&DealQuery::in_state(AgreementState::Agreed))
        .unwrap();
    assert_eq!(agreed.len(), 1);
    assert!(
        m.solver
            .get_deals(&DealQuery {
                job_creator: Some(Address::new("nobody")),
                ..DealQuery::default()
            })
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn channel_sink_streams_transitions() {
    let (sink, mut rx) = ChannelSink::new();
    let solver = Solver::new(
        Arc::new(MemoryStore::new()),
        Arc::new(Sha256Addresser),
        Arc::new(ManualClock::at_epoch()),
        Arc::new(sink),
        SolverConfig::default(),
    )
    .unwrap();

    solver
        .submit_job_offer(job_offer("alice", 1000, 1024, 1, 0))
        .unwrap();
    solver
        .submit_resource_offer(resource_offer("bob", 2000, 2048, 0, 0, 0))
        .unwrap();
    solver.run_scan().unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.cause, TransitionCause::Match);
    assert_eq!(event.to, AgreementState::Negotiating);
    assert!(rx.try_recv().is_err());
}
