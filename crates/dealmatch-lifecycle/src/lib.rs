//! # dealmatch-lifecycle
//!
//! **Deal lifecycle plane**: everything that changes state after an offer
//! is stored.
//!
//! ## Architecture
//!
//! The [`Solver`] facade receives offers and signals and delegates to:
//! 1. `dealmatch-matchcore` to plan which pairs become deals
//! 2. [`DealController`] to commit deals and drive them through the
//!    agreement state machine, in lockstep with their parent offers
//! 3. [`DealController::enforce_timeouts`] to force stalled deals forward
//! 4. a [`NotificationSink`] that hears about every committed transition
//!
//! The [`scheduler`] runs scans and timeout sweeps on a tokio task.

pub mod controller;
pub mod notify;
pub mod scheduler;
pub mod service;
pub mod telemetry;
pub mod timeouts;

pub use controller::DealController;
pub use notify::{ChannelSink, NotificationSink, RecordingSink, TracingSink};
pub use service::{ScanReport, Solver};
pub use telemetry::init_tracing;
pub use timeouts::ExpiredDeal;
