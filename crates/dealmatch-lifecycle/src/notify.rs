//! Notification sinks: where committed transitions are delivered.
//!
//! Execution and settlement backends subscribe through a sink. Sinks are
//! called synchronously after the store commit and must not block.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use dealmatch_types::{DealId, TransitionCause, TransitionEvent};

/// Receives every committed state transition.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &TransitionEvent);
}

/// Writes each transition to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: &TransitionEvent) {
        match event.cause {
            TransitionCause::Timeout => warn!(
                deal = %event.deal_id,
                job = %event.job_offer_id.short(),
                resource = %event.resource_offer_id.short(),
                from = %event.from,
                to = %event.to,
                forfeited = ?event.forfeited_collateral,
                "Transition (timeout)"
            ),
            TransitionCause::Match | TransitionCause::Signal => info!(
                deal = %event.deal_id,
                job = %event.job_offer_id.short(),
                resource = %event.resource_offer_id.short(),
                from = %event.from,
                to = %event.to,
                cause = ?event.cause,
                "Transition"
            ),
        }
    }
}

/// Forwards transitions to an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TransitionEvent>,
}

impl ChannelSink {
    /// A sink and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransitionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: &TransitionEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!(deal = %event.deal_id, "Notification receiver dropped");
        }
    }
}

/// Keeps every transition in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TransitionEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().clone()
    }

    /// Only the transitions of one deal.
    #[must_use]
    pub fn for_deal(&self, id: &DealId) -> Vec<TransitionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| &e.deal_id == id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: &TransitionEvent) {
        self.events.lock().push(event.clone());
    }
}
