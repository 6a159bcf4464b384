//! Event consumers and batch dispatch.
//!
//! Consumers are independent objects that observe batches of decoded
//! domain events and apply them to their own slice of persisted state.
//! Dispatch is batch-major: each consumer sees the entire batch before the
//! next consumer sees anything, so every consumer reasons about a
//! consistent "events since last dispatch" snapshot instead of interleaved
//! partial views.

use thiserror::Error;

use quill_sync_types::DomainEvent;

use crate::fault::FaultReporter;

/// A consumer failed to apply a batch.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The consumer's own persistence side effects failed.
    #[error("consumer failed: {0}")]
    Failed(String),
}

/// Observes batches of decoded domain events.
///
/// Consumers own their persistence side effects; the registry only routes
/// events to them. A consumer must not assume anything about other
/// consumers, only that it sees every batch in arrival order.
pub trait EventConsumer: Send {
    /// Stable name, used in fault reports.
    fn name(&self) -> &str;

    /// Apply a batch of domain events, in arrival order.
    fn process_events(&mut self, events: &[DomainEvent]) -> Result<(), ConsumerError>;

    /// Stream continuity was restored after an interruption (or established
    /// for the first time). Consumers hook catch-up work that depends on the
    /// transition rather than on individual events here.
    fn did_restore_continuity(&mut self) {}
}

/// Ordered collection of consumers; dispatch order is registration order.
#[derive(Default)]
pub struct ConsumerRegistry {
    consumers: Vec<Box<dyn EventConsumer>>,
}

impl ConsumerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer. Dispatch order is registration order and never
    /// changes for the lifetime of the session.
    pub fn register(&mut self, consumer: Box<dyn EventConsumer>) {
        self.consumers.push(consumer);
    }

    /// Deliver the entire batch to every consumer, in registration order.
    ///
    /// A failing consumer does not prevent delivery to the ones registered
    /// after it; collected errors are surfaced to `faults` after the full
    /// dispatch completes.
    pub fn dispatch(&mut self, events: &[DomainEvent], faults: &dyn FaultReporter) {
        if events.is_empty() {
            return;
        }

        let mut failures = Vec::new();
        for consumer in &mut self.consumers {
            if let Err(error) = consumer.process_events(events) {
                failures.push((consumer.name().to_string(), error));
            }
        }

        for (name, error) in &failures {
            faults.consumer_failed(name, error);
        }
    }

    /// Notify every consumer that stream continuity is restored.
    pub fn notify_continuity_restored(&mut self) {
        for consumer in &mut self.consumers {
            consumer.did_restore_continuity();
        }
    }

    /// Number of registered consumers.
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    /// Whether no consumer is registered.
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Drop all consumers. Only used on teardown.
    pub fn clear(&mut self) {
        self.consumers.clear();
    }
}

impl std::fmt::Debug for ConsumerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerRegistry")
            .field("consumers", &self.consumers.len())
            .finish()
    }
}
