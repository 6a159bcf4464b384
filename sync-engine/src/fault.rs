//! Fault/log collaborator seam.
//!
//! Decode failures, per-consumer dispatch errors and strategy poll errors
//! are contained inside the engine and surfaced here for diagnostic
//! recording. The engine never retries or aborts based on these reports;
//! what a sink does with them is the application's business.

use quill_sync_types::{EventPosition, TypesError};

use crate::consumer::ConsumerError;
use crate::strategy::StrategyError;

/// Receives contained faults for diagnostic recording.
pub trait FaultReporter: Send {
    /// A raw event at `position` could not be decoded and was skipped.
    fn decode_failed(&self, position: EventPosition, error: &TypesError);

    /// A consumer failed on a batch; the batch still reached the others.
    fn consumer_failed(&self, consumer: &str, error: &ConsumerError);

    /// A strategy errored while polled; treated as "no request" this tick.
    fn strategy_failed(&self, strategy: &str, error: &StrategyError);
}

/// Default reporter that records faults via `tracing`.
#[derive(Debug, Default, Clone)]
pub struct LogFaultReporter;

impl FaultReporter for LogFaultReporter {
    fn decode_failed(&self, position: EventPosition, error: &TypesError) {
        tracing::warn!("skipping undecodable event at {}: {}", position, error);
    }

    fn consumer_failed(&self, consumer: &str, error: &ConsumerError) {
        tracing::warn!("consumer {} failed on batch: {}", consumer, error);
    }

    fn strategy_failed(&self, strategy: &str, error: &StrategyError) {
        tracing::warn!("strategy {} failed while polled: {}", strategy, error);
    }
}

/// A recorded fault, for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultRecord {
    /// Decode failure at the given position.
    Decode(EventPosition),
    /// Named consumer failed.
    Consumer(String),
    /// Named strategy failed.
    Strategy(String),
}

/// Reporter that records every fault, for test verification.
#[derive(Debug, Default)]
pub struct RecordingFaultReporter {
    records: std::sync::Mutex<Vec<FaultRecord>>,
}

impl RecordingFaultReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All faults recorded so far, in report order.
    pub fn records(&self) -> Vec<FaultRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl FaultReporter for RecordingFaultReporter {
    fn decode_failed(&self, position: EventPosition, _error: &TypesError) {
        self.records
            .lock()
            .unwrap()
            .push(FaultRecord::Decode(position));
    }

    fn consumer_failed(&self, consumer: &str, _error: &ConsumerError) {
        self.records
            .lock()
            .unwrap()
            .push(FaultRecord::Consumer(consumer.to_string()));
    }

    fn strategy_failed(&self, strategy: &str, _error: &StrategyError) {
        self.records
            .lock()
            .unwrap()
            .push(FaultRecord::Strategy(strategy.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_report_order() {
        let reporter = RecordingFaultReporter::new();
        reporter.decode_failed(
            EventPosition::new(3),
            &TypesError::InvalidData("bad".into()),
        );
        reporter.consumer_failed("conversations", &ConsumerError::Failed("boom".into()));

        assert_eq!(
            reporter.records(),
            vec![
                FaultRecord::Decode(EventPosition::new(3)),
                FaultRecord::Consumer("conversations".into()),
            ]
        );
    }
}
