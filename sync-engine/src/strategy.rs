//! Sync strategies and pull-driven request scheduling.
//!
//! A strategy owns one domain's outbound-request production (self profile,
//! calling signaling, missing-event recovery, ...). The registry polls its
//! members in a fixed registration order and returns the first request
//! produced, so earlier-registered strategies get first claim on the
//! network each tick. A strategy that needs several requests is simply
//! re-polled on later ticks: this is a cooperative, pull-driven work queue,
//! not a push queue.
//!
//! Strategies never call each other; coordination happens only through the
//! [`SessionContext`] and the decoded-event dispatch path, which keeps them
//! independently testable and independently failable.

use thiserror::Error;

use quill_sync_types::{OutboundRequest, TransportResponse};

use crate::context::{ChangeSignal, SessionContext};
use crate::fault::FaultReporter;

/// A strategy errored while asked for a request.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The strategy could not evaluate its domain state.
    #[error("strategy failed: {0}")]
    Failed(String),
}

/// Opaque handle identifying which strategy produced a request.
///
/// Issued by the registry at poll time and presented back with the
/// transport's response so the completion reaches the producing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    strategy: usize,
}

/// A request pulled from the registry, tagged for completion routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Routes the transport's response back to the producing strategy.
    pub token: RequestToken,
    /// The request for the transport to execute.
    pub request: OutboundRequest,
}

/// One domain's outbound-request and inbound-completion handling.
///
/// Polling must be idempotent-safe: returning `None` is the steady-state
/// answer, and a strategy must answer within the tick - it never blocks on
/// I/O itself.
pub trait SyncStrategy: Send {
    /// Stable name, used in fault reports.
    fn name(&self) -> &str;

    /// Whether this strategy wants context-change notifications.
    fn tracks_context_changes(&self) -> bool {
        false
    }

    /// Persisted session state changed; delivered before the next poll.
    fn context_did_change(&mut self, _signals: &[ChangeSignal], _ctx: &SessionContext) {}

    /// Produce the next outbound request for this domain, if any.
    fn next_request(&mut self, ctx: &SessionContext)
        -> Result<Option<OutboundRequest>, StrategyError>;

    /// The transport finished a request this strategy produced.
    fn did_complete_request(&mut self, _response: &TransportResponse, _ctx: &SessionContext) {}
}

/// Ordered collection of strategies; poll order is registration order.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn SyncStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy. Earlier registrations are polled first, for the
    /// lifetime of the session.
    pub fn register(&mut self, strategy: Box<dyn SyncStrategy>) {
        self.strategies.push(strategy);
    }

    /// One scheduling tick: deliver pending change signals, then poll
    /// strategies in order and return the first request produced.
    ///
    /// At most one request is produced per call; strategies after the first
    /// hit are not polled this tick. A strategy that errors is reported to
    /// `faults` and counts as "no request" for this tick.
    pub fn next_request(
        &mut self,
        ctx: &SessionContext,
        faults: &dyn FaultReporter,
    ) -> Option<PendingRequest> {
        let signals = ctx.take_change_signals();
        if !signals.is_empty() {
            for strategy in &mut self.strategies {
                if strategy.tracks_context_changes() {
                    strategy.context_did_change(&signals, ctx);
                }
            }
        }

        for (index, strategy) in self.strategies.iter_mut().enumerate() {
            match strategy.next_request(ctx) {
                Ok(Some(request)) => {
                    return Some(PendingRequest {
                        token: RequestToken { strategy: index },
                        request,
                    });
                }
                Ok(None) => {}
                Err(error) => {
                    faults.strategy_failed(strategy.name(), &error);
                }
            }
        }
        None
    }

    /// Route a completed request's response to the producing strategy.
    pub fn complete(
        &mut self,
        token: RequestToken,
        response: &TransportResponse,
        ctx: &SessionContext,
    ) {
        if let Some(strategy) = self.strategies.get_mut(token.strategy) {
            strategy.did_complete_request(response, ctx);
        }
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategy is registered.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Drop all strategies. Only used on teardown.
    pub fn clear(&mut self) {
        self.strategies.clear();
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultRecord, RecordingFaultReporter};
    use std::sync::{Arc, Mutex};

    /// Strategy that serves a scripted list of requests, one per poll.
    struct ScriptedStrategy {
        name: String,
        queued: Vec<OutboundRequest>,
        completions: Arc<Mutex<Vec<u16>>>,
        signals_seen: Arc<Mutex<Vec<Vec<ChangeSignal>>>>,
        tracks: bool,
        fail_polls: bool,
    }

    impl ScriptedStrategy {
        fn new(name: &str, queued: Vec<OutboundRequest>) -> Self {
            Self {
                name: name.to_string(),
                queued,
                completions: Arc::new(Mutex::new(Vec::new())),
                signals_seen: Arc::new(Mutex::new(Vec::new())),
                tracks: false,
                fail_polls: false,
            }
        }

        fn tracking(mut self) -> Self {
            self.tracks = true;
            self
        }

        fn failing(mut self) -> Self {
            self.fail_polls = true;
            self
        }
    }

    impl SyncStrategy for ScriptedStrategy {
        fn name(&self) -> &str {
            &self.name
        }

        fn tracks_context_changes(&self) -> bool {
            self.tracks
        }

        fn context_did_change(&mut self, signals: &[ChangeSignal], _ctx: &SessionContext) {
            self.signals_seen.lock().unwrap().push(signals.to_vec());
        }

        fn next_request(
            &mut self,
            _ctx: &SessionContext,
        ) -> Result<Option<OutboundRequest>, StrategyError> {
            if self.fail_polls {
                return Err(StrategyError::Failed("simulated".into()));
            }
            if self.queued.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.queued.remove(0)))
            }
        }

        fn did_complete_request(&mut self, response: &TransportResponse, _ctx: &SessionContext) {
            self.completions.lock().unwrap().push(response.status);
        }
    }

    #[test]
    fn single_request_per_tick_in_registration_order() {
        let mut registry = StrategyRegistry::new();
        registry.register(Box::new(ScriptedStrategy::new(
            "a",
            vec![OutboundRequest::get("/a")],
        )));
        registry.register(Box::new(ScriptedStrategy::new(
            "b",
            vec![OutboundRequest::get("/b")],
        )));
        let ctx = SessionContext::new();
        let faults = RecordingFaultReporter::new();

        // A wins the first tick, B the second; never both in one call.
        let first = registry.next_request(&ctx, &faults).unwrap();
        assert_eq!(first.request.path, "/a");
        let second = registry.next_request(&ctx, &faults).unwrap();
        assert_eq!(second.request.path, "/b");
        assert!(registry.next_request(&ctx, &faults).is_none());
    }

    #[test]
    fn steady_state_is_no_request() {
        let mut registry = StrategyRegistry::new();
        registry.register(Box::new(ScriptedStrategy::new("idle", vec![])));
        let ctx = SessionContext::new();
        let faults = RecordingFaultReporter::new();

        for _ in 0..10 {
            assert!(registry.next_request(&ctx, &faults).is_none());
        }
    }

    #[test]
    fn failing_strategy_forfeits_its_tick_only() {
        let mut registry = StrategyRegistry::new();
        registry.register(Box::new(ScriptedStrategy::new("broken", vec![]).failing()));
        registry.register(Box::new(ScriptedStrategy::new(
            "healthy",
            vec![OutboundRequest::get("/ok")],
        )));
        let ctx = SessionContext::new();
        let faults = RecordingFaultReporter::new();

        let pending = registry.next_request(&ctx, &faults).unwrap();

        assert_eq!(pending.request.path, "/ok");
        assert_eq!(faults.records(), vec![FaultRecord::Strategy("broken".into())]);
    }

    #[test]
    fn completion_reaches_the_producing_strategy() {
        let mut registry = StrategyRegistry::new();
        let quiet = ScriptedStrategy::new("quiet", vec![]);
        let quiet_completions = Arc::clone(&quiet.completions);
        let producer = ScriptedStrategy::new("producer", vec![OutboundRequest::get("/x")]);
        let producer_completions = Arc::clone(&producer.completions);
        registry.register(Box::new(quiet));
        registry.register(Box::new(producer));
        let ctx = SessionContext::new();
        let faults = RecordingFaultReporter::new();

        let pending = registry.next_request(&ctx, &faults).unwrap();
        registry.complete(pending.token, &TransportResponse::ok(), &ctx);

        assert!(quiet_completions.lock().unwrap().is_empty());
        assert_eq!(*producer_completions.lock().unwrap(), vec![200]);
    }

    #[test]
    fn change_signals_reach_tracking_strategies_before_the_poll() {
        let mut registry = StrategyRegistry::new();
        let tracking = ScriptedStrategy::new("tracking", vec![]).tracking();
        let seen = Arc::clone(&tracking.signals_seen);
        let blind = ScriptedStrategy::new("blind", vec![]);
        let blind_seen = Arc::clone(&blind.signals_seen);
        registry.register(Box::new(tracking));
        registry.register(Box::new(blind));

        let ctx = SessionContext::new();
        ctx.edit_self_profile(|p| p.name = Some("x".into()));
        let faults = RecordingFaultReporter::new();

        registry.next_request(&ctx, &faults);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![vec![ChangeSignal::SelfProfile]]
        );
        assert!(blind_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn signals_are_delivered_once() {
        let mut registry = StrategyRegistry::new();
        let tracking = ScriptedStrategy::new("tracking", vec![]).tracking();
        let seen = Arc::clone(&tracking.signals_seen);
        registry.register(Box::new(tracking));

        let ctx = SessionContext::new();
        ctx.edit_self_profile(|p| p.name = Some("x".into()));
        let faults = RecordingFaultReporter::new();

        registry.next_request(&ctx, &faults);
        registry.next_request(&ctx, &faults);

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn completion_with_stale_token_is_ignored() {
        let mut registry = StrategyRegistry::new();
        registry.register(Box::new(ScriptedStrategy::new(
            "a",
            vec![OutboundRequest::get("/a")],
        )));
        let ctx = SessionContext::new();
        let faults = RecordingFaultReporter::new();
        let pending = registry.next_request(&ctx, &faults).unwrap();

        registry.clear();

        // Must not panic after the strategies were released.
        registry.complete(pending.token, &TransportResponse::ok(), &ctx);
        assert!(registry.is_empty());
    }
}
