//! The synchronization orchestrator.
//!
//! [`SyncEngine`] composes the buffer, decoder, consumer registry, strategy
//! registry, state controller and hot-fix applier into the long-lived state
//! machine the session drives:
//!
//! - raw events arrive via [`process_update_events`](SyncEngine::process_update_events)
//!   and are either buffered (stream down) or decoded and dispatched
//! - stream lifecycle callbacks replay the buffered backlog in arrival order
//! - [`next_request`](SyncEngine::next_request) pulls at most one outbound
//!   request per tick from the strategies, in registration order
//!
//! One engine exists per authenticated session. Every public operation
//! checks the lifecycle gate first: after [`tear_down`](SyncEngine::tear_down)
//! everything becomes a no-op, never an error.

use thiserror::Error;

use quill_sync_core::{EventStreamBuffer, StreamAction, StreamInput, StreamState, SyncStateController};
use quill_sync_types::{RawUpdateEvent, TransportResponse};

use crate::config::SyncConfig;
use crate::consumer::{ConsumerRegistry, EventConsumer};
use crate::context::SessionContext;
use crate::decoder::EventDecoder;
use crate::fault::{FaultReporter, LogFaultReporter};
use crate::hotfix::{HotFix, HotFixApplier, PurgeStaleCallSignals};
use crate::store::{CursorStore, StoreError};
use crate::strategies::{
    CallingStrategy, DeviceRegistrationStrategy, MissingEventsStrategy, SelfProfileStrategy,
};
use crate::strategy::{PendingRequest, RequestToken, StrategyRegistry, SyncStrategy};

/// Engine construction errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The durable decode cursor could not be loaded.
    #[error("cursor store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Active,
    TornDown,
}

/// The client-side synchronization orchestrator.
pub struct SyncEngine<S: CursorStore> {
    lifecycle: Lifecycle,
    config: SyncConfig,
    ctx: SessionContext,
    controller: SyncStateController,
    buffer: EventStreamBuffer,
    decoder: EventDecoder<S>,
    consumers: ConsumerRegistry,
    strategies: StrategyRegistry,
    hotfixes: HotFixApplier,
    faults: Box<dyn FaultReporter>,
}

impl<S: CursorStore> SyncEngine<S> {
    /// Create an engine for a fresh session.
    ///
    /// The decode cursor resumes from the store's persisted position.
    /// Consumers and strategies are registered afterwards, before the
    /// session starts driving the engine; they are never re-registered.
    pub fn new(config: SyncConfig, ctx: SessionContext, store: S) -> Result<Self, EngineError> {
        let decoder = EventDecoder::new(store)?;
        ctx.set_last_processed(decoder.cursor().contiguous());

        let mut hotfixes = HotFixApplier::new(config.hotfix_version);
        hotfixes.register(Box::new(PurgeStaleCallSignals));

        Ok(Self {
            lifecycle: Lifecycle::Active,
            config,
            ctx,
            controller: SyncStateController::new(),
            buffer: EventStreamBuffer::new(),
            decoder,
            consumers: ConsumerRegistry::new(),
            strategies: StrategyRegistry::new(),
            hotfixes,
            faults: Box::new(LogFaultReporter),
        })
    }

    /// Replace the fault reporter (default: tracing-backed).
    pub fn with_fault_reporter(mut self, faults: Box<dyn FaultReporter>) -> Self {
        self.faults = faults;
        self
    }

    /// Register a consumer. Dispatch order is registration order.
    pub fn register_consumer(&mut self, consumer: Box<dyn EventConsumer>) {
        if self.is_torn_down() {
            return;
        }
        self.consumers.register(consumer);
    }

    /// Register a strategy. Earlier registrations get first claim on the
    /// network each tick.
    pub fn register_strategy(&mut self, strategy: Box<dyn SyncStrategy>) {
        if self.is_torn_down() {
            return;
        }
        self.strategies.register(strategy);
    }

    /// Register the stock strategy set: device registration first, then
    /// missing-events recovery, self profile, and calling relay.
    pub fn register_default_strategies(&mut self) {
        self.register_strategy(Box::new(DeviceRegistrationStrategy::new(
            self.config.device_name.clone(),
        )));
        self.register_strategy(Box::new(MissingEventsStrategy::new(
            self.config.pull_batch_size,
        )));
        self.register_strategy(Box::new(SelfProfileStrategy::new()));
        self.register_strategy(Box::new(CallingStrategy::new()));
    }

    /// Register an additional hot fix.
    pub fn register_hotfix(&mut self, fix: Box<dyn HotFix>) {
        if self.is_torn_down() {
            return;
        }
        self.hotfixes.register(fix);
    }

    // --- incoming events ---

    /// Hand raw update events from the transport into the engine.
    ///
    /// While the engine is not ready to process (stream never established,
    /// or interrupted), events are buffered in arrival order; otherwise
    /// they are decoded and dispatched immediately.
    pub fn process_update_events(&mut self, events: Vec<RawUpdateEvent>) {
        if self.is_torn_down() || events.is_empty() {
            return;
        }

        if self.controller.is_ready_to_process_events() {
            self.decode_and_dispatch(&events);
        } else {
            tracing::debug!("buffering {} events while stream is down", events.len());
            for event in events {
                self.buffer.append(event);
            }
        }
    }

    // --- stream lifecycle ---

    /// The transport established (or re-established) the update-event
    /// stream.
    ///
    /// Drains the buffer in arrival order, marks the engine ready to
    /// process, notifies consumers that continuity is restored, and flags
    /// a backlog fetch so the missing-events strategy catches up on
    /// anything the stream never delivered.
    pub fn did_establish_update_events_stream(&mut self) {
        if self.is_torn_down() {
            return;
        }
        let actions = self.controller.handle(StreamInput::StreamEstablished);
        self.run_stream_actions(actions);
    }

    /// The transport lost the update-event stream.
    ///
    /// Subsequent raw events are buffered instead of processed; strategies
    /// may still be polled for unrelated outbound requests.
    pub fn did_interrupt_update_events_stream(&mut self) {
        if self.is_torn_down() {
            return;
        }
        let actions = self.controller.handle(StreamInput::StreamInterrupted);
        self.run_stream_actions(actions);
    }

    /// Explicitly flush the event buffer, regardless of stream state.
    ///
    /// The same drain the establish path performs; idempotent and safe to
    /// call on an empty buffer.
    pub fn process_all_events_in_buffer(&mut self) {
        if self.is_torn_down() {
            return;
        }
        self.drain_buffer();
    }

    fn run_stream_actions(&mut self, actions: Vec<StreamAction>) {
        for action in actions {
            match action {
                StreamAction::DrainBuffer => self.drain_buffer(),
                StreamAction::MarkReadyToProcess => self.controller.mark_ready_to_process(),
                StreamAction::NotifyContinuityRestored => {
                    self.consumers.notify_continuity_restored();
                    self.ctx.request_backlog_fetch();
                }
                StreamAction::SuspendEventProcessing => {
                    self.controller.suspend_event_processing();
                }
            }
        }
    }

    fn drain_buffer(&mut self) {
        let raw = self.buffer.drain();
        if raw.is_empty() {
            return;
        }
        tracing::debug!("draining {} buffered events", raw.len());
        self.decode_and_dispatch(&raw);
    }

    fn decode_and_dispatch(&mut self, raw: &[RawUpdateEvent]) {
        let decoded = self.decoder.decode_batch(raw, self.faults.as_ref());
        self.ctx.set_last_processed(self.decoder.cursor().contiguous());
        self.consumers.dispatch(&decoded, self.faults.as_ref());
    }

    // --- request scheduling ---

    /// One scheduling tick: the next outbound request, if any strategy has
    /// one.
    ///
    /// Returns immediately; a strategy with nothing to do answers "no
    /// request". After teardown this always returns `None`.
    pub fn next_request(&mut self) -> Option<PendingRequest> {
        if self.is_torn_down() {
            return None;
        }
        self.strategies.next_request(&self.ctx, self.faults.as_ref())
    }

    /// The transport finished a request; route the response to the
    /// producing strategy.
    ///
    /// If the completion recovered backlog events, they are run through the
    /// ordinary decode-and-dispatch path here, where duplicate suppression
    /// protects against overlap with streamed events.
    pub fn did_complete_request(&mut self, token: RequestToken, response: TransportResponse) {
        if self.is_torn_down() {
            return;
        }
        self.strategies.complete(token, &response, &self.ctx);

        let recovered = self.ctx.take_recovered_events();
        if !recovered.is_empty() {
            self.decode_and_dispatch(&recovered);
        }

        if self.ctx.initial_sync_done() && !self.controller.initial_sync_done() {
            tracing::debug!("first full synchronization completed");
            self.controller.finish_initial_sync();
        }
    }

    // --- hot fixes ---

    /// Apply pending hot fixes, once per version transition.
    pub fn apply_hot_fixes(&mut self) {
        if self.is_torn_down() {
            return;
        }
        self.hotfixes.apply_all(&self.ctx);
    }

    // --- lifecycle ---

    /// Tear the engine down: release strategies, consumers and the buffer,
    /// in the reverse of construction order.
    ///
    /// Idempotent; every subsequent operation becomes a no-op.
    pub fn tear_down(&mut self) {
        if self.is_torn_down() {
            return;
        }
        tracing::debug!("tearing down sync engine");
        self.lifecycle = Lifecycle::TornDown;
        self.strategies.clear();
        self.consumers.clear();
        self.buffer.clear();
    }

    fn is_torn_down(&self) -> bool {
        self.lifecycle == Lifecycle::TornDown
    }

    // --- accessors ---

    /// Current stream state.
    pub fn stream_state(&self) -> StreamState {
        self.controller.stream_state()
    }

    /// Whether incoming events are processed immediately rather than
    /// buffered.
    pub fn is_ready_to_process_events(&self) -> bool {
        self.controller.is_ready_to_process_events()
    }

    /// Whether the first full synchronization has completed.
    pub fn initial_sync_done(&self) -> bool {
        self.controller.initial_sync_done()
    }

    /// The shared session context.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }
}

impl<S: CursorStore> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("lifecycle", &self.lifecycle)
            .field("stream_state", &self.controller.stream_state())
            .field("buffered", &self.buffer.len())
            .field("consumers", &self.consumers.len())
            .field("strategies", &self.strategies.len())
            .finish()
    }
}
