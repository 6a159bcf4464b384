//! Stream lifecycle state machine for the Quill sync engine.
//!
//! This module provides a pure, side-effect-free state machine for the
//! update-event stream lifecycle. The state machine takes inputs as they
//! arrive from the transport and produces a new state plus a list of
//! actions to execute.
//!
//! The actual work (draining the buffer, notifying consumers) is performed
//! by sync-engine, not by this module. This enables instant unit testing
//! without network mocks.

/// Update-event stream state - NO I/O, just state transitions.
///
/// Lifecycle: `NotReady → Established ⇄ Interrupted`. The stream starts
/// `NotReady` when the session is created and becomes `Established` once
/// the transport reports a live update-event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No update-event stream has been established yet.
    NotReady,
    /// The stream was established and then lost.
    Interrupted,
    /// The stream is live; events are processed as they arrive.
    Established,
}

impl StreamState {
    /// Create a new state machine in the NotReady state.
    pub fn new() -> Self {
        Self::NotReady
    }

    /// Process an input and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-engine)
    /// is responsible for executing the returned actions in order.
    pub fn on_input(self, input: StreamInput) -> (Self, Vec<StreamAction>) {
        match (self, input) {
            // Establishment from either offline state: drain the backlog
            // first, only then report readiness and continuity.
            (Self::NotReady | Self::Interrupted, StreamInput::StreamEstablished) => (
                Self::Established,
                vec![
                    StreamAction::DrainBuffer,
                    StreamAction::MarkReadyToProcess,
                    StreamAction::NotifyContinuityRestored,
                ],
            ),

            (Self::Established, StreamInput::StreamInterrupted) => (
                Self::Interrupted,
                vec![StreamAction::SuspendEventProcessing],
            ),

            // Redundant notifications - stay in current state.
            (state, _) => (state, vec![]),
        }
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs to the stream lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamInput {
    /// The transport established (or re-established) the update-event stream.
    StreamEstablished,
    /// The transport lost the update-event stream.
    StreamInterrupted,
}

/// Actions to be executed by sync-engine.
///
/// These are instructions, not side effects. The engine interprets them
/// in order and performs the actual work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAction {
    /// Decode and dispatch every buffered event, in arrival order.
    DrainBuffer,
    /// Mark the engine ready to process events as they arrive.
    MarkReadyToProcess,
    /// Tell registered consumers that stream continuity is restored.
    NotifyContinuityRestored,
    /// Stop processing incoming events; buffer them instead.
    SuspendEventProcessing,
}

/// Tracks the stream lifecycle together with the engine-level sync flags.
///
/// The controller owns the [`StreamState`] machine plus two flags the
/// orchestrator consults on every operation:
/// - `ready_to_process`: true once an establish-drain has completed; gates
///   whether incoming events are processed immediately or buffered.
/// - `initial_sync_done`: true once the first full backlog download has
///   completed for this session.
#[derive(Debug, Clone, Default)]
pub struct SyncStateController {
    stream: StreamState,
    ready_to_process: bool,
    initial_sync_done: bool,
}

impl SyncStateController {
    /// Create a controller in the NotReady state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a stream lifecycle input through the state machine.
    ///
    /// Transitions the stream state and returns the actions the engine must
    /// execute. Flag changes ([`StreamAction::MarkReadyToProcess`],
    /// [`StreamAction::SuspendEventProcessing`]) are applied by the engine
    /// via [`mark_ready_to_process`](Self::mark_ready_to_process) and
    /// [`suspend_event_processing`](Self::suspend_event_processing) at the
    /// right point in the action sequence, not here.
    pub fn handle(&mut self, input: StreamInput) -> Vec<StreamAction> {
        let (next, actions) = self.stream.on_input(input);
        self.stream = next;
        actions
    }

    /// Current stream state.
    pub fn stream_state(&self) -> StreamState {
        self.stream
    }

    /// Whether events may be processed immediately rather than buffered.
    pub fn is_ready_to_process_events(&self) -> bool {
        self.ready_to_process
    }

    /// Mark the engine ready to process events as they arrive.
    pub fn mark_ready_to_process(&mut self) {
        self.ready_to_process = true;
    }

    /// Suspend immediate processing; incoming events get buffered.
    pub fn suspend_event_processing(&mut self) {
        self.ready_to_process = false;
    }

    /// Whether the first full synchronization has completed.
    pub fn initial_sync_done(&self) -> bool {
        self.initial_sync_done
    }

    /// Record that the first full synchronization completed.
    ///
    /// Sticky for the lifetime of the session.
    pub fn finish_initial_sync(&mut self) {
        self.initial_sync_done = true;
    }
}
