//! The shared session state handle.
//!
//! One [`SessionContext`] is created per authenticated session and passed
//! into every component at construction. It replaces ambient shared state
//! with an explicit object: the self profile, the outgoing call-signal
//! queue, backlog-recovery bookkeeping, the hot-fix marker, and the
//! change-signal queue that wakes strategies when persisted state mutates.
//!
//! All mutation happens from within the single synchronization context, so
//! the lock is never contended in practice; it only makes the handle safe
//! to hand across task boundaries.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use quill_sync_types::{ConversationId, EventPosition, RawUpdateEvent, UserId};

/// The slice of the signed-in user's profile the sync engine cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfProfile {
    /// The signed-in user, once known.
    pub user: Option<UserId>,
    /// Display name.
    pub name: Option<String>,
    /// Unique handle.
    pub handle: Option<String>,
    /// A local edit has not been uploaded yet.
    pub needs_upload: bool,
}

impl SelfProfile {
    /// Whether the profile is complete enough for the session to proceed.
    pub fn is_complete(&self) -> bool {
        self.user.is_some() && self.name.is_some()
    }
}

/// An outbound calling-signaling payload queued for relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingCallSignal {
    /// The conversation the call belongs to.
    pub conversation: ConversationId,
    /// Opaque signaling blob produced by the calling pipeline.
    pub data: Vec<u8>,
}

/// A lightweight "this slice of state changed, re-evaluate" signal.
///
/// Enqueued when persisted session state mutates and drained at the start
/// of the next strategy poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSignal {
    /// The self profile changed.
    SelfProfile,
    /// The outgoing call-signal queue changed.
    Calling,
    /// Backlog recovery state changed.
    Backlog,
}

#[derive(Debug, Default)]
struct SessionState {
    profile: SelfProfile,
    call_signals: VecDeque<OutgoingCallSignal>,
    change_signals: VecDeque<ChangeSignal>,
    last_hotfix_version: u32,
    needs_backlog_fetch: bool,
    initial_sync_done: bool,
    last_processed: EventPosition,
    recovered_events: Vec<RawUpdateEvent>,
}

/// Cheap-to-clone handle to the shared session state.
#[derive(Debug, Default)]
pub struct SessionContext {
    inner: Arc<Mutex<SessionState>>,
}

impl Clone for SessionContext {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SessionContext {
    /// Create a fresh session context.
    pub fn new() -> Self {
        Self::default()
    }

    fn signal(state: &mut SessionState, signal: ChangeSignal) {
        // One pending signal per scope is enough to trigger a re-evaluation.
        if !state.change_signals.contains(&signal) {
            state.change_signals.push_back(signal);
        }
    }

    // --- self profile ---

    /// Snapshot of the current self profile.
    pub fn self_profile(&self) -> SelfProfile {
        self.inner.lock().unwrap().profile.clone()
    }

    /// Replace the profile with server-delivered data.
    ///
    /// Clears any pending upload: the server copy wins on fetch.
    pub fn set_self_profile(&self, user: UserId, name: Option<String>, handle: Option<String>) {
        let mut state = self.inner.lock().unwrap();
        state.profile = SelfProfile {
            user: Some(user),
            name,
            handle,
            needs_upload: false,
        };
        Self::signal(&mut state, ChangeSignal::SelfProfile);
    }

    /// Apply a local edit to the profile and mark it for upload.
    pub fn edit_self_profile(&self, edit: impl FnOnce(&mut SelfProfile)) {
        let mut state = self.inner.lock().unwrap();
        edit(&mut state.profile);
        state.profile.needs_upload = true;
        Self::signal(&mut state, ChangeSignal::SelfProfile);
    }

    /// Record that a pending profile upload reached the server.
    pub fn mark_profile_uploaded(&self) {
        self.inner.lock().unwrap().profile.needs_upload = false;
    }

    // --- calling ---

    /// Queue an outbound calling signal for relay.
    pub fn enqueue_call_signal(&self, signal: OutgoingCallSignal) {
        let mut state = self.inner.lock().unwrap();
        state.call_signals.push_back(signal);
        Self::signal(&mut state, ChangeSignal::Calling);
    }

    /// The next queued call signal, without removing it.
    pub fn peek_call_signal(&self) -> Option<OutgoingCallSignal> {
        self.inner.lock().unwrap().call_signals.front().cloned()
    }

    /// Remove and return the next queued call signal.
    pub fn pop_call_signal(&self) -> Option<OutgoingCallSignal> {
        self.inner.lock().unwrap().call_signals.pop_front()
    }

    /// Number of queued call signals.
    pub fn call_signal_count(&self) -> usize {
        self.inner.lock().unwrap().call_signals.len()
    }

    /// Drop all queued call signals.
    pub fn clear_call_signals(&self) {
        self.inner.lock().unwrap().call_signals.clear();
    }

    // --- change signals ---

    /// Drain all pending change signals, in enqueue order.
    pub fn take_change_signals(&self) -> Vec<ChangeSignal> {
        self.inner.lock().unwrap().change_signals.drain(..).collect()
    }

    // --- hot fixes ---

    /// The last hot-fix version applied in this session's store (0 = none).
    pub fn last_hotfix_version(&self) -> u32 {
        self.inner.lock().unwrap().last_hotfix_version
    }

    /// Record the hot-fix version the session is now at.
    pub fn set_last_hotfix_version(&self, version: u32) {
        self.inner.lock().unwrap().last_hotfix_version = version;
    }

    // --- backlog recovery ---

    /// Flag that the event backlog must be fetched from the server.
    pub fn request_backlog_fetch(&self) {
        let mut state = self.inner.lock().unwrap();
        state.needs_backlog_fetch = true;
        Self::signal(&mut state, ChangeSignal::Backlog);
    }

    /// Whether a backlog fetch is pending.
    pub fn needs_backlog_fetch(&self) -> bool {
        self.inner.lock().unwrap().needs_backlog_fetch
    }

    /// Record that a backlog fetch completed.
    ///
    /// Clears the pending flag and marks the first full synchronization
    /// done (sticky for the session).
    pub fn set_backlog_synced(&self) {
        let mut state = self.inner.lock().unwrap();
        state.needs_backlog_fetch = false;
        state.initial_sync_done = true;
    }

    /// Whether the first full synchronization has completed.
    pub fn initial_sync_done(&self) -> bool {
        self.inner.lock().unwrap().initial_sync_done
    }

    /// Stash events recovered via a backlog pull for the engine to process.
    pub fn store_recovered_events(&self, events: Vec<RawUpdateEvent>) {
        self.inner.lock().unwrap().recovered_events.extend(events);
    }

    /// Take all stashed recovered events, in arrival order.
    pub fn take_recovered_events(&self) -> Vec<RawUpdateEvent> {
        std::mem::take(&mut self.inner.lock().unwrap().recovered_events)
    }

    // --- decode cursor mirror ---

    /// The last contiguously processed event position.
    pub fn last_processed(&self) -> EventPosition {
        self.inner.lock().unwrap().last_processed
    }

    /// Mirror the decoder's contiguous position for strategies to read.
    pub fn set_last_processed(&self, position: EventPosition) {
        self.inner.lock().unwrap().last_processed = position;
    }
}
