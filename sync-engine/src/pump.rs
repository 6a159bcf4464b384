//! Async driver that pumps engine requests through a transport.
//!
//! The engine itself is synchronous and transport-agnostic. [`SyncPump`]
//! is the thin async layer that repeatedly asks the engine for the next
//! outbound request, executes it over a [`Transport`], and routes the
//! response (or failure) back to the producing strategy.

use std::sync::Arc;

use tokio::sync::Mutex;

use quill_sync_types::TransportResponse;

use crate::engine::SyncEngine;
use crate::store::CursorStore;
use crate::transport::Transport;

/// Status substituted for a request the transport could not deliver.
/// Strategies treat it like any other failed response and retry on a
/// later tick.
const STATUS_TRANSPORT_FAILED: u16 = 503;

/// Drives a [`SyncEngine`] against a [`Transport`].
#[derive(Debug)]
pub struct SyncPump<S: CursorStore, T: Transport> {
    engine: Arc<Mutex<SyncEngine<S>>>,
    transport: T,
}

impl<S: CursorStore, T: Transport> SyncPump<S, T> {
    /// Wrap an engine and transport into a pump.
    pub fn new(engine: Arc<Mutex<SyncEngine<S>>>, transport: T) -> Self {
        Self { engine, transport }
    }

    /// Run one scheduling tick.
    ///
    /// Returns `Ok(true)` when a request was executed and completed,
    /// `Ok(false)` when no strategy had work. The engine lock is released
    /// while the request is in flight, so incoming events keep flowing.
    pub async fn tick(&mut self) -> bool {
        let pending = {
            let mut engine = self.engine.lock().await;
            engine.next_request()
        };
        let Some(pending) = pending else {
            return false;
        };

        let response = match self.transport.execute(&pending.request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(path = %pending.request.path, "transport failed: {err}");
                TransportResponse::error(STATUS_TRANSPORT_FAILED)
            }
        };

        let mut engine = self.engine.lock().await;
        engine.did_complete_request(pending.token, response);
        true
    }

    /// Tick until no strategy has work, up to an iteration cap.
    ///
    /// Returns the number of requests executed. The cap guards against a
    /// strategy that keeps producing against a persistently failing
    /// endpoint.
    pub async fn run_until_idle(&mut self) -> usize {
        const MAX_TICKS: usize = 100;
        let mut executed = 0;
        while executed < MAX_TICKS {
            if !self.tick().await {
                break;
            }
            executed += 1;
        }
        executed
    }

    /// Handle to the engine driving this pump.
    pub fn engine(&self) -> Arc<Mutex<SyncEngine<S>>> {
        Arc::clone(&self.engine)
    }
}
