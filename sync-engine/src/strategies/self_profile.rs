//! Keeps the signed-in user's profile in sync with the server.
//!
//! Two directions, one request in flight at a time: an incomplete profile
//! is fetched (`GET /self`), a locally edited profile is uploaded
//! (`PUT /self`). The readiness predicate
//! [`is_self_profile_complete`](SelfProfileStrategy::is_self_profile_complete)
//! is consumed by gating logic outside the engine.

use serde::{Deserialize, Serialize};

use quill_sync_types::{OutboundRequest, TransportResponse, UserId};

use crate::context::{ChangeSignal, SessionContext};
use crate::strategy::{StrategyError, SyncStrategy};

/// Wire payload of `GET /self` and `PUT /self` (MessagePack).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfProfilePayload {
    /// The signed-in user.
    pub user: UserId,
    /// Display name.
    pub name: Option<String>,
    /// Unique handle.
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Fetch,
    Upload,
}

/// Sync strategy for the self profile.
#[derive(Debug, Default)]
pub struct SelfProfileStrategy {
    in_flight: Option<InFlight>,
    needs_evaluation: bool,
}

impl SelfProfileStrategy {
    /// Create the strategy; the first poll evaluates the persisted profile.
    pub fn new() -> Self {
        Self {
            in_flight: None,
            needs_evaluation: true,
        }
    }

    /// Whether the self profile is complete enough for the session.
    pub fn is_self_profile_complete(&self, ctx: &SessionContext) -> bool {
        ctx.self_profile().is_complete()
    }
}

impl SyncStrategy for SelfProfileStrategy {
    fn name(&self) -> &str {
        "self-profile"
    }

    fn tracks_context_changes(&self) -> bool {
        true
    }

    fn context_did_change(&mut self, signals: &[ChangeSignal], _ctx: &SessionContext) {
        if signals.contains(&ChangeSignal::SelfProfile) {
            self.needs_evaluation = true;
        }
    }

    fn next_request(
        &mut self,
        ctx: &SessionContext,
    ) -> Result<Option<OutboundRequest>, StrategyError> {
        if self.in_flight.is_some() || !self.needs_evaluation {
            return Ok(None);
        }

        let profile = ctx.self_profile();
        if !profile.is_complete() {
            self.in_flight = Some(InFlight::Fetch);
            return Ok(Some(OutboundRequest::get("/self")));
        }

        if profile.needs_upload {
            let payload = SelfProfilePayload {
                // is_complete() above guarantees the user is set.
                user: profile.user.ok_or_else(|| {
                    StrategyError::Failed("profile marked complete without a user".into())
                })?,
                name: profile.name,
                handle: profile.handle,
            };
            let body = rmp_serde::to_vec(&payload)
                .map_err(|e| StrategyError::Failed(format!("encoding profile upload: {}", e)))?;
            self.in_flight = Some(InFlight::Upload);
            return Ok(Some(OutboundRequest::put("/self", body)));
        }

        self.needs_evaluation = false;
        Ok(None)
    }

    fn did_complete_request(&mut self, response: &TransportResponse, ctx: &SessionContext) {
        let in_flight = self.in_flight.take();
        // Re-evaluate next tick: success changed the profile, failure means
        // the same request should be offered again. The transport owns
        // retry timing.
        self.needs_evaluation = true;

        if !response.is_success() {
            tracing::debug!("self-profile request failed with status {}", response.status);
            return;
        }

        match in_flight {
            Some(InFlight::Fetch) => {
                let Some(body) = response.payload.as_deref() else {
                    // Re-fetching would get the same empty answer; quiesce
                    // until a change signal re-triggers evaluation.
                    tracing::warn!("self-profile fetch succeeded without a body");
                    self.needs_evaluation = false;
                    return;
                };
                match rmp_serde::from_slice::<SelfProfilePayload>(body) {
                    Ok(payload) => {
                        ctx.set_self_profile(payload.user, payload.name, payload.handle);
                    }
                    Err(error) => {
                        tracing::warn!("undecodable self-profile payload: {}", error);
                        self.needs_evaluation = false;
                    }
                }
            }
            Some(InFlight::Upload) => {
                ctx.mark_profile_uploaded();
            }
            None => {}
        }
    }
}
