//! Recovers update events missed while the stream was down.
//!
//! When the session context flags a pending backlog fetch (first full sync,
//! or catch-up after an interruption), this strategy pulls the events after
//! the last contiguously processed position. The recovered raw events are
//! stashed on the context for the engine to run through the ordinary
//! decode-and-dispatch path, where duplicate suppression protects against
//! overlap with streamed events. A successful pull marks the first full
//! synchronization done.

use quill_sync_types::{OutboundRequest, RawUpdateEvent, TransportResponse};

use crate::context::{ChangeSignal, SessionContext};
use crate::strategy::{StrategyError, SyncStrategy};

/// Sync strategy for backlog recovery.
#[derive(Debug)]
pub struct MissingEventsStrategy {
    batch_size: u32,
    in_flight: bool,
    needs_evaluation: bool,
}

impl MissingEventsStrategy {
    /// Create the strategy with the configured pull batch size.
    pub fn new(batch_size: u32) -> Self {
        Self {
            batch_size,
            in_flight: false,
            needs_evaluation: true,
        }
    }
}

impl SyncStrategy for MissingEventsStrategy {
    fn name(&self) -> &str {
        "missing-events"
    }

    fn tracks_context_changes(&self) -> bool {
        true
    }

    fn context_did_change(&mut self, signals: &[ChangeSignal], _ctx: &SessionContext) {
        if signals.contains(&ChangeSignal::Backlog) {
            self.needs_evaluation = true;
        }
    }

    fn next_request(
        &mut self,
        ctx: &SessionContext,
    ) -> Result<Option<OutboundRequest>, StrategyError> {
        if self.in_flight || !self.needs_evaluation {
            return Ok(None);
        }

        if ctx.needs_backlog_fetch() {
            self.in_flight = true;
            return Ok(Some(OutboundRequest::get(format!(
                "/notifications?since={}&size={}",
                ctx.last_processed(),
                self.batch_size
            ))));
        }

        self.needs_evaluation = false;
        Ok(None)
    }

    fn did_complete_request(&mut self, response: &TransportResponse, ctx: &SessionContext) {
        self.in_flight = false;
        self.needs_evaluation = true;

        if !response.is_success() {
            // The fetch flag stays set; the next poll offers the pull again.
            tracing::debug!("backlog pull failed with status {}", response.status);
            return;
        }

        match response.payload.as_deref() {
            Some(body) => match rmp_serde::from_slice::<Vec<RawUpdateEvent>>(body) {
                Ok(events) => {
                    tracing::debug!("recovered {} events from backlog", events.len());
                    ctx.store_recovered_events(events);
                    ctx.set_backlog_synced();
                }
                Err(error) => {
                    // Undecodable backlog: keep the flag set and retry.
                    tracing::warn!("undecodable backlog payload: {}", error);
                }
            },
            // An empty body means there was nothing to catch up on.
            None => ctx.set_backlog_synced(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_sync_types::EventPosition;

    fn backlog_response(positions: &[u64]) -> TransportResponse {
        let events: Vec<RawUpdateEvent> = positions
            .iter()
            .map(|&p| RawUpdateEvent::new(EventPosition::new(p), vec![p as u8]))
            .collect();
        TransportResponse::ok_with(rmp_serde::to_vec(&events).unwrap())
    }

    #[test]
    fn pulls_after_the_processed_position() {
        let ctx = SessionContext::new();
        ctx.set_last_processed(EventPosition::new(41));
        ctx.request_backlog_fetch();
        let mut strategy = MissingEventsStrategy::new(50);

        let request = strategy.next_request(&ctx).unwrap().unwrap();

        assert_eq!(request.path, "/notifications?since=41&size=50");
    }

    #[test]
    fn idle_without_a_pending_fetch() {
        let ctx = SessionContext::new();
        let mut strategy = MissingEventsStrategy::new(50);

        assert!(strategy.next_request(&ctx).unwrap().is_none());
    }

    #[test]
    fn one_pull_in_flight_at_a_time() {
        let ctx = SessionContext::new();
        ctx.request_backlog_fetch();
        let mut strategy = MissingEventsStrategy::new(50);

        strategy.next_request(&ctx).unwrap().unwrap();
        assert!(strategy.next_request(&ctx).unwrap().is_none());
    }

    #[test]
    fn successful_pull_stashes_events_and_finishes_initial_sync() {
        let ctx = SessionContext::new();
        ctx.request_backlog_fetch();
        let mut strategy = MissingEventsStrategy::new(50);
        strategy.next_request(&ctx).unwrap().unwrap();

        strategy.did_complete_request(&backlog_response(&[1, 2, 3]), &ctx);

        assert_eq!(ctx.take_recovered_events().len(), 3);
        assert!(!ctx.needs_backlog_fetch());
        assert!(ctx.initial_sync_done());
    }

    #[test]
    fn empty_backlog_still_finishes_initial_sync() {
        let ctx = SessionContext::new();
        ctx.request_backlog_fetch();
        let mut strategy = MissingEventsStrategy::new(50);
        strategy.next_request(&ctx).unwrap().unwrap();

        strategy.did_complete_request(&TransportResponse::ok(), &ctx);

        assert!(ctx.take_recovered_events().is_empty());
        assert!(ctx.initial_sync_done());
    }

    #[test]
    fn failed_pull_is_offered_again() {
        let ctx = SessionContext::new();
        ctx.request_backlog_fetch();
        let mut strategy = MissingEventsStrategy::new(50);
        strategy.next_request(&ctx).unwrap().unwrap();

        strategy.did_complete_request(&TransportResponse::error(500), &ctx);

        assert!(ctx.needs_backlog_fetch());
        assert!(strategy.next_request(&ctx).unwrap().is_some());
    }

    #[test]
    fn wakes_on_backlog_signal() {
        let ctx = SessionContext::new();
        let mut strategy = MissingEventsStrategy::new(50);

        assert!(strategy.next_request(&ctx).unwrap().is_none());

        ctx.request_backlog_fetch();
        strategy.context_did_change(&ctx.take_change_signals(), &ctx);

        assert!(strategy.next_request(&ctx).unwrap().is_some());
    }
}
