//! Relays outbound calling-signaling payloads to the server.
//!
//! The calling pipeline enqueues opaque signaling blobs on the session
//! context; this strategy offers them to the transport one per tick, in
//! queue order. A signal stays queued until its relay succeeds, so a
//! transport failure just means the same signal is offered again.

use quill_sync_types::{OutboundRequest, TransportResponse};

use crate::context::{ChangeSignal, SessionContext};
use crate::strategy::{StrategyError, SyncStrategy};

/// Sync strategy for calling signaling relay.
#[derive(Debug, Default)]
pub struct CallingStrategy {
    in_flight: bool,
    needs_evaluation: bool,
}

impl CallingStrategy {
    /// Create the strategy; the first poll checks for queued signals.
    pub fn new() -> Self {
        Self {
            in_flight: false,
            needs_evaluation: true,
        }
    }
}

impl SyncStrategy for CallingStrategy {
    fn name(&self) -> &str {
        "calling"
    }

    fn tracks_context_changes(&self) -> bool {
        true
    }

    fn context_did_change(&mut self, signals: &[ChangeSignal], _ctx: &SessionContext) {
        if signals.contains(&ChangeSignal::Calling) {
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

        match ctx.peek_call_signal() {
            Some(signal) => {
                self.in_flight = true;
                Ok(Some(OutboundRequest::post(
                    format!("/conversations/{}/call-signal", signal.conversation),
                    signal.data,
                )))
            }
            None => {
                self.needs_evaluation = false;
                Ok(None)
            }
        }
    }

    fn did_complete_request(&mut self, response: &TransportResponse, ctx: &SessionContext) {
        self.in_flight = false;
        self.needs_evaluation = true;

        if response.is_success() {
            // The relayed signal was the queue head; drop it.
            ctx.pop_call_signal();
        } else {
            tracing::debug!(
                "call-signal relay failed with status {}, will re-offer",
                response.status
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OutgoingCallSignal;
    use quill_sync_types::ConversationId;

    fn queue_signal(ctx: &SessionContext, data: Vec<u8>) -> ConversationId {
        let conversation = ConversationId::new();
        ctx.enqueue_call_signal(OutgoingCallSignal { conversation, data });
        conversation
    }

    #[test]
    fn relays_queued_signal() {
        let ctx = SessionContext::new();
        let conversation = queue_signal(&ctx, vec![1, 2, 3]);
        let mut strategy = CallingStrategy::new();

        let request = strategy.next_request(&ctx).unwrap().unwrap();

        assert_eq!(
            request.path,
            format!("/conversations/{}/call-signal", conversation)
        );
        assert_eq!(request.payload, Some(vec![1, 2, 3]));
    }

    #[test]
    fn one_signal_per_tick() {
        let ctx = SessionContext::new();
        queue_signal(&ctx, vec![1]);
        queue_signal(&ctx, vec![2]);
        let mut strategy = CallingStrategy::new();

        strategy.next_request(&ctx).unwrap().unwrap();
        // Second signal waits for the first relay to complete.
        assert!(strategy.next_request(&ctx).unwrap().is_none());

        strategy.did_complete_request(&TransportResponse::ok(), &ctx);
        let second = strategy.next_request(&ctx).unwrap().unwrap();
        assert_eq!(second.payload, Some(vec![2]));
    }

    #[test]
    fn success_consumes_the_signal() {
        let ctx = SessionContext::new();
        queue_signal(&ctx, vec![1]);
        let mut strategy = CallingStrategy::new();
        strategy.next_request(&ctx).unwrap().unwrap();

        strategy.did_complete_request(&TransportResponse::ok(), &ctx);

        assert_eq!(ctx.call_signal_count(), 0);
        assert!(strategy.next_request(&ctx).unwrap().is_none());
    }

    #[test]
    fn failure_keeps_the_signal_queued() {
        let ctx = SessionContext::new();
        queue_signal(&ctx, vec![1]);
        let mut strategy = CallingStrategy::new();
        strategy.next_request(&ctx).unwrap().unwrap();

        strategy.did_complete_request(&TransportResponse::error(503), &ctx);

        assert_eq!(ctx.call_signal_count(), 1);
        let retry = strategy.next_request(&ctx).unwrap().unwrap();
        assert_eq!(retry.payload, Some(vec![1]));
    }

    #[test]
    fn wakes_on_calling_signal() {
        let ctx = SessionContext::new();
        let mut strategy = CallingStrategy::new();

        // Empty queue: strategy goes quiet.
        assert!(strategy.next_request(&ctx).unwrap().is_none());

        queue_signal(&ctx, vec![9]);
        strategy.context_did_change(&ctx.take_change_signals(), &ctx);

        assert!(strategy.next_request(&ctx).unwrap().is_some());
    }
}
