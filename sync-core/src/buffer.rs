//! Update-event buffer for the Quill sync engine.
//!
//! This module provides the holding area for raw update events that arrive
//! while the engine is not ready to process them (before the first stream
//! establishment or during an interruption):
//! - FIFO ordering, preserved across buffering and draining
//! - Append-only while buffering; fully emptied by a drain
//! - No event is ever dropped; capacity is unbounded
//!
//! The full system backs this with persistent storage; the core treats it
//! as an ordered in-memory sequence.

use std::collections::VecDeque;
use quill_sync_types::RawUpdateEvent;

/// FIFO buffer for raw update events awaiting processing.
///
/// Events flow through the buffer in this order:
/// 1. `append()` while the stream is not established
/// 2. `drain()` once the engine is ready - removes everything, in
///    original arrival order
#[derive(Debug, Default)]
pub struct EventStreamBuffer {
    events: VecDeque<RawUpdateEvent>,
}

impl EventStreamBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, preserving arrival order. O(1) amortized.
    pub fn append(&mut self, event: RawUpdateEvent) {
        self.events.push_back(event);
    }

    /// Remove and return all buffered events in original arrival order.
    ///
    /// The buffer is empty afterwards. Safe to call on an empty buffer.
    pub fn drain(&mut self) -> Vec<RawUpdateEvent> {
        self.events.drain(..).collect()
    }

    /// Whether the buffer holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Discard all buffered events without processing them.
    ///
    /// Only used on teardown; a live engine never drops events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_sync_types::EventPosition;

    fn make_event(position: u64) -> RawUpdateEvent {
        RawUpdateEvent::new(EventPosition::new(position), vec![position as u8])
    }

    #[test]
    fn starts_empty() {
        let buffer = EventStreamBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn append_preserves_arrival_order() {
        let mut buffer = EventStreamBuffer::new();
        buffer.append(make_event(3));
        buffer.append(make_event(1));
        buffer.append(make_event(2));

        // Arrival order, not position order.
        let drained = buffer.drain();
        let positions: Vec<u64> = drained.iter().map(|e| e.position.value()).collect();
        assert_eq!(positions, vec![3, 1, 2]);
    }

    #[test]
    fn drain_empties_the_buffer() {
        let mut buffer = EventStreamBuffer::new();
        buffer.append(make_event(1));
        buffer.append(make_event(2));

        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_on_empty_is_a_no_op() {
        let mut buffer = EventStreamBuffer::new();
        assert!(buffer.drain().is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn append_after_drain_starts_fresh() {
        let mut buffer = EventStreamBuffer::new();
        buffer.append(make_event(1));
        buffer.drain();

        buffer.append(make_event(2));
        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].position, EventPosition::new(2));
    }

    #[test]
    fn no_event_is_dropped() {
        let mut buffer = EventStreamBuffer::new();
        for i in 0..1000 {
            buffer.append(make_event(i));
        }
        assert_eq!(buffer.len(), 1000);
        assert_eq!(buffer.drain().len(), 1000);
    }

    #[test]
    fn clear_discards_everything() {
        let mut buffer = EventStreamBuffer::new();
        buffer.append(make_event(1));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
