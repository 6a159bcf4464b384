//! Decode-cursor tracking for the Quill sync engine.
//!
//! This module tracks which update-event positions have been processed:
//! - Recording the highest position successfully processed so streaming can
//!   resume after a restart without re-applying events
//! - Suppressing duplicates when the server re-delivers events
//! - Detecting gaps in the position sequence (missed events), which feed
//!   the missing-events recovery strategy
//!
//! Positions are monotonically increasing integers assigned by the server.

use std::collections::BTreeSet;
use quill_sync_types::EventPosition;

/// Tracks processed event positions and detects gaps.
///
/// The cursor maintains:
/// - The last contiguous position (everything up to it was processed)
/// - A set of processed positions above the contiguous point
///
/// Durability is the engine's business: the cursor itself is pure, and the
/// engine writes [`contiguous`](Self::contiguous) through to the cursor
/// store after each batch.
#[derive(Debug, Clone, Default)]
pub struct EventCursor {
    /// Processed positions above the contiguous point.
    processed: BTreeSet<u64>,
    /// The last contiguous position (no gaps up to this point).
    contiguous: u64,
}

impl EventCursor {
    /// Create a cursor with nothing processed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cursor resuming from a persisted position.
    ///
    /// Everything up to and including `position` counts as processed.
    pub fn resume_from(position: EventPosition) -> Self {
        Self {
            processed: BTreeSet::new(),
            contiguous: position.value(),
        }
    }

    /// Whether the given position was already processed.
    ///
    /// The decoder consults this before decoding so a re-delivered event is
    /// decoded and dispatched at most once.
    pub fn is_processed(&self, position: EventPosition) -> bool {
        let value = position.value();
        value <= self.contiguous || self.processed.contains(&value)
    }

    /// Record that the event at `position` was processed.
    pub fn mark_processed(&mut self, position: EventPosition) {
        let value = position.value();
        if value > self.contiguous {
            self.processed.insert(value);
            self.advance_contiguous();
        }
    }

    /// The highest position processed so far.
    pub fn highest_processed(&self) -> EventPosition {
        self.processed
            .last()
            .map(|&v| EventPosition::new(v))
            .unwrap_or_else(|| EventPosition::new(self.contiguous))
    }

    /// The last contiguous position (no gaps up to this point).
    ///
    /// This is what gets persisted, and what backlog recovery pulls after:
    /// everything up to it has been applied.
    pub fn contiguous(&self) -> EventPosition {
        EventPosition::new(self.contiguous)
    }

    /// Whether there are gaps between the contiguous point and the highest
    /// processed position.
    pub fn has_gaps(&self) -> bool {
        !self.processed.is_empty()
    }

    /// Maximum gap size before we stop enumerating missing positions.
    /// Prevents OOM if a misbehaving server reports a huge position jump.
    const MAX_GAP: u64 = 10_000;

    /// The positions between the contiguous point and the highest processed
    /// position that were never processed.
    ///
    /// Returns empty if the gap exceeds `MAX_GAP`; recovery then falls back
    /// to a full pull after the contiguous position.
    pub fn missing(&self) -> Vec<EventPosition> {
        let Some(&max_processed) = self.processed.last() else {
            return Vec::new();
        };

        if max_processed.saturating_sub(self.contiguous) > Self::MAX_GAP {
            return Vec::new();
        }

        let mut missing = Vec::new();
        for position in (self.contiguous + 1)..=max_processed {
            if !self.processed.contains(&position) {
                missing.push(EventPosition::new(position));
            }
        }
        missing
    }

    /// Acknowledge that everything up to `position` has been applied.
    ///
    /// Called after a backlog pull fills the gaps server-side.
    pub fn acknowledge_up_to(&mut self, position: EventPosition) {
        let value = position.value();
        self.processed.retain(|&p| p > value);
        if value > self.contiguous {
            self.contiguous = value;
        }
        self.advance_contiguous();
    }

    /// Advance the contiguous point through the processed set.
    fn advance_contiguous(&mut self) {
        let mut next = self.contiguous + 1;
        while self.processed.remove(&next) {
            self.contiguous = next;
            next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let cursor = EventCursor::new();
        assert_eq!(cursor.highest_processed(), EventPosition::zero());
        assert!(!cursor.has_gaps());
    }

    #[test]
    fn marks_and_reports_processed() {
        let mut cursor = EventCursor::new();

        cursor.mark_processed(EventPosition::new(1));

        assert!(cursor.is_processed(EventPosition::new(1)));
        assert!(!cursor.is_processed(EventPosition::new(2)));
    }

    #[test]
    fn detects_gaps() {
        let mut cursor = EventCursor::new();

        cursor.mark_processed(EventPosition::new(1));
        cursor.mark_processed(EventPosition::new(2));
        cursor.mark_processed(EventPosition::new(5)); // Gap: 3, 4 missing

        assert!(cursor.has_gaps());
        assert_eq!(
            cursor.missing(),
            vec![EventPosition::new(3), EventPosition::new(4)]
        );
    }

    #[test]
    fn contiguous_advances_through_fills() {
        let mut cursor = EventCursor::new();

        cursor.mark_processed(EventPosition::new(1));
        cursor.mark_processed(EventPosition::new(2));
        assert_eq!(cursor.contiguous(), EventPosition::new(2));

        cursor.mark_processed(EventPosition::new(5)); // Gap
        assert_eq!(cursor.contiguous(), EventPosition::new(2));

        cursor.mark_processed(EventPosition::new(3));
        cursor.mark_processed(EventPosition::new(4)); // Fills the gap
        assert_eq!(cursor.contiguous(), EventPosition::new(5));
        assert!(!cursor.has_gaps());
    }

    #[test]
    fn resume_from_counts_prefix_as_processed() {
        let cursor = EventCursor::resume_from(EventPosition::new(100));

        assert!(cursor.is_processed(EventPosition::new(50)));
        assert!(cursor.is_processed(EventPosition::new(100)));
        assert!(!cursor.is_processed(EventPosition::new(101)));
        assert_eq!(cursor.highest_processed(), EventPosition::new(100));
    }

    #[test]
    fn gap_position_is_not_processed() {
        let mut cursor = EventCursor::new();
        cursor.mark_processed(EventPosition::new(1));
        cursor.mark_processed(EventPosition::new(3));

        assert!(cursor.is_processed(EventPosition::new(3)));
        assert!(!cursor.is_processed(EventPosition::new(2)));
    }

    #[test]
    fn duplicate_marks_are_idempotent() {
        let mut cursor = EventCursor::new();

        cursor.mark_processed(EventPosition::new(1));
        cursor.mark_processed(EventPosition::new(2));
        cursor.mark_processed(EventPosition::new(1)); // Duplicate
        cursor.mark_processed(EventPosition::new(2)); // Duplicate

        assert_eq!(cursor.contiguous(), EventPosition::new(2));
        assert!(!cursor.has_gaps());
    }

    #[test]
    fn acknowledge_up_to_clears_gaps() {
        let mut cursor = EventCursor::new();

        cursor.mark_processed(EventPosition::new(1));
        cursor.mark_processed(EventPosition::new(5));
        assert!(cursor.has_gaps());

        cursor.acknowledge_up_to(EventPosition::new(5));
        assert!(!cursor.has_gaps());
        assert_eq!(cursor.contiguous(), EventPosition::new(5));
    }

    #[test]
    fn out_of_order_marks_converge() {
        let mut cursor = EventCursor::new();

        cursor.mark_processed(EventPosition::new(5));
        cursor.mark_processed(EventPosition::new(2));
        cursor.mark_processed(EventPosition::new(4));
        cursor.mark_processed(EventPosition::new(1));
        cursor.mark_processed(EventPosition::new(3));

        assert!(!cursor.has_gaps());
        assert_eq!(cursor.contiguous(), EventPosition::new(5));
    }

    #[test]
    fn gap_cap_prevents_oom() {
        let mut cursor = EventCursor::new();
        cursor.mark_processed(EventPosition::new(1));
        cursor.mark_processed(EventPosition::new(20_000));

        assert!(cursor.has_gaps());
        assert!(
            cursor.missing().is_empty(),
            "gaps beyond the cap must not be enumerated"
        );
    }
}
