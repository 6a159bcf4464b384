//! One-shot corrective migrations applied opportunistically during sync.
//!
//! Each hot fix is keyed to a version and runs once per version
//! transition: the applier compares the session's last-applied version
//! against the build's current version and applies everything in between,
//! in version order. Fixes must themselves be idempotent, so the applier
//! does not need to track anything beyond the version marker.

use crate::context::SessionContext;

/// A single corrective migration.
pub trait HotFix: Send {
    /// The version this fix belongs to.
    fn version(&self) -> u32;

    /// Stable name, for logging.
    fn name(&self) -> &str;

    /// Apply the fix. Must be idempotent: applying twice has the same
    /// observable effect as applying once.
    fn apply(&self, ctx: &SessionContext);
}

/// Applies registered hot fixes once per version transition.
#[derive(Default)]
pub struct HotFixApplier {
    current_version: u32,
    fixes: Vec<Box<dyn HotFix>>,
}

impl HotFixApplier {
    /// Create an applier for the given build version.
    pub fn new(current_version: u32) -> Self {
        Self {
            current_version,
            fixes: Vec::new(),
        }
    }

    /// Register a fix. Fixes are applied in version order regardless of
    /// registration order.
    pub fn register(&mut self, fix: Box<dyn HotFix>) {
        self.fixes.push(fix);
        self.fixes.sort_by_key(|f| f.version());
    }

    /// Apply every fix newer than the session's marker, then advance the
    /// marker to the current version.
    ///
    /// Safe to invoke more than once: after the first run the marker is
    /// current and nothing qualifies.
    pub fn apply_all(&self, ctx: &SessionContext) {
        let last_applied = ctx.last_hotfix_version();
        if last_applied >= self.current_version {
            return;
        }

        for fix in &self.fixes {
            let version = fix.version();
            if version > last_applied && version <= self.current_version {
                tracing::debug!("applying hot fix {} (version {})", fix.name(), version);
                fix.apply(ctx);
            }
        }

        ctx.set_last_hotfix_version(self.current_version);
    }
}

impl std::fmt::Debug for HotFixApplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotFixApplier")
            .field("current_version", &self.current_version)
            .field("fixes", &self.fixes.len())
            .finish()
    }
}

/// Version 1 fix: drop call signals a previous session left queued.
///
/// Stale signaling is worse than none; a fresh session must not relay
/// signals for calls that no longer exist.
#[derive(Debug, Default)]
pub struct PurgeStaleCallSignals;

impl HotFix for PurgeStaleCallSignals {
    fn version(&self) -> u32 {
        1
    }

    fn name(&self) -> &str {
        "purge-stale-call-signals"
    }

    fn apply(&self, ctx: &SessionContext) {
        ctx.clear_call_signals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OutgoingCallSignal;
    use quill_sync_types::ConversationId;
    use std::sync::{Arc, Mutex};

    struct CountingFix {
        version: u32,
        applied: Arc<Mutex<u32>>,
    }

    impl HotFix for CountingFix {
        fn version(&self) -> u32 {
            self.version
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn apply(&self, _ctx: &SessionContext) {
            *self.applied.lock().unwrap() += 1;
        }
    }

    fn counting_fix(version: u32) -> (CountingFix, Arc<Mutex<u32>>) {
        let applied = Arc::new(Mutex::new(0));
        (
            CountingFix {
                version,
                applied: Arc::clone(&applied),
            },
            applied,
        )
    }

    #[test]
    fn applies_pending_fixes_once() {
        let ctx = SessionContext::new();
        let mut applier = HotFixApplier::new(1);
        let (fix, applied) = counting_fix(1);
        applier.register(Box::new(fix));

        applier.apply_all(&ctx);
        applier.apply_all(&ctx);

        // Second run is a no-op: the marker is current.
        assert_eq!(*applied.lock().unwrap(), 1);
        assert_eq!(ctx.last_hotfix_version(), 1);
    }

    #[test]
    fn skips_fixes_newer_than_the_build() {
        let ctx = SessionContext::new();
        let mut applier = HotFixApplier::new(1);
        let (future_fix, applied) = counting_fix(2);
        applier.register(Box::new(future_fix));

        applier.apply_all(&ctx);

        assert_eq!(*applied.lock().unwrap(), 0);
        assert_eq!(ctx.last_hotfix_version(), 1);
    }

    #[test]
    fn skips_fixes_already_covered_by_the_marker() {
        let ctx = SessionContext::new();
        ctx.set_last_hotfix_version(1);
        let mut applier = HotFixApplier::new(2);
        let (old_fix, old_applied) = counting_fix(1);
        let (new_fix, new_applied) = counting_fix(2);
        applier.register(Box::new(old_fix));
        applier.register(Box::new(new_fix));

        applier.apply_all(&ctx);

        assert_eq!(*old_applied.lock().unwrap(), 0);
        assert_eq!(*new_applied.lock().unwrap(), 1);
    }

    #[test]
    fn purge_is_idempotent() {
        let ctx = SessionContext::new();
        ctx.enqueue_call_signal(OutgoingCallSignal {
            conversation: ConversationId::new(),
            data: vec![1],
        });
        let fix = PurgeStaleCallSignals;

        fix.apply(&ctx);
        let after_once = ctx.call_signal_count();
        fix.apply(&ctx);

        assert_eq!(after_once, 0);
        assert_eq!(ctx.call_signal_count(), 0);
    }
}
