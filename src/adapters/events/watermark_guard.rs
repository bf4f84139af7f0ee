//! WatermarkGuard - Wrapper that keeps delta consumers monotonic.
//!
//! Delta consumers apply payloads directly instead of refetching, so they
//! must never apply an update older than the one they already show. This
//! adapter wraps any `EventHandler` and tracks, per resource and event
//! type, the timestamp of the last event it forwarded.
//!
//! ## Usage
//!
//! ```ignore
//! let guarded = WatermarkGuard::new(BalanceDisplay::default());
//! event_bus.subscribe(BALANCE_UPDATE, Arc::new(guarded));
//! ```
//!
//! ## How It Works
//!
//! 1. Events without `occurred_at` (local signals) pass straight through
//! 2. Events at or below the watermark for their resource and type are skipped
//! 3. Otherwise the watermark advances and the inner handler runs
//! 4. If the inner handler fails, the watermark is rewound
//!
//! Check and advance happen under one lock, so a redelivery of the same
//! event while the first is still being applied is skipped. A failed apply
//! leaves the event eligible for a later redelivery (for example from the
//! poller).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::foundation::{DomainError, ResourceId};
use crate::domain::sync::{DedupWatermark, DomainEvent};
use crate::ports::EventHandler;

/// Decorates an `EventHandler` with a per-resource, per-type timestamp
/// watermark.
pub struct WatermarkGuard<H: EventHandler> {
    inner: H,
    applied: Mutex<HashMap<Option<ResourceId>, DedupWatermark>>,
}

impl<H: EventHandler> WatermarkGuard<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            applied: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    fn applied(&self) -> MutexGuard<'_, HashMap<Option<ResourceId>, DedupWatermark>> {
        self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: EventHandler> EventHandler for WatermarkGuard<H> {
    fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        let Some(occurred_at) = event.occurred_at else {
            return self.inner.handle(event);
        };

        let previous = {
            let mut applied = self.applied();
            let watermark = applied.entry(event.resource_id.clone()).or_default();
            let previous = watermark.get(&event.event_type);
            if !watermark.admit(&event.event_type, occurred_at) {
                tracing::debug!(
                    handler = self.inner.name(),
                    resource_id = ?event.resource_id,
                    event_type = %event.event_type,
                    "Skipping stale event"
                );
                return Ok(());
            }
            previous
        };

        // Not held across the inner call so handlers may re-enter the bus
        if let Err(e) = self.inner.handle(event) {
            if let Some(watermark) = self.applied().get_mut(&event.resource_id) {
                watermark.rewind(&event.event_type, occurred_at, previous);
            }
            return Err(e);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ErrorCode, ResourceId, Timestamp};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, OnceLock, Weak};

    /// Test handler that counts invocations
    struct CountingHandler {
        count: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingHandler {
        fn new() -> Self {
            Self {
                count: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn invocations(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl EventHandler for CountingHandler {
        fn handle(&self, _: &DomainEvent) -> Result<(), DomainError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::new(ErrorCode::ConsumerFailed, "Simulated failure"));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    fn at(millis: i64) -> Timestamp {
        Timestamp::parse_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .plus_millis(millis)
    }

    fn balance(millis: i64) -> DomainEvent {
        DomainEvent::new("balance_update", json!({ "newBalance": millis })).occurred_at(at(millis))
    }

    #[test]
    fn first_event_is_applied() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        guard.handle(&balance(1)).unwrap();
        assert_eq!(guard.inner().invocations(), 1);
    }

    #[test]
    fn duplicate_timestamp_is_skipped() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        guard.handle(&balance(1)).unwrap();
        guard.handle(&balance(1)).unwrap();
        assert_eq!(guard.inner().invocations(), 1);
    }

    #[test]
    fn older_event_is_skipped_after_newer() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        guard.handle(&balance(10)).unwrap();
        guard.handle(&balance(5)).unwrap();
        guard.handle(&balance(11)).unwrap();
        assert_eq!(guard.inner().invocations(), 2);
    }

    #[test]
    fn signals_without_timestamp_always_pass() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        let signal = DomainEvent::new("wallet-updated", json!({}));
        guard.handle(&signal).unwrap();
        guard.handle(&signal).unwrap();
        assert_eq!(guard.inner().invocations(), 2);
    }

    #[test]
    fn failed_apply_does_not_advance_watermark() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        guard.inner().fail.store(true, Ordering::SeqCst);
        assert!(guard.handle(&balance(3)).is_err());

        guard.inner().fail.store(false, Ordering::SeqCst);
        guard.handle(&balance(3)).unwrap();
        assert_eq!(guard.inner().invocations(), 2);
    }

    #[test]
    fn resources_are_tracked_independently() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        let a = ResourceId::new("acc-a").unwrap();
        let b = ResourceId::new("acc-b").unwrap();

        guard.handle(&balance(10).for_resource(a.clone())).unwrap();
        guard.handle(&balance(20).for_resource(b.clone())).unwrap();
        guard.handle(&balance(15).for_resource(a.clone())).unwrap();
        guard.handle(&balance(12).for_resource(a)).unwrap();

        assert_eq!(guard.inner().invocations(), 3);
    }

    /// Hands the event it is applying back to its own guard once.
    struct Redelivering {
        count: AtomicUsize,
        guard: OnceLock<Weak<WatermarkGuard<Redelivering>>>,
    }

    impl EventHandler for Redelivering {
        fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
            let call = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                if let Some(guard) = self.guard.get().and_then(Weak::upgrade) {
                    guard.handle(event)?;
                }
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Redelivering"
        }
    }

    #[test]
    fn redelivery_during_apply_is_skipped() {
        let guard = Arc::new(WatermarkGuard::new(Redelivering {
            count: AtomicUsize::new(0),
            guard: OnceLock::new(),
        }));
        let _ = guard.inner().guard.set(Arc::downgrade(&guard));

        guard.handle(&balance(5)).unwrap();

        assert_eq!(guard.inner().count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_apply_keeps_earlier_watermark() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        guard.handle(&balance(3)).unwrap();

        guard.inner().fail.store(true, Ordering::SeqCst);
        assert!(guard.handle(&balance(8)).is_err());
        guard.inner().fail.store(false, Ordering::SeqCst);

        guard.handle(&balance(2)).unwrap();
        guard.handle(&balance(8)).unwrap();
        assert_eq!(guard.inner().invocations(), 3);
    }

    #[test]
    fn name_delegates_to_inner() {
        let guard = WatermarkGuard::new(CountingHandler::new());
        assert_eq!(guard.name(), "CountingHandler");
    }
}
