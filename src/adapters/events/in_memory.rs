//! In-process event bus.
//!
//! Synchronous, deterministic dispatch for every consumer in the process.
//! Constructed once at the application root and shared by `Arc`; there is
//! no ambient global instance.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::domain::foundation::SubscriptionId;
use crate::domain::sync::DomainEvent;
use crate::ports::{EventHandler, EventPublisher, EventSubscriber, Subscription};

struct Registration {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
    active: AtomicBool,
}

type HandlerTable = HashMap<String, Vec<Arc<Registration>>>;

/// Process-wide publish/subscribe bus.
///
/// Features:
/// - Dispatch in registration order, over a snapshot taken at emit time
/// - Registrations removed mid-emission are skipped if not yet reached
/// - Handler errors and panics are logged and isolated per handler
/// - Handlers may emit, subscribe, or unsubscribe re-entrantly
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let sub = bus.subscribe(BALANCE_UPDATE, balance_display);
/// bus.emit(event);
/// sub.unsubscribe();
/// ```
pub struct InMemoryEventBus {
    handlers: Arc<RwLock<HandlerTable>>,
}

impl InMemoryEventBus {
    /// Creates a new empty event bus.
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live registrations for an event type.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    fn snapshot(&self, event_type: &str) -> Vec<Arc<Registration>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn emit(&self, event: DomainEvent) {
        // Lock is released before any handler runs
        let registrations = self.snapshot(&event.event_type);

        for registration in registrations {
            if !registration.active.load(Ordering::SeqCst) {
                continue;
            }

            let handler = &registration.handler;
            match catch_unwind(AssertUnwindSafe(|| handler.handle(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        error = %e,
                        "Event handler failed"
                    );
                }
                Err(_) => {
                    tracing::error!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        "Event handler panicked"
                    );
                }
            }
        }
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Subscription {
        let registration = Arc::new(Registration {
            id: SubscriptionId::new(),
            handler,
            active: AtomicBool::new(true),
        });

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(Arc::clone(&registration));

        tracing::debug!(
            event_type,
            handler = registration.handler.name(),
            subscription_id = %registration.id,
            "Subscribed"
        );

        let table: Weak<RwLock<HandlerTable>> = Arc::downgrade(&self.handlers);
        let key = event_type.to_string();
        let id = registration.id;
        let flag = Arc::downgrade(&registration);

        Subscription::new(id, event_type, move |id| {
            if let Some(registration) = flag.upgrade() {
                registration.active.store(false, Ordering::SeqCst);
            }
            let Some(table) = table.upgrade() else {
                return;
            };
            let mut handlers = table.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(list) = handlers.get_mut(&key) {
                list.retain(|r| r.id != id);
                if list.is_empty() {
                    handlers.remove(&key);
                }
            }
        })
    }
}
