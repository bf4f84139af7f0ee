//! EventSubscriber port - Interface for subscribing to domain events.
//!
//! This port defines how consumers register interest in domain events
//! without knowing about the producer or the transport that delivered them.

use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::sync::DomainEvent;

/// Handler for processing domain events.
///
/// Implementations should be:
/// - **Idempotent** - Safe to call multiple times with the same change
/// - **Quick** - Dispatch is synchronous; long work belongs on a task
/// - **Isolated** - Errors are logged by the bus and affect no one else
///
/// # Example
///
/// ```ignore
/// struct BalanceLogger;
///
/// impl EventHandler for BalanceLogger {
///     fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
///         let update: BalanceUpdate = event.payload_as()?;
///         tracing::info!(balance = update.new_balance, "balance changed");
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "BalanceLogger"
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Process an event.
    fn handle(&self, event: &DomainEvent) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Token for one registration, returned by [`EventSubscriber::subscribe`].
///
/// `unsubscribe` removes exactly that registration and may be called any
/// number of times. Dropping the token leaves the registration in place.
pub struct Subscription {
    id: SubscriptionId,
    event_type: String,
    cancel: Box<dyn Fn(SubscriptionId) + Send + Sync>,
}

impl Subscription {
    /// Creates a token whose `unsubscribe` invokes `cancel` with the id.
    pub fn new(
        id: SubscriptionId,
        event_type: impl Into<String>,
        cancel: impl Fn(SubscriptionId) + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            event_type: event_type.into(),
            cancel: Box::new(cancel),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Remove the registration. Idempotent.
    pub fn unsubscribe(&self) {
        (self.cancel)(self.id)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish()
    }
}

/// Port for subscribing to domain events.
///
/// # Example
///
/// ```ignore
/// let sub = bus.subscribe(BALANCE_UPDATE, balance_display.clone());
/// let subs = bus.subscribe_all(&[WALLET_UPDATED, RESOURCE_MUTATED], invalidator);
/// // later
/// sub.unsubscribe();
/// ```
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to a specific event type.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Subscription;

    /// Subscribe handler to multiple event types, one registration each.
    fn subscribe_all(
        &self,
        event_types: &[&str],
        handler: Arc<dyn EventHandler>,
    ) -> Vec<Subscription> {
        event_types
            .iter()
            .map(|event_type| self.subscribe(event_type, Arc::clone(&handler)))
            .collect()
    }
}

/// Combined trait for event bus implementations.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

// Blanket implementation - any type that implements both traits is an EventBus
impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}

/// Closure-backed handler, for callers that do not need a named type.
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&DomainEvent) -> Result<(), DomainError> + Send + Sync,
{
    fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        (self.f)(event)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Wrap a closure as an [`EventHandler`].
pub fn handler_fn<F>(name: &'static str, f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&DomainEvent) -> Result<(), DomainError> + Send + Sync + 'static,
{
    Arc::new(FnHandler { name, f })
}
