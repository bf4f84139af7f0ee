//! EventPublisher port - Interface for putting domain events on the bus.
//!
//! Publishers (the channel supervisor, producer handlers) emit without
//! knowing who listens.

use crate::domain::sync::DomainEvent;

/// Port for emitting domain events.
///
/// Implementations must ensure:
/// - Dispatch is synchronous: every handler registered for the event type
///   at emit time has run (or been skipped after unsubscribing) when
///   `emit` returns
/// - Handlers run in registration order
/// - A failing handler never prevents the remaining handlers from running,
///   and never surfaces to the emitter
///
/// # Example
///
/// ```ignore
/// publisher.emit(DomainEvent::signal(WALLET_UPDATED, &account_id));
/// ```
pub trait EventPublisher: Send + Sync {
    /// Dispatch a single event to the current subscribers of its type.
    fn emit(&self, event: DomainEvent);

    /// Dispatch several events in order.
    fn emit_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}
