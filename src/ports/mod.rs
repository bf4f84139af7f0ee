//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the sync core and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for emitting domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes dispatched events
//!
//! ## Channel Ports
//!
//! - `PrimaryChannel` / `PushConnection` - Push-style live connection
//! - `UpdateSource` - "Updates since watermark" poll endpoint
//! - `TokenProvider` - Current bearer token from the auth collaborator
//!
//! ## Collaborator Ports
//!
//! - `AccountOperations` - REST mutations wrapped by producers
//! - `Refetch` / `ViewLoader` - Derived view refresh

mod account_operations;
mod event_publisher;
mod event_subscriber;
mod primary_channel;
mod token_provider;
mod update_source;
mod view_refresh;

pub use account_operations::AccountOperations;
pub use event_publisher::EventPublisher;
pub use event_subscriber::{
    handler_fn, EventBus, EventHandler, EventSubscriber, FnHandler, Subscription,
};
pub use primary_channel::{PrimaryChannel, PushConnection, TransportError};
pub use token_provider::TokenProvider;
pub use update_source::UpdateSource;
pub use view_refresh::{Refetch, ViewLoader};
