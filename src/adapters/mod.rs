//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the sync core to external systems:
//! - `auth` - Bearer token holder
//! - `consumers` - Derived views fed by the bus
//! - `events` - In-memory event bus and the watermark guard
//! - `http` - reqwest client for the account REST API
//! - `websocket` - tokio-tungstenite primary channel

pub mod auth;
pub mod consumers;
pub mod events;
pub mod http;
pub mod websocket;

pub use auth::StaticTokenProvider;
pub use consumers::{
    BalanceDisplay, BalanceView, InvalidationAdapter, RefetchTask, TransactionFeed,
    ANALYTICS_SIGNALS,
};
pub use events::{InMemoryEventBus, WatermarkGuard};
pub use http::{AccountApiConfig, HttpAccountApi};
pub use websocket::{WebSocketChannel, WebSocketConnection};
