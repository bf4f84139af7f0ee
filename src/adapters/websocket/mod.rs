//! WebSocket adapters for the primary push channel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Live-update server                              │
//! │   /accounts/{id}/live                                                │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ text frames (envelopes)
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    WebSocketConnection                               │
//! │   - Sends {"type":"auth"} handshake                                  │
//! │   - Yields text frames, hides ping/pong                              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ChannelSupervisor                               │
//! │   control frame? -> log        envelope? -> decode/dedup/emit        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`client`] - tokio-tungstenite `PrimaryChannel` implementation

pub mod client;

pub use client::{WebSocketChannel, WebSocketConnection};
