//! PrimaryChannel port - Interface for the push-style live connection.
//!
//! The supervisor opens one connection per resource, sends the auth
//! handshake as the first frame, and then reads text frames until the
//! connection closes or errors.
//!
//! ## Lifecycle
//!
//! 1. `PrimaryChannel::connect(resource_id)` opens the transport
//! 2. `PushConnection::send` carries the `{"type":"auth"}` handshake
//! 3. `PushConnection::next_message` yields envelopes as raw text
//! 4. `None` from `next_message` means the server closed the channel
//!
//! Dropping a `PushConnection` releases the underlying socket.

use async_trait::async_trait;

use crate::domain::foundation::ResourceId;

/// Transient transport faults on either channel.
///
/// Never surfaced to callers of the sync subsystem; the supervisor turns
/// them into state transitions and retries.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not open the connection
    #[error("Connect failed: {0}")]
    Connect(String),

    /// No access token available for the handshake or request
    #[error("No access token available")]
    MissingToken,

    /// Writing a frame failed
    #[error("Send failed: {0}")]
    Send(String),

    /// Reading from an open connection failed
    #[error("Receive failed: {0}")]
    Receive(String),

    /// Request to an HTTP endpoint failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Endpoint answered with a non-success status
    #[error("Unexpected status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    /// Response body did not match the expected shape
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

/// Factory for primary connections.
#[async_trait]
pub trait PrimaryChannel: Send + Sync {
    /// Open a live connection for one resource.
    async fn connect(&self, resource_id: &ResourceId)
        -> Result<Box<dyn PushConnection>, TransportError>;
}

/// One open primary connection.
#[async_trait]
pub trait PushConnection: Send {
    /// Send a text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next text frame.
    ///
    /// Returns `None` once the connection has closed.
    async fn next_message(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the connection gracefully.
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_channel_object_safe(_: &dyn PrimaryChannel) {}

    #[allow(dead_code)]
    fn assert_connection_object_safe(_: &dyn PushConnection) {}

    #[test]
    fn status_error_names_endpoint() {
        let err = TransportError::Status {
            status: 503,
            endpoint: "/accounts/acc-1/updates".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected status 503 from /accounts/acc-1/updates"
        );
    }
}
