//! Primary channel protocol frames.
//!
//! Defines the protocol between this client and the live-update server:
//! - Client → Server: Auth handshake (first frame), pings
//! - Server → Client: Envelopes (decoded by the domain decoder) and a
//!   small set of control frames that are not account events

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be sent from client to server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First frame after connect.
    Auth { token: String },

    /// Heartbeat request.
    Ping,
}

impl ClientMessage {
    /// Build the handshake frame from a stored token.
    pub fn auth(token: &SecretString) -> Self {
        ClientMessage::Auth {
            token: token.expose_secret().to_string(),
        }
    }

    /// Serialize to the JSON text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================
// Server → Client Control Messages
// ============================================

/// Frames the server sends that are not envelopes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Handshake accepted.
    #[serde(alias = "auth_ok")]
    Connected,

    /// Server-side error report.
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Heartbeat response.
    Pong,
}

impl ControlMessage {
    /// Parse a frame as a control message; `None` means it should be
    /// treated as an envelope.
    pub fn parse(frame: &str) -> Option<Self> {
        serde_json::from_str(frame).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_handshake_serializes_with_type_tag() {
        let frame = ClientMessage::auth(&SecretString::new("tok-123".to_string()))
            .to_frame()
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "auth", "token": "tok-123" }));
    }

    #[test]
    fn ping_serializes_as_bare_type() {
        assert_eq!(ClientMessage::Ping.to_frame().unwrap(), r#"{"type":"ping"}"#);
    }

    #[test]
    fn control_frames_are_recognised() {
        assert_eq!(
            ControlMessage::parse(r#"{"type":"auth_ok"}"#),
            Some(ControlMessage::Connected)
        );
        assert_eq!(
            ControlMessage::parse(r#"{"type":"pong"}"#),
            Some(ControlMessage::Pong)
        );
        assert!(matches!(
            ControlMessage::parse(r#"{"type":"error","code":"AUTH_FAILED"}"#),
            Some(ControlMessage::Error { code: Some(_), .. })
        ));
    }

    #[test]
    fn envelopes_are_not_control_frames() {
        let frame = r#"{"type":"balance_update","data":{"newBalance":1},"timestamp":"2024-01-15T10:30:00Z"}"#;
        assert_eq!(ControlMessage::parse(frame), None);
    }
}
