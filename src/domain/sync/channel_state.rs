//! Connection lifecycle of a resource's primary channel.

use serde::Serialize;

use crate::domain::foundation::{StateMachine, Timestamp};

/// Lifecycle state of one supervisor's primary channel.
///
/// ```text
/// Disconnected -> Connecting -> Connected -> Reconnecting -> Connected
///                     |                          ^
///                     +----[connect failed]------+
/// any state -> Disconnected (disable)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ChannelState {
    /// True while a primary connection is open and authenticated.
    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Connected)
    }

    /// True in every state except `Disconnected`.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ChannelState::Disconnected)
    }
}

impl StateMachine for ChannelState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ChannelState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connecting, Disconnected)
                | (Connected, Reconnecting)
                | (Connected, Disconnected)
                | (Reconnecting, Connected)
                | (Reconnecting, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ChannelState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Reconnecting, Disconnected],
            Connected => vec![Reconnecting, Disconnected],
            Reconnecting => vec![Connected, Disconnected],
        }
    }
}

/// Status surface for rendering staleness indicators.
///
/// Not part of the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub is_connected: bool,
    pub last_update_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ChannelState; 4] = [
        ChannelState::Disconnected,
        ChannelState::Connecting,
        ChannelState::Connected,
        ChannelState::Reconnecting,
    ];

    #[test]
    fn initial_state_is_disconnected() {
        assert_eq!(ChannelState::default(), ChannelState::Disconnected);
    }

    #[test]
    fn only_connecting_leaves_disconnected() {
        assert!(ChannelState::Disconnected
            .transition_to(ChannelState::Connected)
            .is_err());
        assert!(ChannelState::Disconnected
            .transition_to(ChannelState::Connecting)
            .is_ok());
    }

    #[test]
    fn every_enabled_state_can_disconnect() {
        for state in ALL.iter().filter(|s| s.is_enabled()) {
            assert!(state.can_transition_to(&ChannelState::Disconnected));
        }
    }

    #[test]
    fn reconnecting_cannot_go_back_to_connecting() {
        assert!(!ChannelState::Reconnecting.can_transition_to(&ChannelState::Connecting));
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn no_state_is_terminal() {
        assert!(ALL.iter().all(|s| !s.is_terminal()));
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_value(ConnectionStatus::default()).unwrap();
        assert_eq!(json["isConnected"], false);
        assert!(json["lastUpdateAt"].is_null());
    }
}
