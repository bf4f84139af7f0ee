//! Wire envelopes and their decoding into typed account events.
//!
//! Both the push channel and the poll endpoint deliver the same shape:
//!
//! ```json
//! { "type": "balance_update", "data": { "newBalance": 9500 }, "timestamp": "2024-01-15T10:30:00Z" }
//! ```
//!
//! Decoding is a pure mapping. Anything that does not fit (bad JSON, unknown
//! `type`, `data` of the wrong shape, unparsable `timestamp`) is a
//! [`DecodeError`]; callers log and drop it.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::events::{
    BalanceUpdate, DomainEvent, LimitReset, SecurityAlert, TransactionRecord, BALANCE_UPDATE,
    LIMIT_RESET, SECURITY_ALERT, TRANSACTION_ADDED,
};
use crate::domain::foundation::{ResourceId, Timestamp};

/// Wire form of an update, produced by either channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: JsonValue,
    pub timestamp: String,
}

/// Typed view of a decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    BalanceUpdate(BalanceUpdate),
    TransactionAdded(TransactionRecord),
    LimitReset(LimitReset),
    SecurityAlert(SecurityAlert),
}

impl SyncEvent {
    /// The bus event type this variant is emitted under.
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::BalanceUpdate(_) => BALANCE_UPDATE,
            SyncEvent::TransactionAdded(_) => TRANSACTION_ADDED,
            SyncEvent::LimitReset(_) => LIMIT_RESET,
            SyncEvent::SecurityAlert(_) => SECURITY_ALERT,
        }
    }
}

/// A successfully decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub event: SyncEvent,
    pub timestamp: Timestamp,
    /// The validated `data` object, forwarded unchanged as the bus payload.
    pub data: JsonValue,
}

impl DecodedEvent {
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }

    /// Converts into the bus representation for the given resource.
    pub fn into_domain_event(self, resource_id: ResourceId) -> DomainEvent {
        DomainEvent::new(self.event.event_type(), self.data)
            .for_resource(resource_id)
            .occurred_at(self.timestamp)
    }
}

/// Reasons an envelope is dropped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Unknown envelope type '{0}'")]
    UnknownType(String),

    #[error("Invalid data for '{event_type}': {source}")]
    InvalidData {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid envelope timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Decodes a raw text frame from the push channel.
pub fn decode_text(raw: &str) -> Result<DecodedEvent, DecodeError> {
    let envelope: Envelope = serde_json::from_str(raw).map_err(DecodeError::Malformed)?;
    decode_envelope(envelope)
}

/// Decodes one item of a poll response.
pub fn decode_value(raw: JsonValue) -> Result<DecodedEvent, DecodeError> {
    let envelope: Envelope = serde_json::from_value(raw).map_err(DecodeError::Malformed)?;
    decode_envelope(envelope)
}

/// Decodes a structurally valid envelope.
pub fn decode_envelope(envelope: Envelope) -> Result<DecodedEvent, DecodeError> {
    let event = match envelope.event_type.as_str() {
        BALANCE_UPDATE => SyncEvent::BalanceUpdate(typed(&envelope)?),
        TRANSACTION_ADDED => SyncEvent::TransactionAdded(typed(&envelope)?),
        LIMIT_RESET => SyncEvent::LimitReset(typed(&envelope)?),
        SECURITY_ALERT => SyncEvent::SecurityAlert(typed(&envelope)?),
        other => return Err(DecodeError::UnknownType(other.to_string())),
    };

    let timestamp = Timestamp::parse_rfc3339(&envelope.timestamp)
        .map_err(|_| DecodeError::InvalidTimestamp(envelope.timestamp.clone()))?;

    Ok(DecodedEvent {
        event,
        timestamp,
        data: envelope.data,
    })
}

fn typed<T: for<'de> Deserialize<'de>>(envelope: &Envelope) -> Result<T, DecodeError> {
    T::deserialize(&envelope.data).map_err(|source| DecodeError::InvalidData {
        event_type: envelope.event_type.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_balance_update() {
        let decoded = decode_text(
            r#"{"type":"balance_update","data":{"newBalance":9500},"timestamp":"2024-01-15T10:30:00Z"}"#,
        )
        .unwrap();

        assert_eq!(
            decoded.event,
            SyncEvent::BalanceUpdate(BalanceUpdate {
                new_balance: 9500.0,
                currency: None
            })
        );
        assert_eq!(decoded.event_type(), "balance_update");
    }

    #[test]
    fn decodes_transaction_added_as_record() {
        let decoded = decode_value(json!({
            "type": "transaction_added",
            "data": { "id": "tx-9", "amount": 500, "category": "food" },
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap();

        match decoded.event {
            SyncEvent::TransactionAdded(record) => {
                assert_eq!(record.amount, 500.0);
                assert_eq!(record.id.as_deref(), Some("tx-9"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn decodes_limit_reset_and_security_alert() {
        let limit = decode_value(json!({
            "type": "limit_reset",
            "data": { "limitType": "daily", "newLimit": 1000 },
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap();
        assert_eq!(limit.event_type(), LIMIT_RESET);

        let alert = decode_value(json!({
            "type": "security_alert",
            "data": { "severity": "high", "message": "New device login" },
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap();
        assert_eq!(alert.event_type(), SECURITY_ALERT);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = decode_value(json!({
            "type": "pizza_delivered",
            "data": {},
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap_err();

        assert!(matches!(err, DecodeError::UnknownType(t) if t == "pizza_delivered"));
    }

    #[test]
    fn wrong_data_shape_is_rejected() {
        let err = decode_value(json!({
            "type": "balance_update",
            "data": { "newBalance": "lots" },
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap_err();

        assert!(matches!(err, DecodeError::InvalidData { .. }));
    }

    #[test]
    fn missing_data_is_rejected_for_typed_events() {
        let err = decode_value(json!({
            "type": "security_alert",
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap_err();

        assert!(matches!(err, DecodeError::InvalidData { .. }));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let err = decode_value(json!({
            "type": "balance_update",
            "data": { "newBalance": 1 },
            "timestamp": "last tuesday"
        }))
        .unwrap_err();

        assert!(matches!(err, DecodeError::InvalidTimestamp(_)));
    }

    #[test]
    fn non_json_text_is_malformed() {
        assert!(matches!(decode_text("not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode_text("[1,2,3]"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn into_domain_event_keeps_raw_data_and_timestamp() {
        let decoded = decode_value(json!({
            "type": "balance_update",
            "data": { "newBalance": 12.5, "currency": "EUR" },
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap();
        let ts = decoded.timestamp;

        let event = decoded.into_domain_event(ResourceId::new("acc-1").unwrap());

        assert_eq!(event.event_type, BALANCE_UPDATE);
        assert_eq!(event.payload["currency"], "EUR");
        assert_eq!(event.occurred_at, Some(ts));
        assert_eq!(event.resource_id.unwrap().as_str(), "acc-1");
    }
}
