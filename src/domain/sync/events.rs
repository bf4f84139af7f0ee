//! Domain events carried on the event bus.
//!
//! This module provides:
//! - Event type names for the typed account events
//! - Coarse invalidation signal names
//! - `DomainEvent` - The unit dispatched by the bus
//! - Typed payloads for the four account events

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{ResourceId, Timestamp};

// ============================================
// Event Type Names
// ============================================

/// New balance scalar for an account.
pub const BALANCE_UPDATE: &str = "balance_update";

/// One transaction record appended to an account.
pub const TRANSACTION_ADDED: &str = "transaction_added";

/// A spending limit was reset.
pub const LIMIT_RESET: &str = "limit_reset";

/// Security notification for the account holder.
pub const SECURITY_ALERT: &str = "security_alert";

/// Every typed event the decoder understands.
pub const TYPED_EVENT_TYPES: &[&str] = &[BALANCE_UPDATE, TRANSACTION_ADDED, LIMIT_RESET, SECURITY_ALERT];

// ============================================
// Coarse Invalidation Signals
// ============================================

/// Generic "something changed, refetch me".
pub const RESOURCE_MUTATED: &str = "resource-mutated";

/// Wallet balance or limits changed.
pub const WALLET_UPDATED: &str = "wallet-updated";

/// A transfer or expense finished server-side.
pub const TRANSACTION_COMPLETED: &str = "transaction-completed";

/// Signals emitted by every state-mutating operation on success.
pub const MUTATION_SIGNALS: &[&str] = &[WALLET_UPDATED, TRANSACTION_COMPLETED, RESOURCE_MUTATED];

// ============================================
// DomainEvent
// ============================================

/// The unit carried on the event bus.
///
/// Typed events decoded from the wire carry `occurred_at` (the envelope
/// timestamp) and the validated `data` object as payload. Locally produced
/// signals carry no `occurred_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event type for routing (e.g., "balance_update", "wallet-updated").
    pub event_type: String,

    /// Account the event belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,

    /// Event-specific payload as JSON.
    pub payload: JsonValue,

    /// Authoritative server timestamp of the change, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<Timestamp>,

    /// When the event was put on the bus.
    pub emitted_at: Timestamp,
}

impl DomainEvent {
    /// Creates an event with an arbitrary payload, stamped now.
    pub fn new(event_type: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            event_type: event_type.into(),
            resource_id: None,
            payload,
            occurred_at: None,
            emitted_at: Timestamp::now(),
        }
    }

    /// Creates a payload-free invalidation signal for a resource.
    ///
    /// The resource travels in `resource_id`; the payload is an empty object.
    pub fn signal(signal: &str, resource_id: &ResourceId) -> Self {
        Self::new(signal, serde_json::json!({})).for_resource(resource_id.clone())
    }

    /// Attach the owning resource.
    pub fn for_resource(mut self, resource_id: ResourceId) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Attach the authoritative server timestamp.
    pub fn occurred_at(mut self, timestamp: Timestamp) -> Self {
        self.occurred_at = Some(timestamp);
        self
    }

    /// Deserialize payload to a specific payload type.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

// ============================================
// Typed Payloads
// ============================================

/// Payload of `balance_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    pub new_balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Payload of `transaction_added`: the transaction record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Server-side classification, e.g. "transfer" or "expense".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Payload of `limit_reset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitReset {
    pub limit_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<String>,
}

/// Payload of `security_alert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    pub severity: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signal_is_payload_free() {
        let id = ResourceId::new("acc-1").unwrap();
        let event = DomainEvent::signal(WALLET_UPDATED, &id);

        assert_eq!(event.event_type, "wallet-updated");
        assert_eq!(event.payload, json!({}));
        assert_eq!(event.resource_id, Some(id));
        assert!(event.occurred_at.is_none());
    }

    #[test]
    fn payload_as_reads_camel_case_balance() {
        let event = DomainEvent::new(BALANCE_UPDATE, json!({ "newBalance": 9500 }));
        let update: BalanceUpdate = event.payload_as().unwrap();

        assert_eq!(update.new_balance, 9500.0);
        assert!(update.currency.is_none());
    }

    #[test]
    fn transaction_record_tolerates_missing_optional_fields() {
        let record: TransactionRecord = serde_json::from_value(json!({ "amount": 500 })).unwrap();
        assert_eq!(record.amount, 500.0);
        assert!(record.id.is_none());
    }

    #[test]
    fn transaction_record_requires_amount() {
        let result: Result<TransactionRecord, _> =
            serde_json::from_value(json!({ "id": "tx-1" }));
        assert!(result.is_err());
    }

    #[test]
    fn mutation_signals_cover_all_coarse_signals() {
        assert_eq!(MUTATION_SIGNALS.len(), 3);
        assert!(MUTATION_SIGNALS.contains(&RESOURCE_MUTATED));
    }
}
