//! Sync domain - events, wire envelopes, and channel lifecycle values.

mod channel_state;
mod envelope;
mod events;
mod protocol;
mod watermark;

pub use channel_state::{ChannelState, ConnectionStatus};
pub use envelope::{
    decode_envelope, decode_text, decode_value, DecodeError, DecodedEvent, Envelope, SyncEvent,
};
pub use events::{
    BalanceUpdate, DomainEvent, LimitReset, SecurityAlert, TransactionRecord, BALANCE_UPDATE,
    LIMIT_RESET, MUTATION_SIGNALS, RESOURCE_MUTATED, SECURITY_ALERT, TRANSACTION_ADDED,
    TRANSACTION_COMPLETED, TYPED_EVENT_TYPES, WALLET_UPDATED,
};
pub use protocol::{ClientMessage, ControlMessage};
pub use watermark::DedupWatermark;
