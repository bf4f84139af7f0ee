//! Domain layer - pure types with no I/O.
//!
//! - `foundation` - Identifiers, timestamps, errors, state machine trait
//! - `sync` - Bus events, wire envelopes, channel lifecycle, watermarks
//! - `account` - Account mutation commands handled by the REST collaborator

pub mod account;
pub mod foundation;
pub mod sync;
