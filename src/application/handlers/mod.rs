//! Application handlers.
//!
//! Command handlers that orchestrate account mutations.

pub mod account;

pub use account::{CompleteTransferHandler, SaveExpenseCommand, SaveExpenseHandler};
