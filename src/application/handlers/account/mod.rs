//! Account mutation handlers.
//!
//! Producers: each wraps a REST mutation and, on success, emits the coarse
//! signals that tell views to refetch.

mod complete_transfer;
mod save_expense;

pub use complete_transfer::CompleteTransferHandler;
pub use save_expense::{SaveExpenseCommand, SaveExpenseHandler};
