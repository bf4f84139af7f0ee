//! Consumer adapters - derived views fed by the event bus.
//!
//! Two kinds of consumer:
//! - **Invalidation** - on a coarse signal, refetch the whole view
//!   (`InvalidationAdapter` + `RefetchTask`)
//! - **Delta** - apply the event payload directly, behind a
//!   `WatermarkGuard` (`BalanceDisplay`, `TransactionFeed`)
//!
//! The analytics summary is invalidation-only:
//!
//! ```ignore
//! let summary = Arc::new(RefetchTask::spawn(SummaryLoader::new(api, account_id)));
//! let analytics = InvalidationAdapter::attach(bus.as_ref(), &ANALYTICS_SIGNALS, summary.clone());
//! ```

mod balance;
mod invalidation;
mod transactions;

pub use balance::{BalanceDisplay, BalanceView};
pub use invalidation::{InvalidationAdapter, RefetchTask};
pub use transactions::TransactionFeed;

use crate::domain::sync::{RESOURCE_MUTATED, TRANSACTION_COMPLETED, WALLET_UPDATED};

/// Signals that invalidate the analytics summary.
pub const ANALYTICS_SIGNALS: [&str; 3] = [WALLET_UPDATED, TRANSACTION_COMPLETED, RESOURCE_MUTATED];
