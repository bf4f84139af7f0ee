//! Application layer - Handlers and live update orchestration.
//!
//! This layer coordinates between ports. `sync` keeps views fed with
//! account events; `handlers` performs mutations and signals the views.

pub mod handlers;
pub mod sync;

pub use handlers::{CompleteTransferHandler, SaveExpenseCommand, SaveExpenseHandler};
pub use sync::{
    ChannelSupervisor, FallbackPoller, LiveUpdates, PollTarget, SupervisorConfig,
    SupervisorRegistry, SyncDeps, SyncError,
};
