//! Live update delivery for account views.
//!
//! - `ChannelSupervisor` - Primary channel, grace timer, fallback poller and
//!   reconnection for one resource
//! - `FallbackPoller` - Fixed-interval pull used while the primary is down
//! - `SupervisorRegistry` - Shares supervisors between views, tears them down
//!   with the last holder

mod channel_supervisor;
mod poller;
mod registry;

pub use channel_supervisor::{ChannelSupervisor, SupervisorConfig, SyncDeps, SyncError};
pub use poller::{FallbackPoller, PollTarget};
pub use registry::{LiveUpdates, SupervisorRegistry};
