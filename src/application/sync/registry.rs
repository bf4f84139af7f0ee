//! SupervisorRegistry - One supervisor per resource id per process.
//!
//! Views that show the same account share a single supervisor. Each view
//! holds a [`LiveUpdates`] handle; the supervisor is enabled on the first
//! `acquire` and disabled when the last handle is dropped.
//!
//! # Example
//!
//! ```ignore
//! let registry = SupervisorRegistry::new(deps, SupervisorConfig::default());
//! let live = registry.acquire(account_id)?;
//! let mut status = live.watch_status();
//! // ... when the view unmounts
//! drop(live);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::channel_supervisor::{ChannelSupervisor, SupervisorConfig, SyncDeps, SyncError};
use crate::domain::foundation::ResourceId;
use crate::domain::sync::{ChannelState, ConnectionStatus};

struct Entry {
    supervisor: Arc<ChannelSupervisor>,
    holders: usize,
}

/// Reference-counted owner of the process's supervisors.
pub struct SupervisorRegistry {
    deps: SyncDeps,
    config: SupervisorConfig,
    entries: Mutex<HashMap<ResourceId, Entry>>,
}

impl SupervisorRegistry {
    pub fn new(deps: SyncDeps, config: SupervisorConfig) -> Arc<Self> {
        Arc::new(Self {
            deps,
            config,
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Start (or join) live updates for a resource.
    pub fn acquire(self: &Arc<Self>, resource_id: ResourceId) -> Result<LiveUpdates, SyncError> {
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(&resource_id) {
            entry.holders += 1;
            tracing::debug!(%resource_id, holders = entry.holders, "Joined live updates");
            return Ok(LiveUpdates {
                registry: self.clone(),
                resource_id,
                supervisor: entry.supervisor.clone(),
            });
        }

        let supervisor = Arc::new(ChannelSupervisor::new(
            self.deps.clone(),
            self.config.clone(),
        ));
        supervisor.enable(resource_id.clone())?;
        entries.insert(
            resource_id.clone(),
            Entry {
                supervisor: supervisor.clone(),
                holders: 1,
            },
        );

        Ok(LiveUpdates {
            registry: self.clone(),
            resource_id,
            supervisor,
        })
    }

    /// Status of a resource's supervisor, if one is live.
    pub fn status(&self, resource_id: &ResourceId) -> Option<ConnectionStatus> {
        self.lock()
            .get(resource_id)
            .map(|entry| entry.supervisor.status())
    }

    /// Resource ids with at least one live handle.
    pub fn active_resources(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = self.lock().keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    fn release(&self, resource_id: &ResourceId) {
        let released = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(resource_id) else {
                return;
            };
            entry.holders = entry.holders.saturating_sub(1);
            if entry.holders > 0 {
                return;
            }
            entries.remove(resource_id)
        };

        if let Some(entry) = released {
            entry.supervisor.disable();
            tracing::debug!(%resource_id, "Last holder released live updates");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle keeping a resource's live updates running.
///
/// Dropping the last handle for a resource disables its supervisor.
pub struct LiveUpdates {
    registry: Arc<SupervisorRegistry>,
    resource_id: ResourceId,
    supervisor: Arc<ChannelSupervisor>,
}

impl LiveUpdates {
    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn state(&self) -> ChannelState {
        self.supervisor.state()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.supervisor.status()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.supervisor.watch_status()
    }

    pub fn is_polling(&self) -> bool {
        self.supervisor.is_polling()
    }
}

impl std::fmt::Debug for LiveUpdates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveUpdates")
            .field("resource_id", &self.resource_id)
            .field("state", &self.supervisor.state())
            .finish()
    }
}

impl Drop for LiveUpdates {
    fn drop(&mut self) {
        self.registry.release(&self.resource_id);
    }
}
