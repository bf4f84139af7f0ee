//! FallbackPoller - Fixed-interval pull of envelopes while the primary
//! channel is unavailable or not yet stable.
//!
//! ## Cycle
//!
//! 1. Ask the target for its cursor (latest applied envelope timestamp)
//! 2. `UpdateSource::fetch_since(resource_id, cursor)`
//! 3. Hand each raw envelope to the target, in array order
//!
//! A failed request is logged and the loop waits for the next tick. The
//! first tick fires as soon as the poller starts.
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 10s | Time between fetches |

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::foundation::{ResourceId, Timestamp};
use crate::ports::{TransportError, UpdateSource};

/// Receiver of polled envelopes.
///
/// The supervisor implements this for one enable epoch; once the epoch is
/// superseded `is_current` turns false and the poller stops delivering.
pub trait PollTarget: Send + Sync {
    /// Timestamp to pass as `since`.
    fn cursor(&self) -> Option<Timestamp>;

    /// False once the owner has been disabled or re-enabled.
    fn is_current(&self) -> bool;

    /// Apply one raw envelope. Returns true if it reached the bus.
    fn deliver(&self, raw: JsonValue) -> bool;
}

/// Background loop that pulls envelopes from an `UpdateSource`.
pub struct FallbackPoller {
    source: Arc<dyn UpdateSource>,
    poll_interval: Duration,
}

impl FallbackPoller {
    pub fn new(source: Arc<dyn UpdateSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
        }
    }

    /// Poll until the target stops being current.
    ///
    /// The owning task is normally aborted before that happens; the check
    /// covers the window between a disable and the abort landing.
    pub async fn run(&self, resource_id: &ResourceId, target: &dyn PollTarget) {
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if !target.is_current() {
                return;
            }

            match self.poll_once(resource_id, target).await {
                Ok(applied) => {
                    tracing::debug!(%resource_id, applied, "Fallback poll completed");
                }
                Err(e) => {
                    tracing::warn!(%resource_id, error = %e, "Fallback poll failed, retrying next interval");
                }
            }
        }
    }

    /// Run exactly one poll cycle.
    ///
    /// Returns the number of envelopes that reached the bus.
    pub async fn poll_once(
        &self,
        resource_id: &ResourceId,
        target: &dyn PollTarget,
    ) -> Result<usize, TransportError> {
        let since = target.cursor();
        let batch = self.source.fetch_since(resource_id, since).await?;
        let mut applied = 0;

        for raw in batch {
            if !target.is_current() {
                break;
            }
            if target.deliver(raw) {
                applied += 1;
            }
        }

        Ok(applied)
    }
}
