//! ChannelSupervisor - Keeps one resource's event stream flowing.
//!
//! Owns the primary push connection, a grace timer, the fallback poller and
//! a fixed-delay reconnect timer, and routes every envelope from either
//! channel through one decode → dedup → emit path.
//!
//! ## Lifecycle
//!
//! ```text
//! enable(id)
//!   ├─ connect task ──ok──► Connected ──N frames──► poller stopped
//!   │        │                  │
//!   │     failed            closed/error
//!   │        ▼                  ▼
//!   │   Reconnecting ◄──────────┘  (poller ensured, retry after delay)
//!   └─ grace timer ──expired, not Connected──► poller started
//! disable() ──► every owned task aborted, Disconnected
//! ```
//!
//! ## Epochs
//!
//! Each `enable` captures a fresh epoch number and each `disable` bumps it.
//! Every asynchronous continuation carries the epoch it was spawned under
//! and re-checks it, under the state lock, before touching state or
//! emitting. Work from a superseded epoch therefore never reaches the bus.
//!
//! The state lock is never held across an `.await` or during `emit`, so bus
//! handlers may call back into the supervisor.
//!
//! ## Scheduling
//!
//! Supervisors run on a current-thread runtime. Admitting an envelope to
//! the watermark and emitting it happen with no `.await` in between, so on
//! one thread no other task can interleave: per-type emission order follows
//! admission order, and once `disable` returns nothing from the previous
//! epoch is mid-emit. `enable` refuses a multi-threaded runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value as JsonValue;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::poller::{FallbackPoller, PollTarget};
use crate::domain::foundation::{ResourceId, StateMachine, Timestamp};
use crate::domain::sync::{
    decode_text, decode_value, ChannelState, ClientMessage, ConnectionStatus, ControlMessage,
    DecodedEvent, DedupWatermark,
};
use crate::ports::{
    EventPublisher, PrimaryChannel, PushConnection, TokenProvider, TransportError, UpdateSource,
};

/// Errors returned by the supervisor's public operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// `enable` was called outside a tokio runtime
    #[error("No tokio runtime available to drive the channel")]
    NoRuntime,

    /// `enable` was called on a multi-threaded runtime
    #[error("Live updates need a current-thread runtime")]
    MultiThreadRuntime,
}

/// Timing and stability settings for one supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How long the primary channel may take to connect before polling starts.
    pub grace_period: Duration,

    /// Interval between fallback polls.
    pub poll_interval: Duration,

    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,

    /// Consecutive primary frames required before the poller is stopped.
    pub stability_threshold: u32,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(3),
            poll_interval: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            stability_threshold: 3,
        }
    }
}

impl SupervisorConfig {
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_stability_threshold(mut self, threshold: u32) -> Self {
        self.stability_threshold = threshold.max(1);
        self
    }
}

/// Ports a supervisor is wired to.
#[derive(Clone)]
pub struct SyncDeps {
    pub bus: Arc<dyn EventPublisher>,
    pub channel: Arc<dyn PrimaryChannel>,
    pub updates: Arc<dyn UpdateSource>,
    pub tokens: Arc<dyn TokenProvider>,
}

/// Background tasks owned by one enable epoch.
#[derive(Default)]
struct OwnedResources {
    connection: Option<JoinHandle<()>>,
    grace_timer: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl OwnedResources {
    /// Abort every owned task. Dropping the connection task drops its socket.
    fn close(&mut self) {
        let handles = [
            self.connection.take(),
            self.grace_timer.take(),
            self.reconnect_timer.take(),
            self.poller.take(),
        ];
        for handle in handles.into_iter().flatten() {
            handle.abort();
        }
    }

    fn stop_poller(&mut self) -> bool {
        match self.poller.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn poller_running(&self) -> bool {
        self.poller
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

struct Inner {
    state: ChannelState,
    resource_id: Option<ResourceId>,
    watermark: DedupWatermark,
    consecutive_primary: u32,
    resources: OwnedResources,
}

impl Inner {
    fn transition(&mut self, target: ChannelState) {
        if self.state == target {
            return;
        }
        match self.state.transition_to(target) {
            Ok(next) => self.state = next,
            Err(e) => {
                tracing::warn!(from = ?self.state, to = ?target, error = %e, "Ignoring invalid channel transition");
            }
        }
    }
}

struct Shared {
    deps: SyncDeps,
    config: SupervisorConfig,
    epoch: AtomicU64,
    inner: Mutex<Inner>,
    status: watch::Sender<ConnectionStatus>,
}

/// Supervises the live event stream for one resource at a time.
///
/// Must be enabled from a current-thread tokio runtime. Dropping the
/// supervisor disables it.
pub struct ChannelSupervisor {
    shared: Arc<Shared>,
}

impl ChannelSupervisor {
    pub fn new(deps: SyncDeps, config: SupervisorConfig) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::default());
        Self {
            shared: Arc::new(Shared {
                deps,
                config,
                epoch: AtomicU64::new(0),
                inner: Mutex::new(Inner {
                    state: ChannelState::Disconnected,
                    resource_id: None,
                    watermark: DedupWatermark::new(),
                    consecutive_primary: 0,
                    resources: OwnedResources::default(),
                }),
                status,
            }),
        }
    }

    /// Start delivering events for `resource_id`.
    ///
    /// Enabling the id that is already enabled does nothing. Enabling a
    /// different id disables the current one first and starts from an
    /// empty watermark.
    pub fn enable(&self, resource_id: ResourceId) -> Result<(), SyncError> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        if runtime.runtime_flavor() != RuntimeFlavor::CurrentThread {
            return Err(SyncError::MultiThreadRuntime);
        }

        let mut inner = self.shared.lock();
        if inner.state.is_enabled() {
            if inner.resource_id.as_ref() == Some(&resource_id) {
                tracing::debug!(%resource_id, "Supervisor already enabled");
                return Ok(());
            }
            drop(inner);
            self.disable();
            inner = self.shared.lock();
        }

        if inner.resource_id.as_ref() != Some(&resource_id) {
            inner.watermark = DedupWatermark::new();
            inner.resource_id = Some(resource_id.clone());
        }

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        inner.transition(ChannelState::Connecting);
        inner.consecutive_primary = 0;

        inner.resources.connection = Some(runtime.spawn(run_connection(
            self.shared.clone(),
            epoch,
            resource_id.clone(),
        )));
        inner.resources.grace_timer =
            Some(runtime.spawn(run_grace_timer(self.shared.clone(), epoch)));

        tracing::info!(%resource_id, epoch, "Live updates enabled");
        Ok(())
    }

    /// Stop delivering events. Safe to call at any time, any number of times.
    ///
    /// When this returns no further event from the previous epoch will be
    /// emitted and every timer, poller and socket has been released.
    pub fn disable(&self) {
        let mut inner = self.shared.lock();
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let was_enabled = inner.state.is_enabled();

        inner.resources.close();
        inner.transition(ChannelState::Disconnected);
        inner.consecutive_primary = 0;
        drop(inner);

        self.shared
            .status
            .send_modify(|status| status.is_connected = false);

        if was_enabled {
            tracing::info!(epoch, "Live updates disabled");
        }
    }

    pub fn state(&self) -> ChannelState {
        self.shared.lock().state
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    pub fn resource_id(&self) -> Option<ResourceId> {
        self.shared.lock().resource_id.clone()
    }

    /// True while the fallback poller task is alive.
    pub fn is_polling(&self) -> bool {
        self.shared.lock().resources.poller_running()
    }
}

impl Drop for ChannelSupervisor {
    fn drop(&mut self) {
        self.disable();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks state, but only if `epoch` is still the live one.
    fn lock_current(&self, epoch: u64) -> Option<MutexGuard<'_, Inner>> {
        let inner = self.lock();
        (self.epoch.load(Ordering::SeqCst) == epoch).then_some(inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Returns false if the connection should be dropped as stale.
    fn on_connected(&self, epoch: u64, resource_id: &ResourceId) -> bool {
        let Some(mut inner) = self.lock_current(epoch) else {
            return false;
        };
        inner.transition(ChannelState::Connected);
        inner.consecutive_primary = 0;
        if let Some(grace_timer) = inner.resources.grace_timer.take() {
            grace_timer.abort();
        }
        drop(inner);

        self.status.send_modify(|status| status.is_connected = true);
        tracing::info!(%resource_id, epoch, "Primary channel connected");
        true
    }

    /// Returns false if the reader should stop.
    fn on_primary_frame(self: &Arc<Self>, epoch: u64, resource_id: &ResourceId, frame: &str) -> bool {
        {
            let Some(mut inner) = self.lock_current(epoch) else {
                return false;
            };
            inner.consecutive_primary = inner.consecutive_primary.saturating_add(1);
            if inner.consecutive_primary >= self.config.stability_threshold
                && inner.resources.stop_poller()
            {
                tracing::info!(
                    %resource_id,
                    messages = inner.consecutive_primary,
                    "Primary channel stable, fallback poller stopped"
                );
            }
        }

        if let Some(control) = ControlMessage::parse(frame) {
            match control {
                ControlMessage::Error { code, message } => {
                    tracing::warn!(%resource_id, ?code, ?message, "Primary channel reported an error");
                }
                other => {
                    tracing::debug!(%resource_id, frame = ?other, "Primary control frame");
                }
            }
            return true;
        }

        match decode_text(frame) {
            Ok(decoded) => {
                self.apply(epoch, decoded, "primary");
            }
            Err(e) => {
                tracing::warn!(%resource_id, error = %e, "Dropping undecodable primary envelope");
            }
        }
        self.is_current(epoch)
    }

    fn on_primary_lost(
        self: &Arc<Self>,
        epoch: u64,
        resource_id: &ResourceId,
        error: Option<TransportError>,
    ) {
        let Some(mut inner) = self.lock_current(epoch) else {
            return;
        };
        match &error {
            Some(e) => tracing::warn!(%resource_id, error = %e, "Primary channel failed"),
            None => tracing::warn!(%resource_id, "Primary channel closed by server"),
        }

        inner.transition(ChannelState::Reconnecting);
        inner.consecutive_primary = 0;
        inner.resources.connection = None;
        self.ensure_poller(&mut inner, epoch, resource_id);
        self.schedule_reconnect(&mut inner, epoch);
        drop(inner);

        self.status.send_modify(|status| status.is_connected = false);
    }

    fn on_connect_failed(self: &Arc<Self>, epoch: u64, resource_id: &ResourceId, error: TransportError) {
        let Some(mut inner) = self.lock_current(epoch) else {
            return;
        };
        tracing::warn!(
            %resource_id,
            error = %error,
            retry_in = ?self.config.reconnect_delay,
            "Primary connect failed"
        );

        inner.transition(ChannelState::Reconnecting);
        inner.resources.connection = None;
        self.schedule_reconnect(&mut inner, epoch);
    }

    fn on_grace_expired(self: &Arc<Self>, epoch: u64) {
        let Some(mut inner) = self.lock_current(epoch) else {
            return;
        };
        inner.resources.grace_timer = None;
        if inner.state.is_connected() {
            return;
        }
        let Some(resource_id) = inner.resource_id.clone() else {
            return;
        };

        tracing::info!(%resource_id, "Primary not connected within grace period, starting fallback poller");
        self.ensure_poller(&mut inner, epoch, &resource_id);
    }

    fn on_reconnect_due(self: &Arc<Self>, epoch: u64) {
        let Some(mut inner) = self.lock_current(epoch) else {
            return;
        };
        inner.resources.reconnect_timer = None;
        let Some(resource_id) = inner.resource_id.clone() else {
            return;
        };

        tracing::debug!(%resource_id, epoch, "Attempting primary reconnect");
        inner.resources.connection =
            Some(tokio::spawn(run_connection(self.clone(), epoch, resource_id)));
    }

    fn ensure_poller(self: &Arc<Self>, inner: &mut Inner, epoch: u64, resource_id: &ResourceId) {
        if inner.resources.poller_running() {
            return;
        }

        let poller = FallbackPoller::new(self.deps.updates.clone(), self.config.poll_interval);
        let target = EpochTarget {
            shared: self.clone(),
            epoch,
        };
        let resource_id = resource_id.clone();
        inner.resources.poller = Some(tokio::spawn(async move {
            poller.run(&resource_id, &target).await;
        }));
    }

    fn schedule_reconnect(self: &Arc<Self>, inner: &mut Inner, epoch: u64) {
        if let Some(previous) = inner.resources.reconnect_timer.take() {
            previous.abort();
        }

        let shared = self.clone();
        let delay = self.config.reconnect_delay;
        inner.resources.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.on_reconnect_due(epoch);
        }));
    }

    /// Dedup, advance the watermark and emit. Returns true if emitted.
    fn apply(&self, epoch: u64, decoded: DecodedEvent, source: &'static str) -> bool {
        let event = {
            let Some(mut inner) = self.lock_current(epoch) else {
                return false;
            };
            let Some(resource_id) = inner.resource_id.clone() else {
                return false;
            };
            if !inner
                .watermark
                .admit(decoded.event_type(), decoded.timestamp)
            {
                tracing::debug!(
                    %resource_id,
                    event_type = decoded.event_type(),
                    timestamp = %decoded.timestamp.to_rfc3339(),
                    source,
                    "Discarding duplicate or stale envelope"
                );
                return false;
            }
            decoded.into_domain_event(resource_id)
        };

        let emitted_at = event.emitted_at;
        self.status
            .send_modify(|status| status.last_update_at = Some(emitted_at));

        // No await between the epoch check above and the emit.
        if !self.is_current(epoch) {
            return false;
        }
        tracing::debug!(event_type = %event.event_type, source, "Emitting envelope");
        self.deps.bus.emit(event);
        true
    }
}

/// Poll target bound to one enable epoch.
struct EpochTarget {
    shared: Arc<Shared>,
    epoch: u64,
}

impl PollTarget for EpochTarget {
    fn cursor(&self) -> Option<Timestamp> {
        self.shared
            .lock_current(self.epoch)
            .and_then(|inner| inner.watermark.latest())
    }

    fn is_current(&self) -> bool {
        self.shared.is_current(self.epoch)
    }

    fn deliver(&self, raw: JsonValue) -> bool {
        match decode_value(raw) {
            Ok(decoded) => self.shared.apply(self.epoch, decoded, "poll"),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable polled envelope");
                false
            }
        }
    }
}

async fn run_grace_timer(shared: Arc<Shared>, epoch: u64) {
    tokio::time::sleep(shared.config.grace_period).await;
    shared.on_grace_expired(epoch);
}

/// Opens the primary channel, authenticates, and reads until it closes.
async fn run_connection(shared: Arc<Shared>, epoch: u64, resource_id: ResourceId) {
    let mut connection = match open_authenticated(&shared, &resource_id).await {
        Ok(connection) => connection,
        Err(e) => {
            shared.on_connect_failed(epoch, &resource_id, e);
            return;
        }
    };

    if !shared.on_connected(epoch, &resource_id) {
        connection.close().await;
        return;
    }

    loop {
        match connection.next_message().await {
            Some(Ok(frame)) => {
                if !shared.on_primary_frame(epoch, &resource_id, &frame) {
                    connection.close().await;
                    return;
                }
            }
            Some(Err(e)) => {
                shared.on_primary_lost(epoch, &resource_id, Some(e));
                return;
            }
            None => {
                shared.on_primary_lost(epoch, &resource_id, None);
                return;
            }
        }
    }
}

async fn open_authenticated(
    shared: &Shared,
    resource_id: &ResourceId,
) -> Result<Box<dyn PushConnection>, TransportError> {
    let token = shared
        .deps
        .tokens
        .access_token()
        .await
        .ok_or(TransportError::MissingToken)?;
    let handshake = ClientMessage::auth(&token)
        .to_frame()
        .map_err(|e| TransportError::Send(e.to_string()))?;

    let mut connection = shared.deps.channel.connect(resource_id).await?;
    connection.send(handshake).await?;
    Ok(connection)
}
