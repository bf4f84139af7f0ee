//! Invalidation consumers - turn coarse signals into full refetches.
//!
//! ```text
//! bus ──wallet-updated──► InvalidationAdapter ──request_refetch──► RefetchTask
//!                                                                     │
//!                                                   ViewLoader::load ◄┘ (spawned)
//!                                                                     │
//!                                                     watch::Sender ◄─┘
//! ```
//!
//! Requests arriving while a load is in flight collapse into one follow-up
//! load.

use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::domain::foundation::{DomainError, ResourceId};
use crate::domain::sync::DomainEvent;
use crate::ports::{EventHandler, EventSubscriber, Refetch, Subscription, ViewLoader};

struct RefetchOnSignal {
    refetch: Arc<dyn Refetch>,
    resource_id: Option<ResourceId>,
}

impl EventHandler for RefetchOnSignal {
    fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        if let Some(resource_id) = &self.resource_id {
            if event.resource_id.as_ref() != Some(resource_id) {
                return Ok(());
            }
        }
        self.refetch.request_refetch(&event.event_type);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "InvalidationAdapter"
    }
}

/// Subscribes a `Refetch` trigger to a set of signals.
#[derive(Debug)]
pub struct InvalidationAdapter {
    subscriptions: Vec<Subscription>,
}

impl InvalidationAdapter {
    /// Refetch on the given signals, whichever resource they name.
    pub fn attach(
        bus: &dyn EventSubscriber,
        signals: &[&str],
        refetch: Arc<dyn Refetch>,
    ) -> Self {
        Self::register(bus, signals, refetch, None)
    }

    /// Refetch only on signals for `resource_id`.
    pub fn attach_for(
        bus: &dyn EventSubscriber,
        resource_id: ResourceId,
        signals: &[&str],
        refetch: Arc<dyn Refetch>,
    ) -> Self {
        Self::register(bus, signals, refetch, Some(resource_id))
    }

    fn register(
        bus: &dyn EventSubscriber,
        signals: &[&str],
        refetch: Arc<dyn Refetch>,
        resource_id: Option<ResourceId>,
    ) -> Self {
        let handler: Arc<dyn EventHandler> = Arc::new(RefetchOnSignal {
            refetch,
            resource_id,
        });
        Self {
            subscriptions: bus.subscribe_all(signals, handler),
        }
    }

    /// Event types this adapter listens to.
    pub fn signals(&self) -> Vec<&str> {
        self.subscriptions.iter().map(|s| s.event_type()).collect()
    }

    /// Remove every registration. Idempotent.
    pub fn detach(&self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

/// Background reloader for one derived view.
///
/// Implements `Refetch`, so it can be handed straight to an
/// [`InvalidationAdapter`]. The first load starts immediately. Must be
/// created inside a tokio runtime.
pub struct RefetchTask<L: ViewLoader> {
    trigger: Arc<Notify>,
    view: watch::Receiver<Option<L::View>>,
    worker: JoinHandle<()>,
}

impl<L: ViewLoader> RefetchTask<L> {
    pub fn spawn(loader: L) -> Self {
        let trigger = Arc::new(Notify::new());
        let (tx, view) = watch::channel(None);

        trigger.notify_one();
        let worker = tokio::spawn(reload_loop(loader, trigger.clone(), tx));

        Self {
            trigger,
            view,
            worker,
        }
    }

    /// Most recently loaded view, if any load has succeeded.
    pub fn current(&self) -> Option<L::View> {
        self.view.borrow().clone()
    }

    /// Receiver notified after every successful load.
    pub fn subscribe(&self) -> watch::Receiver<Option<L::View>> {
        self.view.clone()
    }
}

impl<L: ViewLoader> Refetch for RefetchTask<L> {
    fn request_refetch(&self, reason: &str) {
        tracing::trace!(reason, "Refetch requested");
        self.trigger.notify_one();
    }
}

impl<L: ViewLoader> Drop for RefetchTask<L> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn reload_loop<L: ViewLoader>(
    loader: L,
    trigger: Arc<Notify>,
    tx: watch::Sender<Option<L::View>>,
) {
    loop {
        trigger.notified().await;
        match loader.load().await {
            Ok(view) => {
                tx.send_replace(Some(view));
                tracing::debug!(loader = loader.name(), "View reloaded");
            }
            Err(e) => {
                tracing::warn!(loader = loader.name(), error = %e, "View reload failed, keeping previous view");
            }
        }
    }
}
