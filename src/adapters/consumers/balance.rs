//! BalanceDisplay - Current balance shown for one account.
//!
//! Applies that account's `balance_update` deltas directly (through a
//! `WatermarkGuard`, so an older balance never overwrites a newer one) and
//! asks for a full refetch on its `wallet-updated` signal. Events for other
//! accounts on the same bus are ignored.

use std::sync::{Arc, PoisonError, RwLock};

use crate::adapters::events::WatermarkGuard;
use crate::domain::foundation::{DomainError, ResourceId};
use crate::domain::sync::{BalanceUpdate, DomainEvent, BALANCE_UPDATE, WALLET_UPDATED};
use crate::ports::{EventHandler, EventSubscriber, Refetch, Subscription};

use super::InvalidationAdapter;

/// What the balance view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceView {
    pub balance: Option<f64>,
    pub currency: Option<String>,
}

struct BalanceDelta {
    resource_id: ResourceId,
    view: Arc<RwLock<BalanceView>>,
}

impl EventHandler for BalanceDelta {
    fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        if event.resource_id.as_ref() != Some(&self.resource_id) {
            return Ok(());
        }
        let update: BalanceUpdate = event.payload_as()?;
        let mut view = self.view.write().unwrap_or_else(PoisonError::into_inner);
        view.balance = Some(update.new_balance);
        if update.currency.is_some() {
            view.currency = update.currency;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "BalanceDisplay"
    }
}

/// Balance view attached to the bus.
pub struct BalanceDisplay {
    view: Arc<RwLock<BalanceView>>,
    delta: Subscription,
    invalidation: InvalidationAdapter,
}

impl BalanceDisplay {
    pub fn attach(
        bus: &dyn EventSubscriber,
        resource_id: ResourceId,
        refetch: Arc<dyn Refetch>,
    ) -> Self {
        let view = Arc::new(RwLock::new(BalanceView::default()));
        let delta = bus.subscribe(
            BALANCE_UPDATE,
            Arc::new(WatermarkGuard::new(BalanceDelta {
                resource_id: resource_id.clone(),
                view: view.clone(),
            })),
        );
        let invalidation =
            InvalidationAdapter::attach_for(bus, resource_id, &[WALLET_UPDATED], refetch);

        Self {
            view,
            delta,
            invalidation,
        }
    }

    pub fn current(&self) -> BalanceView {
        self.view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install the result of a full refetch.
    pub fn replace(&self, view: BalanceView) {
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = view;
    }

    pub fn detach(&self) {
        self.delta.unsubscribe();
        self.invalidation.detach();
    }
}
