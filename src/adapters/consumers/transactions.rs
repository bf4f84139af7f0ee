//! TransactionFeed - Most-recent-first list of one account's transactions.
//!
//! `transaction_added` prepends the record unless a record with the same id
//! is already listed. `transaction-completed` asks for a full refetch. Both
//! only count when they name this feed's account.

use std::sync::{Arc, PoisonError, RwLock};

use crate::adapters::events::WatermarkGuard;
use crate::domain::foundation::{DomainError, ResourceId};
use crate::domain::sync::{
    DomainEvent, TransactionRecord, TRANSACTION_ADDED, TRANSACTION_COMPLETED,
};
use crate::ports::{EventHandler, EventSubscriber, Refetch, Subscription};

use super::InvalidationAdapter;

struct FeedDelta {
    resource_id: ResourceId,
    records: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl EventHandler for FeedDelta {
    fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        if event.resource_id.as_ref() != Some(&self.resource_id) {
            return Ok(());
        }
        let record: TransactionRecord = event.payload_as()?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);

        let already_listed = record
            .id
            .as_ref()
            .is_some_and(|id| records.iter().any(|r| r.id.as_ref() == Some(id)));
        if already_listed {
            tracing::debug!(id = ?record.id, "Transaction already listed");
            return Ok(());
        }

        records.insert(0, record);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TransactionFeed"
    }
}

/// Transaction list attached to the bus.
pub struct TransactionFeed {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
    delta: Subscription,
    invalidation: InvalidationAdapter,
}

impl TransactionFeed {
    pub fn attach(
        bus: &dyn EventSubscriber,
        resource_id: ResourceId,
        refetch: Arc<dyn Refetch>,
    ) -> Self {
        let records = Arc::new(RwLock::new(Vec::new()));
        let delta = bus.subscribe(
            TRANSACTION_ADDED,
            Arc::new(WatermarkGuard::new(FeedDelta {
                resource_id: resource_id.clone(),
                records: records.clone(),
            })),
        );
        let invalidation =
            InvalidationAdapter::attach_for(bus, resource_id, &[TRANSACTION_COMPLETED], refetch);

        Self {
            records,
            delta,
            invalidation,
        }
    }

    pub fn records(&self) -> Vec<TransactionRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install the result of a full refetch, newest first.
    pub fn replace(&self, records: Vec<TransactionRecord>) {
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = records;
    }

    pub fn detach(&self) {
        self.delta.unsubscribe();
        self.invalidation.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::domain::foundation::Timestamp;
    use crate::ports::EventPublisher;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRefetch {
        count: AtomicUsize,
    }

    impl Refetch for CountingRefetch {
        fn request_refetch(&self, _reason: &str) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn account() -> ResourceId {
        ResourceId::new("acc-1").unwrap()
    }

    fn added(seconds: i64, id: &str, amount: f64) -> DomainEvent {
        let at = Timestamp::parse_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .plus_millis(seconds * 1000);
        DomainEvent::new(TRANSACTION_ADDED, json!({ "id": id, "amount": amount }))
            .occurred_at(at)
            .for_resource(account())
    }

    fn ids(feed: &TransactionFeed) -> Vec<String> {
        feed.records()
            .into_iter()
            .filter_map(|r| r.id)
            .collect()
    }

    #[test]
    fn new_transactions_are_prepended() {
        let bus = InMemoryEventBus::new();
        let feed = TransactionFeed::attach(&bus, account(), Arc::new(CountingRefetch::default()));

        bus.emit(added(1, "t1", -5.0));
        bus.emit(added(2, "t2", -7.5));

        assert_eq!(ids(&feed), vec!["t2", "t1"]);
    }

    #[test]
    fn known_id_is_not_listed_twice() {
        let bus = InMemoryEventBus::new();
        let feed = TransactionFeed::attach(&bus, account(), Arc::new(CountingRefetch::default()));
        feed.replace(vec![TransactionRecord {
            id: Some("t1".to_string()),
            amount: -5.0,
            description: None,
            category: None,
            kind: None,
            created_at: None,
        }]);

        bus.emit(added(3, "t1", -5.0));

        assert_eq!(ids(&feed), vec!["t1"]);
    }

    #[test]
    fn completed_signal_requests_refetch() {
        let bus = InMemoryEventBus::new();
        let refetch = Arc::new(CountingRefetch::default());
        let _feed = TransactionFeed::attach(&bus, account(), refetch.clone());

        bus.emit(DomainEvent::signal(TRANSACTION_COMPLETED, &account()));
        bus.emit(DomainEvent::signal(TRANSACTION_COMPLETED, &account()));

        assert_eq!(refetch.count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn other_accounts_are_not_listed() {
        let bus = InMemoryEventBus::new();
        let feed = TransactionFeed::attach(&bus, account(), Arc::new(CountingRefetch::default()));
        let other = ResourceId::new("acc-2").unwrap();

        bus.emit(added(1, "t1", -5.0));
        bus.emit(added(5, "x1", -1.0).for_resource(other));
        bus.emit(added(3, "t2", -2.0));

        assert_eq!(ids(&feed), vec!["t2", "t1"]);
    }
}
