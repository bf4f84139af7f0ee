//! wallet-sync - follow one account's live updates from the command line.
//!
//! Reads configuration from `WALLET_SYNC__*` variables (and `.env`), takes
//! the account from `WALLET_SYNC_ACCOUNT_ID`, and logs every view change
//! until Ctrl-C.

use std::sync::Arc;

use secrecy::ExposeSecret;
use wallet_sync::adapters::{
    AccountApiConfig, BalanceDisplay, HttpAccountApi, InMemoryEventBus, InvalidationAdapter,
    StaticTokenProvider, TransactionFeed, WebSocketChannel, ANALYTICS_SIGNALS,
};
use wallet_sync::application::{SupervisorRegistry, SyncDeps};
use wallet_sync::config::AppConfig;
use wallet_sync::domain::foundation::ResourceId;
use wallet_sync::domain::sync::{DomainEvent, BALANCE_UPDATE, TRANSACTION_ADDED};
use wallet_sync::ports::{handler_fn, EventSubscriber, Refetch};

/// Stand-in for a view loader: records that a refetch was requested.
struct LoggedRefetch {
    view: &'static str,
}

impl Refetch for LoggedRefetch {
    fn request_refetch(&self, reason: &str) {
        tracing::info!(view = self.view, reason, "Refetch requested");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    wallet_sync::telemetry::init(&config.telemetry)?;

    let account_id = ResourceId::new(std::env::var("WALLET_SYNC_ACCOUNT_ID")?)?;

    let tokens = Arc::new(match &config.endpoints.access_token {
        Some(token) => StaticTokenProvider::new(token.expose_secret().clone()),
        None => StaticTokenProvider::signed_out(),
    });
    let api = Arc::new(HttpAccountApi::new(
        AccountApiConfig::new(&config.endpoints.api_base_url)
            .with_timeout(config.endpoints.request_timeout()),
        tokens.clone(),
    )?);
    let channel = Arc::new(WebSocketChannel::new(
        &config.endpoints.ws_url,
        config.endpoints.request_timeout(),
    ));
    let bus = Arc::new(InMemoryEventBus::new());

    let balance = BalanceDisplay::attach(
        bus.as_ref(),
        account_id.clone(),
        Arc::new(LoggedRefetch { view: "balance" }),
    );
    let feed = TransactionFeed::attach(
        bus.as_ref(),
        account_id.clone(),
        Arc::new(LoggedRefetch { view: "transactions" }),
    );
    let analytics = InvalidationAdapter::attach(
        bus.as_ref(),
        &ANALYTICS_SIGNALS,
        Arc::new(LoggedRefetch { view: "analytics" }),
    );
    let log_views = bus.subscribe_all(
        &[BALANCE_UPDATE, TRANSACTION_ADDED],
        handler_fn("cli-log", |event: &DomainEvent| {
            tracing::info!(event_type = %event.event_type, payload = %event.payload, "Account event");
            Ok(())
        }),
    );

    let registry = SupervisorRegistry::new(
        SyncDeps {
            bus: bus.clone(),
            channel,
            updates: api,
            tokens,
        },
        config.sync.supervisor_config(),
    );
    let live = registry.acquire(account_id.clone())?;
    let mut status = live.watch_status();

    tracing::info!(%account_id, "Following live updates, Ctrl-C to stop");
    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                tracing::info!(
                    is_connected = current.is_connected,
                    last_update_at = ?current.last_update_at,
                    balance = ?balance.current().balance,
                    transactions = feed.records().len(),
                    "Status changed"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    drop(live);
    analytics.detach();
    balance.detach();
    feed.detach();
    for subscription in &log_views {
        subscription.unsubscribe();
    }
    Ok(())
}
