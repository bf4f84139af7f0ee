//! CompleteTransferHandler - Command handler for transfers out of an account.

use std::sync::Arc;

use crate::domain::account::{TransferCommand, TransferReceipt};
use crate::domain::foundation::DomainError;
use crate::domain::sync::{DomainEvent, RESOURCE_MUTATED, TRANSACTION_COMPLETED, WALLET_UPDATED};
use crate::ports::{AccountOperations, EventPublisher};

/// Signals emitted after a successful transfer, in order.
const TRANSFER_SIGNALS: [&str; 3] = [WALLET_UPDATED, TRANSACTION_COMPLETED, RESOURCE_MUTATED];

/// Handler for completing transfers.
pub struct CompleteTransferHandler {
    operations: Arc<dyn AccountOperations>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CompleteTransferHandler {
    pub fn new(
        operations: Arc<dyn AccountOperations>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            operations,
            event_publisher,
        }
    }

    pub async fn handle(&self, cmd: TransferCommand) -> Result<TransferReceipt, DomainError> {
        // 1. Validate
        cmd.validate()?;

        // 2. Execute
        let receipt = self.operations.transfer(&cmd).await?;

        // 3. Signal views
        tracing::info!(
            resource_id = %cmd.account_id,
            transaction_id = %receipt.transaction_id,
            "Transfer completed"
        );
        self.event_publisher.emit_all(
            TRANSFER_SIGNALS
                .iter()
                .map(|signal| DomainEvent::signal(signal, &cmd.account_id))
                .collect(),
        );

        Ok(receipt)
    }
}
