//! AccountOperations port - REST operations that mutate account state.
//!
//! Implemented by the HTTP adapter in production and by fakes in tests.
//! Producers wrap these calls and emit invalidation signals on success.

use async_trait::async_trait;

use crate::domain::account::{Expense, ExpenseDraft, TransferCommand, TransferReceipt};
use crate::domain::foundation::{DomainError, ResourceId};

#[async_trait]
pub trait AccountOperations: Send + Sync {
    /// Execute a transfer out of `cmd.account_id`.
    async fn transfer(&self, cmd: &TransferCommand) -> Result<TransferReceipt, DomainError>;

    /// Record a new expense against the account.
    async fn create_expense(
        &self,
        account_id: &ResourceId,
        draft: &ExpenseDraft,
    ) -> Result<Expense, DomainError>;

    /// Replace the fields of an existing expense.
    async fn update_expense(
        &self,
        account_id: &ResourceId,
        expense_id: &str,
        draft: &ExpenseDraft,
    ) -> Result<Expense, DomainError>;
}
