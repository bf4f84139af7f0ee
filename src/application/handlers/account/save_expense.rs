//! SaveExpenseHandler - Creates or edits an expense and signals the views.

use std::sync::Arc;

use crate::domain::account::{Expense, ExpenseDraft};
use crate::domain::foundation::{DomainError, ResourceId, ValidationError};
use crate::domain::sync::{DomainEvent, RESOURCE_MUTATED, WALLET_UPDATED};
use crate::ports::{AccountOperations, EventPublisher};

const EXPENSE_SIGNALS: [&str; 2] = [WALLET_UPDATED, RESOURCE_MUTATED];

/// Save an expense; `expense_id` selects update over create.
#[derive(Debug, Clone)]
pub struct SaveExpenseCommand {
    pub account_id: ResourceId,
    pub expense_id: Option<String>,
    pub draft: ExpenseDraft,
}

impl SaveExpenseCommand {
    pub fn create(account_id: ResourceId, draft: ExpenseDraft) -> Self {
        Self {
            account_id,
            expense_id: None,
            draft,
        }
    }

    pub fn update(account_id: ResourceId, expense_id: impl Into<String>, draft: ExpenseDraft) -> Self {
        Self {
            account_id,
            expense_id: Some(expense_id.into()),
            draft,
        }
    }
}

/// Handler for saving expenses.
pub struct SaveExpenseHandler {
    operations: Arc<dyn AccountOperations>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl SaveExpenseHandler {
    pub fn new(
        operations: Arc<dyn AccountOperations>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            operations,
            event_publisher,
        }
    }

    pub async fn create(
        &self,
        account_id: ResourceId,
        draft: ExpenseDraft,
    ) -> Result<Expense, DomainError> {
        self.handle(SaveExpenseCommand::create(account_id, draft)).await
    }

    pub async fn update(
        &self,
        account_id: ResourceId,
        expense_id: impl Into<String>,
        draft: ExpenseDraft,
    ) -> Result<Expense, DomainError> {
        self.handle(SaveExpenseCommand::update(account_id, expense_id, draft))
            .await
    }

    pub async fn handle(&self, cmd: SaveExpenseCommand) -> Result<Expense, DomainError> {
        cmd.draft.validate()?;

        let expense = match &cmd.expense_id {
            Some(expense_id) => {
                if expense_id.trim().is_empty() {
                    return Err(ValidationError::empty_field("expense_id").into());
                }
                self.operations
                    .update_expense(&cmd.account_id, expense_id, &cmd.draft)
                    .await?
            }
            None => {
                self.operations
                    .create_expense(&cmd.account_id, &cmd.draft)
                    .await?
            }
        };

        tracing::info!(
            resource_id = %cmd.account_id,
            expense_id = %expense.id,
            updated = cmd.expense_id.is_some(),
            "Expense saved"
        );
        self.event_publisher.emit_all(
            EXPENSE_SIGNALS
                .iter()
                .map(|signal| DomainEvent::signal(signal, &cmd.account_id))
                .collect(),
        );

        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{TransferCommand, TransferReceipt};
    use crate::domain::foundation::ErrorCode;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAccountOperations {
        missing_expense: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockAccountOperations {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AccountOperations for MockAccountOperations {
        async fn transfer(&self, _cmd: &TransferCommand) -> Result<TransferReceipt, DomainError> {
            unimplemented!()
        }

        async fn create_expense(
            &self,
            _account_id: &ResourceId,
            draft: &ExpenseDraft,
        ) -> Result<Expense, DomainError> {
            self.calls.lock().unwrap().push("create".to_string());
            Ok(Expense {
                id: "exp-new".to_string(),
                amount: draft.amount,
                category: draft.category.clone(),
                description: draft.description.clone(),
            })
        }

        async fn update_expense(
            &self,
            _account_id: &ResourceId,
            expense_id: &str,
            draft: &ExpenseDraft,
        ) -> Result<Expense, DomainError> {
            self.calls.lock().unwrap().push(format!("update:{}", expense_id));
            if self.missing_expense {
                return Err(DomainError::new(ErrorCode::ExpenseNotFound, "no such expense"));
            }
            Ok(Expense {
                id: expense_id.to_string(),
                amount: draft.amount,
                category: draft.category.clone(),
                description: draft.description.clone(),
            })
        }
    }

    #[derive(Default)]
    struct MockEventPublisher {
        emitted: Mutex<Vec<DomainEvent>>,
    }

    impl EventPublisher for MockEventPublisher {
        fn emit(&self, event: DomainEvent) {
            self.emitted.lock().unwrap().push(event);
        }
    }

    fn account() -> ResourceId {
        ResourceId::new("acc-1").unwrap()
    }

    fn draft(amount: f64) -> ExpenseDraft {
        ExpenseDraft {
            amount,
            category: "groceries".to_string(),
            description: Some("weekly shop".to_string()),
            spent_at: None,
        }
    }

    #[tokio::test]
    async fn create_emits_wallet_and_resource_signals() {
        let ops = Arc::new(MockAccountOperations::default());
        let publisher = Arc::new(MockEventPublisher::default());
        let handler = SaveExpenseHandler::new(ops.clone(), publisher.clone());

        let expense = handler
            .handle(SaveExpenseCommand::create(account(), draft(42.5)))
            .await
            .unwrap();

        assert_eq!(expense.id, "exp-new");
        assert_eq!(ops.calls(), vec!["create"]);
        let types: Vec<String> = publisher
            .emitted
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type.clone())
            .collect();
        assert_eq!(types, vec!["wallet-updated", "resource-mutated"]);
    }

    #[tokio::test]
    async fn update_targets_the_given_expense() {
        let ops = Arc::new(MockAccountOperations::default());
        let publisher = Arc::new(MockEventPublisher::default());
        let handler = SaveExpenseHandler::new(ops.clone(), publisher.clone());

        let expense = handler
            .update(account(), "exp-9", draft(12.0))
            .await
            .unwrap();

        assert_eq!(expense.id, "exp-9");
        assert_eq!(ops.calls(), vec!["update:exp-9"]);
        assert_eq!(publisher.emitted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_update_emits_nothing() {
        let ops = Arc::new(MockAccountOperations {
            missing_expense: true,
            ..Default::default()
        });
        let publisher = Arc::new(MockEventPublisher::default());
        let handler = SaveExpenseHandler::new(ops, publisher.clone());

        let err = handler
            .handle(SaveExpenseCommand::update(account(), "exp-9", draft(12.0)))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ExpenseNotFound);
        assert!(publisher.emitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_without_api_call() {
        let ops = Arc::new(MockAccountOperations::default());
        let publisher = Arc::new(MockEventPublisher::default());
        let handler = SaveExpenseHandler::new(ops.clone(), publisher.clone());

        let mut bad = draft(5.0);
        bad.category = " ".to_string();
        let err = handler
            .handle(SaveExpenseCommand::create(account(), bad))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::EmptyField);
        assert!(ops.calls().is_empty());
        assert!(publisher.emitted.lock().unwrap().is_empty());
    }
}
