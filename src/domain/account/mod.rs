//! Account mutations performed by the REST collaborator.
//!
//! These are the inputs and outputs of the operations that change account
//! state server-side. The sync subsystem only cares that they succeeded.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ResourceId, ValidationError};

/// Move money out of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCommand {
    #[serde(skip)]
    pub account_id: ResourceId,
    pub destination: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransferCommand {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_amount(self.amount)?;
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(ValidationError::empty_field("destination"));
        }
        if destination == self.account_id.as_str() {
            return Err(ValidationError::invalid_format(
                "destination",
                "cannot transfer to the source account",
            ));
        }
        Ok(())
    }
}

/// Server acknowledgement of a completed transfer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub transaction_id: String,
    #[serde(default)]
    pub new_balance: Option<f64>,
}

/// Fields of an expense as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub amount: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_at: Option<String>,
}

impl ExpenseDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_amount(self.amount)?;
        if self.category.trim().is_empty() {
            return Err(ValidationError::empty_field("category"));
        }
        Ok(())
    }
}

/// An expense as stored by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::not_positive("amount", amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> ResourceId {
        ResourceId::new("acc-1").unwrap()
    }

    fn transfer(destination: &str, amount: f64) -> TransferCommand {
        TransferCommand {
            account_id: account(),
            destination: destination.to_string(),
            amount,
            note: None,
        }
    }

    #[test]
    fn valid_transfer_passes() {
        assert!(transfer("acc-2", 10.0).validate().is_ok());
    }

    #[test]
    fn transfer_rejects_non_positive_and_nan_amounts() {
        assert!(transfer("acc-2", 0.0).validate().is_err());
        assert!(transfer("acc-2", -1.0).validate().is_err());
        assert!(transfer("acc-2", f64::NAN).validate().is_err());
    }

    #[test]
    fn transfer_rejects_self_and_empty_destination() {
        assert!(transfer("acc-1", 5.0).validate().is_err());
        assert!(transfer("  ", 5.0).validate().is_err());
    }

    #[test]
    fn transfer_serializes_without_account_id() {
        let json = serde_json::to_value(transfer("acc-2", 5.0)).unwrap();
        assert!(json.get("accountId").is_none());
        assert_eq!(json["destination"], "acc-2");
    }

    #[test]
    fn expense_requires_category() {
        let draft = ExpenseDraft {
            amount: 12.0,
            category: "".to_string(),
            description: None,
            spent_at: None,
        };
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::EmptyField { .. })
        ));
    }
}
