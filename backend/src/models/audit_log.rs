//! Audit trail model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;

/// Kind of administrative action recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AuditAction {
    Login,
    CreateUser,
    ChangeUserRole,
    DeleteUser,
    CreateCustomer,
    EditCustomer,
    DeleteCustomer,
    IncreaseBalance,
    WithdrawBalance,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "Login",
            AuditAction::CreateUser => "CreateUser",
            AuditAction::ChangeUserRole => "ChangeUserRole",
            AuditAction::DeleteUser => "DeleteUser",
            AuditAction::CreateCustomer => "CreateCustomer",
            AuditAction::EditCustomer => "EditCustomer",
            AuditAction::DeleteCustomer => "DeleteCustomer",
            AuditAction::IncreaseBalance => "IncreaseBalance",
            AuditAction::WithdrawBalance => "WithdrawBalance",
        }
    }

    /// Whether entries of this kind carry a monetary amount.
    pub fn moves_balance(&self) -> bool {
        matches!(self, AuditAction::IncreaseBalance | AuditAction::WithdrawBalance)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Login" => AuditAction::Login,
            "CreateUser" => AuditAction::CreateUser,
            "ChangeUserRole" => AuditAction::ChangeUserRole,
            "DeleteUser" => AuditAction::DeleteUser,
            "CreateCustomer" => AuditAction::CreateCustomer,
            "EditCustomer" => AuditAction::EditCustomer,
            "DeleteCustomer" => AuditAction::DeleteCustomer,
            "IncreaseBalance" => AuditAction::IncreaseBalance,
            "WithdrawBalance" => AuditAction::WithdrawBalance,
            other => {
                return Err(AppError::Internal(format!(
                    "Unknown audit action '{}'",
                    other
                )))
            }
        })
    }
}

impl TryFrom<String> for AuditAction {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Audit log entry. Append-only: never updated or deleted.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct AuditEntry {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub action: AuditAction,
    pub user_id: i32,
    pub customer_id: Option<i32>,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

/// Audit entry not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditDraft {
    pub action: AuditAction,
    pub user_id: i32,
    pub customer_id: Option<i32>,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

impl AuditDraft {
    pub fn new(action: AuditAction, user_id: i32) -> Self {
        Self {
            action,
            user_id,
            customer_id: None,
            amount: Decimal::ZERO,
            created_at: Utc::now(),
            description: String::new(),
        }
    }

    pub fn customer(mut self, customer_id: i32) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Acting user as resolved on an audit record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuditUser {
    pub id: i32,
    pub login: String,
    pub user_name: String,
}

/// Affected customer as resolved on an audit record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuditCustomer {
    pub id: i32,
    pub name: String,
    pub phone_last_four_digits: String,
}

/// Audit entry joined with the acting user and the affected customer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuditRecord {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub user: Option<AuditUser>,
    pub customer: Option<AuditCustomer>,
}

/// Filter for audit queries. Empty filter matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub user_id: Option<i32>,
    pub customer_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AuditAction; 9] = [
        AuditAction::Login,
        AuditAction::CreateUser,
        AuditAction::ChangeUserRole,
        AuditAction::DeleteUser,
        AuditAction::CreateCustomer,
        AuditAction::EditCustomer,
        AuditAction::DeleteCustomer,
        AuditAction::IncreaseBalance,
        AuditAction::WithdrawBalance,
    ];

    #[test]
    fn test_action_names_parse_back() {
        for action in ALL {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
        assert!("LOGIN".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_only_balance_actions_move_balance() {
        let moving: Vec<_> = ALL.iter().filter(|a| a.moves_balance()).collect();
        assert_eq!(
            moving,
            vec![&AuditAction::IncreaseBalance, &AuditAction::WithdrawBalance]
        );
    }

    #[test]
    fn test_draft_defaults() {
        let before = Utc::now();
        let draft = AuditDraft::new(AuditAction::EditCustomer, 3);
        assert_eq!(draft.user_id, 3);
        assert!(draft.customer_id.is_none());
        assert_eq!(draft.amount, Decimal::ZERO);
        assert!(draft.created_at >= before);
        assert!(draft.description.is_empty());
    }

    #[test]
    fn test_draft_builder_chain() {
        let draft = AuditDraft::new(AuditAction::IncreaseBalance, 1)
            .customer(42)
            .amount(Decimal::new(2550, 2))
            .description("Credited 25.50");
        assert_eq!(draft.customer_id, Some(42));
        assert_eq!(draft.amount.to_string(), "25.50");
        assert_eq!(draft.description, "Credited 25.50");
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = AuditRecord {
            entry: AuditEntry {
                id: 9,
                action: AuditAction::ChangeUserRole,
                user_id: 1,
                customer_id: None,
                amount: Decimal::ZERO,
                created_at: Utc::now(),
                description: "Role changed from Employee to Admin".to_string(),
            },
            user: Some(AuditUser {
                id: 1,
                login: "admin".to_string(),
                user_name: "Administrator".to_string(),
            }),
            customer: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["action"], "ChangeUserRole");
        assert_eq!(json["user"]["login"], "admin");
        assert!(json["customer"].is_null());
    }
}
