//! Customer model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Decimal places a balance or amount may carry.
pub const POINTS_SCALE: u32 = 2;

/// Integer digits a balance may carry; matches `NUMERIC(18, 2)`.
pub const POINTS_INTEGER_DIGITS: u32 = 16;

/// Exclusive upper bound for balances and amounts.
pub fn points_limit() -> Decimal {
    Decimal::from(10_i64.pow(POINTS_INTEGER_DIGITS))
}

/// Loyalty program member
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing)]
    pub phone: String,
    pub phone_last_four_digits: String,
    #[serde(skip_serializing)]
    pub phone_hashed: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Values for inserting a customer; id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub phone_last_four_digits: String,
    pub phone_hashed: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Result of a conditional balance debit.
#[derive(Debug, Clone, PartialEq)]
pub enum DebitOutcome {
    Debited(Customer),
    Insufficient { balance: Decimal },
    NotFound,
}
