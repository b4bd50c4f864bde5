//! Persistence backends.
//!
//! Every operation that mutates an entity and appends an audit entry is a
//! single atomic unit inside the backend: either both writes land or neither.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditDraft, AuditEntry, AuditFilter, AuditRecord};
use crate::models::customer::{Customer, DebitOutcome, NewCustomer};
use crate::models::user::{NewUser, Role, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Loyalty persistence gateway
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// Find a user by exact (case-sensitive) login
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Find a user by id
    async fn find_user(&self, id: i32) -> Result<Option<User>>;

    /// Insert a user, optionally appending an audit entry in the same unit.
    ///
    /// Fails with `DuplicateIdentity` when the login is taken.
    async fn insert_user(&self, user: NewUser, audit: Option<AuditDraft>) -> Result<User>;

    /// Insert the user unless one with the same display name and role exists
    /// or the login is already taken. Returns whether a row was inserted.
    async fn ensure_user(&self, user: NewUser) -> Result<bool>;

    /// All users except `exclude_login`, admins first, then by id.
    async fn list_users(&self, exclude_login: &str) -> Result<Vec<User>>;

    /// Set a user's role and append the audit entry. `None` if the user is missing.
    async fn update_user_role(&self, id: i32, role: Role, audit: AuditDraft)
        -> Result<Option<User>>;

    /// Insert a customer and its creation audit entry.
    ///
    /// The draft's customer reference is filled with the new id.
    /// Fails with `Conflict` when the hashed phone is already registered.
    async fn insert_customer(&self, customer: NewCustomer, audit: AuditDraft) -> Result<Customer>;

    /// Find a customer by id
    async fn find_customer(&self, id: i32) -> Result<Option<Customer>>;

    /// Overwrite name and redacted phone, appending the audit entry.
    async fn update_customer(
        &self,
        id: i32,
        name: &str,
        phone_last_four_digits: &str,
        audit: AuditDraft,
    ) -> Result<Option<Customer>>;

    /// Atomically add `amount` to the balance and append the audit entry.
    /// A balance that would reach `points_limit()` is a `Validation` error.
    async fn credit_balance(
        &self,
        id: i32,
        amount: Decimal,
        audit: AuditDraft,
    ) -> Result<Option<Customer>>;

    /// Atomically subtract `amount` if the balance covers it, appending the
    /// audit entry only on success.
    async fn debit_balance(&self, id: i32, amount: Decimal, audit: AuditDraft)
        -> Result<DebitOutcome>;

    /// Customers by creation time, newest first
    async fn list_customers(&self, offset: i64, limit: i64) -> Result<Vec<Customer>>;

    /// Total number of customers
    async fn count_customers(&self) -> Result<i64>;

    /// Append a stand-alone audit entry
    async fn append_audit(&self, audit: AuditDraft) -> Result<AuditEntry>;

    /// Audit entries matching `filter`, newest first, with user and customer resolved
    async fn list_audit(&self, filter: AuditFilter) -> Result<Vec<AuditRecord>>;

    /// Liveness probe of the underlying storage
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Error for a credit that would push the balance past the storable limit
pub(crate) fn balance_overflow(customer_id: i32) -> AppError {
    AppError::Validation(format!(
        "Balance of customer {} would exceed the maximum",
        customer_id
    ))
}
