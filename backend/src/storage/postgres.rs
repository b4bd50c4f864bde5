//! PostgreSQL storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};

use super::{balance_overflow, LoyaltyStore};
use crate::error::{AppError, Result};
use crate::models::audit_log::{
    AuditAction, AuditCustomer, AuditDraft, AuditEntry, AuditFilter, AuditRecord, AuditUser,
};
use crate::models::customer::{Customer, DebitOutcome, NewCustomer};
use crate::models::user::{NewUser, Role, User};

const USER_COLUMNS: &str = "id, login, user_name, password_hash, role";
const CUSTOMER_COLUMNS: &str =
    "id, name, phone, phone_last_four_digits, phone_hashed, balance, created_at";

/// Storage backend over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// SQLSTATE 22003, raised when a value does not fit `NUMERIC(18, 2)`
fn is_numeric_overflow(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("22003"))
}

async fn insert_audit(conn: &mut PgConnection, audit: AuditDraft) -> Result<AuditEntry> {
    let entry = sqlx::query_as::<_, AuditEntry>(
        r#"
        INSERT INTO audit_entries (action, user_id, customer_id, amount, created_at, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, action, user_id, customer_id, amount, created_at, description
        "#,
    )
    .bind(audit.action.as_str())
    .bind(audit.user_id)
    .bind(audit.customer_id)
    .bind(audit.amount)
    .bind(audit.created_at)
    .bind(&audit.description)
    .fetch_one(&mut *conn)
    .await?;

    Ok(entry)
}

/// Audit entry row joined with user and customer columns
#[derive(Debug, FromRow)]
struct AuditRecordRow {
    id: i64,
    #[sqlx(try_from = "String")]
    action: AuditAction,
    user_id: i32,
    customer_id: Option<i32>,
    amount: Decimal,
    created_at: DateTime<Utc>,
    description: String,
    user_login: Option<String>,
    user_user_name: Option<String>,
    customer_name: Option<String>,
    customer_phone_last_four_digits: Option<String>,
}

impl From<AuditRecordRow> for AuditRecord {
    fn from(row: AuditRecordRow) -> Self {
        let user = match (row.user_login, row.user_user_name) {
            (Some(login), Some(user_name)) => Some(AuditUser {
                id: row.user_id,
                login,
                user_name,
            }),
            _ => None,
        };
        let customer = match (row.customer_id, row.customer_name) {
            (Some(id), Some(name)) => Some(AuditCustomer {
                id,
                name,
                phone_last_four_digits: row.customer_phone_last_four_digits.unwrap_or_default(),
            }),
            _ => None,
        };
        AuditRecord {
            entry: AuditEntry {
                id: row.id,
                action: row.action,
                user_id: row.user_id,
                customer_id: row.customer_id,
                amount: row.amount,
                created_at: row.created_at,
                description: row.description,
            },
            user,
            customer,
        }
    }
}

#[async_trait]
impl LoyaltyStore for PgStore {
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login = $1"
        ))
        .bind(login)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: NewUser, audit: Option<AuditDraft>) -> Result<User> {
        let mut tx = self.db.begin().await?;

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (login, user_name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.login)
        .bind(&user.user_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateIdentity("User already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        if let Some(audit) = audit {
            insert_audit(&mut tx, audit).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn ensure_user(&self, user: NewUser) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (login, user_name, password_hash, role)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM users WHERE user_name = $2 AND role = $4)
            ON CONFLICT (login) DO NOTHING
            "#,
        )
        .bind(&user.login)
        .bind(&user.user_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, exclude_login: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE login <> $1
            ORDER BY (role = 'Admin') DESC, id
            "#
        ))
        .bind(exclude_login)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    async fn update_user_role(
        &self,
        id: i32,
        role: Role,
        audit: AuditDraft,
    ) -> Result<Option<User>> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = updated else {
            return Ok(None);
        };

        insert_audit(&mut tx, audit).await?;
        tx.commit().await?;
        Ok(Some(user))
    }

    async fn insert_customer(&self, customer: NewCustomer, audit: AuditDraft) -> Result<Customer> {
        let mut tx = self.db.begin().await?;

        let created = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, phone, phone_last_four_digits, phone_hashed, balance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.phone_last_four_digits)
        .bind(&customer.phone_hashed)
        .bind(customer.balance)
        .bind(customer.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("A customer with this phone number already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        insert_audit(&mut tx, audit.customer(created.id)).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_customer(&self, id: i32) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: i32,
        name: &str,
        phone_last_four_digits: &str,
        audit: AuditDraft,
    ) -> Result<Option<Customer>> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET name = $2, phone_last_four_digits = $3
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(phone_last_four_digits)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(customer) = updated else {
            return Ok(None);
        };

        insert_audit(&mut tx, audit).await?;
        tx.commit().await?;
        Ok(Some(customer))
    }

    async fn credit_balance(
        &self,
        id: i32,
        amount: Decimal,
        audit: AuditDraft,
    ) -> Result<Option<Customer>> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query_as::<_, Customer>(&format!(
            "UPDATE customers SET balance = balance + $2 WHERE id = $1 RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if is_numeric_overflow(&e) {
                balance_overflow(id)
            } else {
                AppError::from(e)
            }
        })?;

        let Some(customer) = updated else {
            return Ok(None);
        };

        insert_audit(&mut tx, audit).await?;
        tx.commit().await?;
        Ok(Some(customer))
    }

    async fn debit_balance(
        &self,
        id: i32,
        amount: Decimal,
        audit: AuditDraft,
    ) -> Result<DebitOutcome> {
        let mut tx = self.db.begin().await?;

        // Conditional update: concurrent debits cannot overdraw the balance.
        let updated = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET balance = balance - $2
            WHERE id = $1 AND balance >= $2
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(customer) = updated {
            insert_audit(&mut tx, audit).await?;
            tx.commit().await?;
            return Ok(DebitOutcome::Debited(customer));
        }

        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM customers WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        Ok(match balance {
            Some(balance) => DebitOutcome::Insufficient { balance },
            None => DebitOutcome::NotFound,
        })
    }

    async fn list_customers(&self, offset: i64, limit: i64) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            ORDER BY created_at DESC, id DESC
            OFFSET $1
            LIMIT $2
            "#
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    async fn count_customers(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    async fn append_audit(&self, audit: AuditDraft) -> Result<AuditEntry> {
        let mut conn = self.db.acquire().await?;
        insert_audit(&mut conn, audit).await
    }

    async fn list_audit(&self, filter: AuditFilter) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRecordRow>(
            r#"
            SELECT
                a.id, a.action, a.user_id, a.customer_id, a.amount, a.created_at, a.description,
                u.login AS user_login, u.user_name AS user_user_name,
                c.name AS customer_name,
                c.phone_last_four_digits AS customer_phone_last_four_digits
            FROM audit_entries a
            LEFT JOIN users u ON u.id = a.user_id
            LEFT JOIN customers c ON c.id = a.customer_id
            WHERE ($1::int IS NULL OR a.user_id = $1)
              AND ($2::int IS NULL OR a.customer_id = $2)
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.customer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(AuditRecord::from).collect())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
