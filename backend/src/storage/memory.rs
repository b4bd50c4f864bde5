//! In-process storage backend.
//!
//! Holds all rows behind one lock so each operation, including its audit
//! append, is atomic. Used for local runs (`STORE_BACKEND=memory`) and tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{balance_overflow, LoyaltyStore};
use crate::error::{AppError, Result};
use crate::models::audit_log::{
    AuditCustomer, AuditDraft, AuditEntry, AuditFilter, AuditRecord, AuditUser,
};
use crate::models::customer::{points_limit, Customer, DebitOutcome, NewCustomer};
use crate::models::user::{NewUser, Role, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    customers: Vec<Customer>,
    audit: Vec<AuditEntry>,
    next_user_id: i32,
    next_customer_id: i32,
    next_audit_id: i64,
}

impl Tables {
    fn push_user(&mut self, user: NewUser) -> User {
        self.next_user_id += 1;
        let user = User {
            id: self.next_user_id,
            login: user.login,
            user_name: user.user_name,
            password_hash: user.password_hash,
            role: user.role,
        };
        self.users.push(user.clone());
        user
    }

    // Mirrors the foreign keys of the relational schema.
    fn check_references(&self, audit: &AuditDraft) -> Result<()> {
        if !self.users.iter().any(|u| u.id == audit.user_id) {
            return Err(AppError::Database(format!(
                "audit entry references unknown user {}",
                audit.user_id
            )));
        }
        if let Some(customer_id) = audit.customer_id {
            if !self.customers.iter().any(|c| c.id == customer_id) {
                return Err(AppError::Database(format!(
                    "audit entry references unknown customer {}",
                    customer_id
                )));
            }
        }
        Ok(())
    }

    fn push_audit(&mut self, audit: AuditDraft) -> AuditEntry {
        self.next_audit_id += 1;
        let entry = AuditEntry {
            id: self.next_audit_id,
            action: audit.action,
            user_id: audit.user_id,
            customer_id: audit.customer_id,
            amount: audit.amount,
            created_at: audit.created_at,
            description: audit.description,
        };
        self.audit.push(entry.clone());
        entry
    }

    fn customer_mut(&mut self, id: i32) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id == id)
    }

    fn resolve(&self, entry: &AuditEntry) -> AuditRecord {
        let user = self
            .users
            .iter()
            .find(|u| u.id == entry.user_id)
            .map(|u| AuditUser {
                id: u.id,
                login: u.login.clone(),
                user_name: u.user_name.clone(),
            });
        let customer = entry.customer_id.and_then(|id| {
            self.customers.iter().find(|c| c.id == id).map(|c| AuditCustomer {
                id: c.id,
                name: c.name.clone(),
                phone_last_four_digits: c.phone_last_four_digits.clone(),
            })
        });
        AuditRecord {
            entry: entry.clone(),
            user,
            customer,
        }
    }
}

/// Storage backend kept entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoyaltyStore for MemoryStore {
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.login == login).cloned())
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, user: NewUser, audit: Option<AuditDraft>) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.login == user.login) {
            return Err(AppError::DuplicateIdentity("User already exists".to_string()));
        }
        if let Some(ref audit) = audit {
            tables.check_references(audit)?;
        }
        let user = tables.push_user(user);
        if let Some(audit) = audit {
            tables.push_audit(audit);
        }
        Ok(user)
    }

    async fn ensure_user(&self, user: NewUser) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let exists = tables.users.iter().any(|u| {
            (u.user_name == user.user_name && u.role == user.role) || u.login == user.login
        });
        if exists {
            return Ok(false);
        }
        tables.push_user(user);
        Ok(true)
    }

    async fn list_users(&self, exclude_login: &str) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| u.login != exclude_login)
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.role != Role::Admin, u.id));
        Ok(users)
    }

    async fn update_user_role(
        &self,
        id: i32,
        role: Role,
        audit: AuditDraft,
    ) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == id) {
            return Ok(None);
        }
        tables.check_references(&audit)?;
        let updated = tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        });
        tables.push_audit(audit);
        Ok(updated)
    }

    async fn insert_customer(&self, customer: NewCustomer, audit: AuditDraft) -> Result<Customer> {
        let mut tables = self.tables.write().await;
        if tables
            .customers
            .iter()
            .any(|c| c.phone_hashed == customer.phone_hashed)
        {
            return Err(AppError::Conflict(
                "A customer with this phone number already exists".to_string(),
            ));
        }
        if !tables.users.iter().any(|u| u.id == audit.user_id) {
            return Err(AppError::Database(format!(
                "audit entry references unknown user {}",
                audit.user_id
            )));
        }

        tables.next_customer_id += 1;
        let created = Customer {
            id: tables.next_customer_id,
            name: customer.name,
            phone: customer.phone,
            phone_last_four_digits: customer.phone_last_four_digits,
            phone_hashed: customer.phone_hashed,
            balance: customer.balance,
            created_at: customer.created_at,
        };
        tables.customers.push(created.clone());
        tables.push_audit(audit.customer(created.id));
        Ok(created)
    }

    async fn find_customer(&self, id: i32) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn update_customer(
        &self,
        id: i32,
        name: &str,
        phone_last_four_digits: &str,
        audit: AuditDraft,
    ) -> Result<Option<Customer>> {
        let mut tables = self.tables.write().await;
        if tables.customer_mut(id).is_none() {
            return Ok(None);
        }
        tables.check_references(&audit)?;
        let updated = tables.customer_mut(id).map(|customer| {
            customer.name = name.to_string();
            customer.phone_last_four_digits = phone_last_four_digits.to_string();
            customer.clone()
        });
        tables.push_audit(audit);
        Ok(updated)
    }

    async fn credit_balance(
        &self,
        id: i32,
        amount: Decimal,
        audit: AuditDraft,
    ) -> Result<Option<Customer>> {
        let mut tables = self.tables.write().await;
        let Some(balance) = tables.customer_mut(id).map(|customer| customer.balance) else {
            return Ok(None);
        };
        let credited = balance
            .checked_add(amount)
            .filter(|credited| *credited < points_limit())
            .ok_or_else(|| balance_overflow(id))?;
        tables.check_references(&audit)?;
        let updated = tables.customer_mut(id).map(|customer| {
            customer.balance = credited;
            customer.clone()
        });
        tables.push_audit(audit);
        Ok(updated)
    }

    async fn debit_balance(
        &self,
        id: i32,
        amount: Decimal,
        audit: AuditDraft,
    ) -> Result<DebitOutcome> {
        let mut tables = self.tables.write().await;
        let balance = match tables.customer_mut(id) {
            Some(customer) => customer.balance,
            None => return Ok(DebitOutcome::NotFound),
        };
        if balance < amount {
            return Ok(DebitOutcome::Insufficient { balance });
        }
        tables.check_references(&audit)?;
        let updated = match tables.customer_mut(id) {
            Some(customer) => {
                customer.balance -= amount;
                customer.clone()
            }
            None => return Ok(DebitOutcome::NotFound),
        };
        tables.push_audit(audit);
        Ok(DebitOutcome::Debited(updated))
    }

    async fn list_customers(&self, offset: i64, limit: i64) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        let mut customers = tables.customers.clone();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(customers
            .into_iter()
            .skip(usize::try_from(offset.max(0)).unwrap_or(usize::MAX))
            .take(usize::try_from(limit.max(0)).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_customers(&self) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.customers.len() as i64)
    }

    async fn append_audit(&self, audit: AuditDraft) -> Result<AuditEntry> {
        let mut tables = self.tables.write().await;
        tables.check_references(&audit)?;
        Ok(tables.push_audit(audit))
    }

    async fn list_audit(&self, filter: AuditFilter) -> Result<Vec<AuditRecord>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<&AuditEntry> = tables
            .audit
            .iter()
            .filter(|e| filter.user_id.map_or(true, |id| e.user_id == id))
            .filter(|e| filter.customer_id.map_or(true, |id| e.customer_id == Some(id)))
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries.into_iter().map(|e| tables.resolve(e)).collect())
    }
}
