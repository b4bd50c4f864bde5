//! Customer ledger service.
//!
//! Every mutation goes through a single store call that also appends the
//! matching audit entry, so a change is never durable without its trail.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, AuditDraft};
use crate::models::customer::{points_limit, Customer, DebitOutcome, NewCustomer, POINTS_SCALE};
use crate::storage::LoyaltyStore;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Phone number split into the forms the ledger keeps
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneForms {
    pub last_four_digits: String,
    pub hashed: String,
}

impl PhoneForms {
    /// Derive the redacted and hashed forms from the digits of `phone`.
    pub fn derive(phone: &str) -> Result<Self> {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 4 {
            return Err(AppError::Validation(
                "Phone number must contain at least four digits".to_string(),
            ));
        }

        Ok(Self {
            last_four_digits: digits[digits.len() - 4..].to_string(),
            hashed: hex::encode(Sha256::digest(digits.as_bytes())),
        })
    }
}

/// Clamp caller-supplied paging to `page >= 1` and `1..=MAX_PAGE_SIZE`.
pub fn clamp_page(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

/// Amounts must be positive, at most cent precision, and below the storable limit.
fn require_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    if amount.normalize().scale() > POINTS_SCALE {
        return Err(AppError::Validation(format!(
            "Amount must have at most {} decimal places",
            POINTS_SCALE
        )));
    }
    if amount >= points_limit() {
        return Err(AppError::Validation(format!(
            "Amount must be less than {}",
            points_limit()
        )));
    }
    Ok(())
}

fn require_name(name: &str) -> Result<&str> {
    match name.trim() {
        "" => Err(AppError::Validation("Name must not be empty".to_string())),
        name => Ok(name),
    }
}

fn customer_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Customer {} not found", id))
}

pub struct CustomerService {
    store: Arc<dyn LoyaltyStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn LoyaltyStore>) -> Self {
        Self { store }
    }

    /// Register a customer with a zero balance.
    pub async fn create_customer(
        &self,
        acting_user_id: i32,
        name: &str,
        phone: &str,
    ) -> Result<Customer> {
        let name = require_name(name)?;
        let forms = PhoneForms::derive(phone)?;

        let new_customer = NewCustomer {
            name: name.to_string(),
            phone: phone.trim().to_string(),
            phone_last_four_digits: forms.last_four_digits,
            phone_hashed: forms.hashed,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        };

        let audit = AuditDraft::new(AuditAction::CreateCustomer, acting_user_id)
            .description(format!("Created customer {}", name));

        let customer = self.store.insert_customer(new_customer, audit).await?;
        tracing::info!(customer_id = customer.id, acting_user_id, "Customer created");
        Ok(customer)
    }

    /// Add `amount` points to the balance.
    pub async fn increase_balance(
        &self,
        acting_user_id: i32,
        customer_id: i32,
        amount: Decimal,
    ) -> Result<Customer> {
        require_amount(amount)?;

        let audit = AuditDraft::new(AuditAction::IncreaseBalance, acting_user_id)
            .customer(customer_id)
            .amount(amount)
            .description(format!("Balance increased by {}", amount));

        let customer = self
            .store
            .credit_balance(customer_id, amount, audit)
            .await?
            .ok_or_else(|| customer_not_found(customer_id))?;

        tracing::info!(
            customer_id,
            acting_user_id,
            %amount,
            balance = %customer.balance,
            "Balance increased"
        );
        Ok(customer)
    }

    /// Subtract `amount` points; the balance never goes negative.
    pub async fn withdraw_balance(
        &self,
        acting_user_id: i32,
        customer_id: i32,
        amount: Decimal,
    ) -> Result<Customer> {
        require_amount(amount)?;

        let audit = AuditDraft::new(AuditAction::WithdrawBalance, acting_user_id)
            .customer(customer_id)
            .amount(amount)
            .description(format!("Balance withdrawn by {}", amount));

        match self.store.debit_balance(customer_id, amount, audit).await? {
            DebitOutcome::Debited(customer) => {
                tracing::info!(
                    customer_id,
                    acting_user_id,
                    %amount,
                    balance = %customer.balance,
                    "Balance withdrawn"
                );
                Ok(customer)
            }
            DebitOutcome::Insufficient { balance } => {
                tracing::warn!(customer_id, %balance, requested = %amount, "Insufficient funds");
                Err(AppError::InsufficientFunds {
                    balance,
                    requested: amount,
                })
            }
            DebitOutcome::NotFound => Err(customer_not_found(customer_id)),
        }
    }

    /// Overwrite the name and redacted phone. The full phone and its hash stay as created.
    pub async fn edit_customer(
        &self,
        acting_user_id: i32,
        customer_id: i32,
        name: &str,
        phone_last_four_digits: &str,
    ) -> Result<Customer> {
        let name = require_name(name)?;
        let last_four = phone_last_four_digits.trim();
        if last_four.len() != 4 || !last_four.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Validation(
                "Redacted phone must be exactly four digits".to_string(),
            ));
        }

        let audit = AuditDraft::new(AuditAction::EditCustomer, acting_user_id)
            .customer(customer_id)
            .description(format!("Customer renamed to {}", name));

        let customer = self
            .store
            .update_customer(customer_id, name, last_four, audit)
            .await?
            .ok_or_else(|| customer_not_found(customer_id))?;

        tracing::info!(customer_id, acting_user_id, "Customer edited");
        Ok(customer)
    }

    pub async fn get_customer(&self, customer_id: i32) -> Result<Customer> {
        tracing::debug!(customer_id, "Fetching customer");
        self.store
            .find_customer(customer_id)
            .await?
            .ok_or_else(|| customer_not_found(customer_id))
    }

    /// Newest customers first, paged after [`clamp_page`].
    pub async fn list_customers(&self, page: i64, page_size: i64) -> Result<Vec<Customer>> {
        let (page, page_size) = clamp_page(Some(page), Some(page_size));
        let offset = (page - 1) * page_size;
        tracing::debug!(page, page_size, "Listing customers");
        self.store.list_customers(offset, page_size).await
    }

    pub async fn count_customers(&self) -> Result<i64> {
        self.store.count_customers().await
    }
}
