//! Read-only projections over the audit trail.

use std::sync::Arc;

use crate::error::Result;
use crate::models::audit_log::{AuditFilter, AuditRecord};
use crate::storage::LoyaltyStore;

pub struct AuditService {
    store: Arc<dyn LoyaltyStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn LoyaltyStore>) -> Self {
        Self { store }
    }

    /// Every entry, newest first
    pub async fn list_all(&self) -> Result<Vec<AuditRecord>> {
        self.query(AuditFilter::default()).await
    }

    /// Entries affecting one customer
    pub async fn list_by_customer(&self, customer_id: i32) -> Result<Vec<AuditRecord>> {
        self.query(AuditFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        })
        .await
    }

    /// Entries performed by one user
    pub async fn list_by_user(&self, user_id: i32) -> Result<Vec<AuditRecord>> {
        self.query(AuditFilter {
            user_id: Some(user_id),
            ..Default::default()
        })
        .await
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditRecord>> {
        let records = self.store.list_audit(filter).await?;
        tracing::debug!(
            user_id = ?filter.user_id,
            customer_id = ?filter.customer_id,
            count = records.len(),
            "Queried audit trail"
        );
        Ok(records)
    }
}
