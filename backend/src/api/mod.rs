//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::services::audit_service::AuditService;
use crate::services::auth_service::{AuthService, PasswordHasher, TokenIssuer};
use crate::services::customer_service::CustomerService;
use crate::services::user_service::UserService;
use crate::storage::LoyaltyStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn LoyaltyStore>,
    pub tokens: Arc<TokenIssuer>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub customers: Arc<CustomerService>,
    pub audit: Arc<AuditService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn LoyaltyStore>) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let tokens = Arc::new(TokenIssuer::from_config(&config));
        let users = Arc::new(UserService::new(
            store.clone(),
            hasher,
            &config.superadmin_login,
        ));
        let auth = Arc::new(AuthService::new(store.clone(), users.clone(), tokens.clone()));

        Self {
            customers: Arc::new(CustomerService::new(store.clone())),
            audit: Arc::new(AuditService::new(store.clone())),
            config,
            store,
            tokens,
            auth,
            users,
        }
    }
}

pub type SharedState = Arc<AppState>;
