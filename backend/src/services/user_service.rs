//! Staff account directory.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, AuditDraft};
use crate::models::user::{NewUser, Role, User};
use crate::services::auth_service::PasswordHasher;
use crate::storage::LoyaltyStore;

/// Acting identity for anonymous registration and startup provisioning
pub const SYSTEM_ACTOR: i32 = 0;

pub struct UserService {
    store: Arc<dyn LoyaltyStore>,
    hasher: PasswordHasher,
    superadmin_login: String,
}

impl UserService {
    pub fn new(store: Arc<dyn LoyaltyStore>, hasher: PasswordHasher, superadmin_login: &str) -> Self {
        Self {
            store,
            hasher,
            superadmin_login: superadmin_login.to_string(),
        }
    }

    /// Check a login/password pair. Unknown login and wrong password both yield `None`.
    ///
    /// Logins are trimmed here as in `create_user`.
    pub async fn validate_credentials(&self, login: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.store.find_user_by_login(login.trim()).await? else {
            return Ok(None);
        };

        if self.hasher.verify(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Create an `Employee` account.
    pub async fn create_user(
        &self,
        acting_user_id: i32,
        login: &str,
        user_name: &str,
        password: &str,
    ) -> Result<User> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AppError::Validation("Login must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Password must not be empty".to_string()));
        }

        if self.store.find_user_by_login(login).await?.is_some() {
            return Err(AppError::DuplicateIdentity("User already exists".to_string()));
        }

        let user_name = match user_name.trim() {
            "" => login,
            name => name,
        };

        let new_user = NewUser {
            login: login.to_string(),
            user_name: user_name.to_string(),
            password_hash: self.hasher.hash(password)?,
            role: Role::Employee,
        };

        let audit = (acting_user_id != SYSTEM_ACTOR).then(|| {
            AuditDraft::new(AuditAction::CreateUser, acting_user_id)
                .description(format!("Created user {}", login))
        });

        let user = self.store.insert_user(new_user, audit).await?;
        tracing::info!(user_id = user.id, login = %user.login, acting_user_id, "User created");
        Ok(user)
    }

    /// Look up a user by id
    pub async fn get_user(&self, id: i32) -> Result<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// All users except the super-admin, admins first, then by id
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.store.list_users(&self.superadmin_login).await
    }

    /// Change a user's role and record the transition.
    pub async fn change_role(&self, acting_user_id: i32, user_id: i32, role: Role) -> Result<User> {
        let current = self.get_user(user_id).await?;

        let audit = AuditDraft::new(AuditAction::ChangeUserRole, acting_user_id).description(
            format!(
                "Role of {} changed from {} to {}",
                current.login, current.role, role
            ),
        );

        let user = self
            .store
            .update_user_role(user_id, role, audit)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        tracing::info!(
            user_id,
            acting_user_id,
            from = %current.role,
            to = %role,
            "User role changed"
        );
        Ok(user)
    }
}
