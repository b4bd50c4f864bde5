//! Startup provisioning of the super-admin account.

use rand::Rng;

use crate::config::Config;
use crate::error::Result;
use crate::models::user::{NewUser, Role};
use crate::services::auth_service::PasswordHasher;
use crate::storage::LoyaltyStore;

const PASSWORD_LENGTH: usize = 20;
const CHARSET: &[u8] = b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789!@#$%&*";

fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Create the super-admin unless an admin with the same display name exists.
///
/// Returns whether an account was created.
pub async fn ensure_superadmin(
    store: &dyn LoyaltyStore,
    hasher: &PasswordHasher,
    config: &Config,
) -> Result<bool> {
    let (password, generated) = match config.superadmin_password.as_deref() {
        Some(p) if !p.is_empty() => (p.to_string(), false),
        _ => (generate_password(), true),
    };

    let created = store
        .ensure_user(NewUser {
            login: config.superadmin_login.clone(),
            user_name: config.superadmin_name.clone(),
            password_hash: hasher.hash(&password)?,
            role: Role::Admin,
        })
        .await?;

    if created {
        tracing::info!(login = %config.superadmin_login, "Super-admin account created");
        if generated {
            tracing::warn!(
                "Generated super-admin password: {} (set SUPERADMIN_PASSWORD to choose one)",
                password
            );
        }
    } else {
        tracing::debug!("Super-admin account already present");
    }

    Ok(created)
}
