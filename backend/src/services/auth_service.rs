//! Authentication service.
//!
//! Password hashing, JWT issuance and the login flow.

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, AuditDraft};
use crate::models::user::{Role, User};
use crate::services::user_service::UserService;
use crate::session::ClaimsDecoder;
use crate::storage::LoyaltyStore;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i32,
    /// Login
    pub name: String,
    /// Role name
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// A freshly minted bearer token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// bcrypt-backed password hashing
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

/// Signs and verifies HS256 access tokens
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: &str, audience: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            lifetime,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            &config.jwt_audience,
            Duration::minutes(config.jwt_expiry_minutes),
        )
    }

    /// Issue a token for `user`, valid from now
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now + self.lifetime;
        let claims = Claims {
            sub: user.id,
            name: user.login.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Decode a token, checking signature, issuer, audience and expiry
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

impl ClaimsDecoder for TokenIssuer {
    fn decode_claims(&self, token: &str) -> Result<Claims> {
        self.validate(token)
    }
}

/// Login flow: credential check, audit, token issuance
pub struct AuthService {
    store: Arc<dyn LoyaltyStore>,
    users: Arc<UserService>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn LoyaltyStore>,
        users: Arc<UserService>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            store,
            users,
            tokens,
        }
    }

    /// Authenticate and mint a token. `None` for unknown login or wrong password.
    pub async fn login(&self, login: &str, password: &str) -> Result<Option<(User, IssuedToken)>> {
        let Some(user) = self.users.validate_credentials(login, password).await? else {
            tracing::warn!(login, "Rejected login attempt");
            return Ok(None);
        };

        self.store
            .append_audit(
                AuditDraft::new(AuditAction::Login, user.id).description("Signed in"),
            )
            .await?;

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = user.id, login = %user.login, "User signed in");
        Ok(Some((user, token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit_log::AuditFilter;
    use crate::storage::MemoryStore;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", "loyalty-backend", "loyalty-clients", Duration::hours(1))
    }

    fn user() -> User {
        User {
            id: 7,
            login: "kostya".to_string(),
            user_name: "Kostya".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_password_hashing() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("pass123").unwrap();
        assert_ne!(hash, "pass123");
        assert!(hasher.verify("pass123", &hash).unwrap());
        assert!(!hasher.verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_internal_error() {
        let hasher = PasswordHasher::new(4);
        assert!(matches!(
            hasher.verify("pass", "not-a-bcrypt-hash"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_token_round_trip_claims() {
        let issuer = issuer();
        let now = Utc::now();
        let issued = issuer.issue_at(&user(), now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::hours(1));

        let claims = issuer.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.name, "kostya");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let issued = issuer
            .issue_at(&user(), Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(issuer.validate(&issued.token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = TokenIssuer::new("other", "loyalty-backend", "loyalty-clients", Duration::hours(1));
        let issued = other.issue(&user()).unwrap();
        assert!(issuer().validate(&issued.token).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let other = TokenIssuer::new("test-secret", "loyalty-backend", "someone-else", Duration::hours(1));
        let issued = other.issue(&user()).unwrap();
        assert!(issuer().validate(&issued.token).is_err());
    }

    #[tokio::test]
    async fn test_login_issues_token_and_records_audit() {
        let store: Arc<dyn LoyaltyStore> = Arc::new(MemoryStore::new());
        let users = Arc::new(UserService::new(store.clone(), PasswordHasher::new(4), "admin"));
        let tokens = Arc::new(issuer());
        let auth = AuthService::new(store.clone(), users.clone(), tokens.clone());

        let created = users
            .create_user(crate::services::user_service::SYSTEM_ACTOR, "test", "Test", "pass123")
            .await
            .unwrap();

        let (user, token) = auth.login("test", "pass123").await.unwrap().unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(tokens.validate(&token.token).unwrap().sub, created.id);

        let records = store
            .list_audit(AuditFilter {
                user_id: Some(created.id),
                customer_id: None,
            })
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry.action, AuditAction::Login);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store: Arc<dyn LoyaltyStore> = Arc::new(MemoryStore::new());
        let users = Arc::new(UserService::new(store.clone(), PasswordHasher::new(4), "admin"));
        let auth = AuthService::new(store.clone(), users.clone(), Arc::new(issuer()));
        users
            .create_user(crate::services::user_service::SYSTEM_ACTOR, "test", "Test", "pass123")
            .await
            .unwrap();

        assert!(auth.login("test", "wrong").await.unwrap().is_none());
        assert!(auth.login("nobody", "pass123").await.unwrap().is_none());
        assert!(store.list_audit(AuditFilter::default()).await.unwrap().is_empty());
    }
}
