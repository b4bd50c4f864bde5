//! Authentication state derived from a bearer token.
//!
//! No flag is cached: every query re-derives [`AuthState`] from the token
//! currently held, so expiry is noticed on the first check after it passes.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::error::{AppError, Result};
use crate::services::auth_service::Claims;

/// Turns a raw token into claims
pub trait ClaimsDecoder: Send + Sync {
    fn decode_claims(&self, token: &str) -> Result<Claims>;
}

/// Client-side view: reads the claims without checking the signature.
///
/// Only the server holds the signing secret, so a client can display who it
/// is logged in as and when the token lapses, but never vouch for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnverifiedDecoder;

impl ClaimsDecoder for UnverifiedDecoder {
    fn decode_claims(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }
}

/// Why a held token was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    Expired,
    Invalid,
}

impl LogoutReason {
    pub fn message(&self) -> &'static str {
        match self {
            LogoutReason::Expired => "Your session has expired. Please sign in again.",
            LogoutReason::Invalid => "Your session token is invalid. Please sign in again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous { reason: Option<LogoutReason> },
    Authenticated {
        claims: Claims,
        expires_at: DateTime<Utc>,
    },
}

impl AuthState {
    /// Derive the state for `token` as of `now`.
    pub fn derive(token: Option<&str>, decoder: &dyn ClaimsDecoder, now: DateTime<Utc>) -> Self {
        let Some(token) = token else {
            return AuthState::Anonymous { reason: None };
        };

        let claims = match decoder.decode_claims(token) {
            Ok(claims) => claims,
            Err(AppError::Jwt(e)) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                return AuthState::Anonymous {
                    reason: Some(LogoutReason::Expired),
                }
            }
            Err(_) => {
                return AuthState::Anonymous {
                    reason: Some(LogoutReason::Invalid),
                }
            }
        };

        match DateTime::from_timestamp(claims.exp, 0) {
            Some(expires_at) if expires_at < now => AuthState::Anonymous {
                reason: Some(LogoutReason::Expired),
            },
            Some(expires_at) => AuthState::Authenticated { claims, expires_at },
            None => AuthState::Anonymous {
                reason: Some(LogoutReason::Invalid),
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            AuthState::Authenticated { claims, .. } => Some(claims),
            AuthState::Anonymous { .. } => None,
        }
    }
}

/// Client-held token plus the reason it was last dropped
pub struct Session<D: ClaimsDecoder = UnverifiedDecoder> {
    decoder: D,
    token: Option<String>,
    logout_reason: Option<LogoutReason>,
}

impl Default for Session<UnverifiedDecoder> {
    fn default() -> Self {
        Self::new(UnverifiedDecoder)
    }
}

impl<D: ClaimsDecoder> Session<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            token: None,
            logout_reason: None,
        }
    }

    /// Hold a freshly issued token
    pub fn sign_in(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
        self.logout_reason = None;
    }

    /// Explicit logout; records no reason
    pub fn sign_out(&mut self) {
        self.token = None;
        self.logout_reason = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout_reason(&self) -> Option<LogoutReason> {
        self.logout_reason
    }

    pub fn state(&mut self) -> AuthState {
        self.state_at(Utc::now())
    }

    /// Re-derive the state; an expired or unreadable token is dropped.
    pub fn state_at(&mut self, now: DateTime<Utc>) -> AuthState {
        let state = AuthState::derive(self.token.as_deref(), &self.decoder, now);
        if let AuthState::Anonymous {
            reason: Some(reason),
        } = state
        {
            tracing::info!(reason = reason.message(), "Session token dropped");
            self.token = None;
            self.logout_reason = Some(reason);
        }
        state
    }
}
