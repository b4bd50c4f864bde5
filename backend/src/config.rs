//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;
use std::str::FromStr;

/// Which persistence backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Persistence backend
    pub store_backend: StoreBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Expected `iss` claim
    pub jwt_issuer: String,

    /// Expected `aud` claim
    pub jwt_audience: String,

    /// Token lifetime in minutes
    pub jwt_expiry_minutes: i64,

    /// bcrypt work factor
    pub bcrypt_cost: u32,

    /// Login of the distinguished super-admin account
    pub superadmin_login: String,

    /// Display name of the super-admin account
    pub superadmin_name: String,

    /// Initial super-admin password; generated when absent
    pub superadmin_password: Option<String>,

    /// CORS allow-list; permissive when unset
    pub cors_origins: Option<Vec<String>>,

    /// OTLP collector endpoint (optional)
    pub otel_endpoint: Option<String>,
}

redacted_debug!(Config {
    show store_backend,
    show database_url,
    show bind_address,
    redact jwt_secret,
    show jwt_issuer,
    show jwt_audience,
    show jwt_expiry_minutes,
    show bcrypt_cost,
    show superadmin_login,
    show superadmin_name,
    redact_option superadmin_password,
    show cors_origins,
    show otel_endpoint,
});

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = lookup("STORE_BACKEND")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(StoreBackend::Postgres);

        let database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::Config("DATABASE_URL not set".into()));
        }

        let cors_origins = lookup("CORS_ORIGINS").map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        Ok(Self {
            store_backend,
            database_url,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            jwt_secret: lookup("JWT_SECRET")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config("JWT_SECRET not set".into()))?,
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "loyalty-backend".into()),
            jwt_audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "loyalty-clients".into()),
            jwt_expiry_minutes: lookup("JWT_EXPIRY_MINUTES")
                .and_then(|v| v.parse().ok())
                .filter(|m: &i64| *m > 0)
                .unwrap_or(60),
            bcrypt_cost: lookup("BCRYPT_COST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            superadmin_login: lookup("SUPERADMIN_LOGIN").unwrap_or_else(|| "admin".into()),
            superadmin_name: lookup("SUPERADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
            superadmin_password: lookup("SUPERADMIN_PASSWORD").filter(|v| !v.is_empty()),
            cors_origins: cors_origins.filter(|o| !o.is_empty()),
            otel_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_required_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/loyalty"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.jwt_expiry_minutes, 60);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.superadmin_login, "admin");
        assert!(config.superadmin_password.is_none());
        assert!(config.cors_origins.is_none());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("DATABASE_URL")));
    }

    #[test]
    fn test_memory_backend_needs_no_database_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_missing_jwt_secret() {
        let err = Config::from_lookup(lookup_from(&[("STORE_BACKEND", "memory")])).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("JWT_SECRET")));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "redis"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRY_MINUTES", "soon"),
            ("BCRYPT_COST", "-1"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_expiry_minutes, 60);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_cors_origins_split() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "secret"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "very-secret-key"),
            ("SUPERADMIN_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        let output = format!("{:?}", config);
        assert!(!output.contains("very-secret-key"));
        assert!(!output.contains("hunter2"));
        assert!(output.contains("[REDACTED]"));
    }
}
