//! Common test utilities for backend router tests
//!
//! Builds the full router over an in-memory store and provides helpers to
//! drive it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use loyalty_backend::{
    api::{routes::create_router, AppState},
    services::{auth_service::PasswordHasher, bootstrap},
    storage::{LoyaltyStore, MemoryStore},
    Config,
};

use fixtures::TestUser;

/// Configuration for an in-memory server with a known super-admin
pub fn test_config() -> Config {
    let root = TestUser::superadmin();
    Config::from_lookup(|key| match key {
        "STORE_BACKEND" => Some("memory".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "SUPERADMIN_LOGIN" => Some(root.login.clone()),
        "SUPERADMIN_NAME" => Some(root.user_name.clone()),
        "SUPERADMIN_PASSWORD" => Some(root.password.clone()),
        _ => None,
    })
    .expect("test config")
}

/// Router plus direct access to its state
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw: String,
}

impl TestApp {
    /// Fresh app with the super-admin provisioned, as on startup
    pub async fn new() -> Self {
        let config = test_config();
        let store: Arc<dyn LoyaltyStore> = Arc::new(MemoryStore::new());
        bootstrap::ensure_superadmin(
            store.as_ref(),
            &PasswordHasher::new(config.bcrypt_cost),
            &config,
        )
        .await
        .expect("provision super-admin");

        let state = Arc::new(AppState::new(config, store));
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("response body")
            .to_bytes();
        let raw = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body, raw }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    /// Log in and return the bearer token
    pub async fn login(&self, user: &TestUser) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                serde_json::json!({ "login": user.login, "password": user.password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.raw);
        response.body["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Register `user` anonymously and log in
    pub async fn register_and_login(&self, user: &TestUser) -> String {
        let response = self
            .post(
                "/api/auth/register",
                None,
                serde_json::json!({
                    "login": user.login,
                    "userName": user.user_name,
                    "password": user.password,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "register failed: {}", response.raw);
        self.login(user).await
    }
}
