//! Test fixtures for backend tests

#![allow(dead_code)]

/// Test user credentials
pub struct TestUser {
    pub login: String,
    pub user_name: String,
    pub password: String,
}

impl TestUser {
    /// Matches the super-admin provisioned by `test_config`
    pub fn superadmin() -> Self {
        Self {
            login: "root".to_string(),
            user_name: "Root Administrator".to_string(),
            password: "root-pass".to_string(),
        }
    }

    pub fn employee() -> Self {
        Self::with_login("clerk")
    }

    pub fn with_login(login: &str) -> Self {
        Self {
            login: login.to_string(),
            user_name: format!("{} (test)", login),
            password: "pass123".to_string(),
        }
    }
}
