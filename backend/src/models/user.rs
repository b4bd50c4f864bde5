//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;

/// Staff role. Persisted by its textual name, never by ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[default]
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Admin => "Admin",
        }
    }

    /// Human-readable label for UI listings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Admin => "Administrator",
        }
    }

    /// Whether this role is among the `allowed` set.
    pub fn is_any_of(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Employee" => Ok(Role::Employee),
            "Admin" => Ok(Role::Admin),
            other => Err(AppError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Staff account
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub login: String,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Values for inserting a user; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub user_name: String,
    pub password_hash: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_textual_encoding() {
        assert_eq!(Role::Employee.as_str(), "Employee");
        assert_eq!(Role::Admin.as_str(), "Admin");
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::try_from("Employee".to_string()).unwrap(), Role::Employee);
    }

    #[test]
    fn test_role_parse_is_case_sensitive() {
        assert!("admin".parse::<Role>().is_err());
        assert!("Manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_default_is_employee() {
        assert_eq!(Role::default(), Role::Employee);
    }

    #[test]
    fn test_role_serde_uses_name() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
        let role: Role = serde_json::from_str("\"Employee\"").unwrap();
        assert_eq!(role, Role::Employee);
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            login: "jan".to_string(),
            user_name: "Jan".to_string(),
            password_hash: "$2b$04$abcdef".to_string(),
            role: Role::Employee,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "Employee");
    }
}
