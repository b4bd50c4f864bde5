//! Business logic services.

pub mod audit_service;
pub mod auth_service;
pub mod bootstrap;
pub mod customer_service;
pub mod user_service;
