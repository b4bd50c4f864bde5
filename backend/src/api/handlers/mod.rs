//! HTTP request handlers.

pub mod audit;
pub mod auth;
pub mod customers;
pub mod health;
pub mod users;
