//! Loyalty Back Office - Backend Library
//!
//! Customers with point balances, staff accounts with roles, and an
//! append-only audit trail behind a JWT-secured HTTP API.

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
