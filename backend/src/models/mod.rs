//! Domain models (SQLx rows).

pub mod audit_log;
pub mod customer;
pub mod user;
