//! Thin axum handlers. Each one forwards its body to an RPC target.

pub mod admin;
pub mod auth;
pub mod me;
