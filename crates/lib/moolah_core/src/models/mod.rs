//! Domain models shared by the core services and the RPC layer.

pub mod auth;
pub mod user;
