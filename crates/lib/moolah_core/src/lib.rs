//! # moolah_core
//!
//! Core domain logic for Moolah: signed tokens, refresh-token sessions,
//! Discord login and user moderation.

pub mod auth;
pub mod error;
pub mod migrate;
pub mod models;
pub mod store;
pub mod users;
