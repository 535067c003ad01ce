//! Authentication and session lifecycle.
//!
//! [`service::AuthService`] holds the logic shared by both trust boundaries;
//! [`client::ClientAuth`] and [`admin::AdminAuth`] add only the policy that
//! differs between them.

pub mod admin;
pub mod client;
pub mod discord;
pub mod jwt;
pub mod refresh_tokens;
pub mod service;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::AdminAuth;
pub use client::ClientAuth;
pub use discord::{DiscordOAuthClient, DiscordOAuthConfig, OAuthProvider};
pub use refresh_tokens::RefreshTokenService;
pub use service::{AuthService, RotationOutcome};
pub use tokens::TokenValidation;
