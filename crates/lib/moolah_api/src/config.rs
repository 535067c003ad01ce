//! API server configuration.

use moolah_core::auth::DiscordOAuthConfig;
use moolah_core::auth::jwt::resolve_jwt_secret;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    pub discord_client_id: String,
    pub discord_client_secret: String,
    pub discord_redirect_uri: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                     | Default                                 |
    /// |------------------------------|-----------------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:3100`                        |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/moolah`      |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file           |
    /// | `DISCORD_CLIENT_ID`          | empty                                   |
    /// | `DISCORD_CLIENT_SECRET`      | empty                                   |
    /// | `DISCORD_OAUTH_REDIRECT_URL` | `http://localhost:5173/auth/callback`   |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/moolah".into()),
            jwt_secret: resolve_jwt_secret(),
            discord_client_id: std::env::var("DISCORD_CLIENT_ID").unwrap_or_default(),
            discord_client_secret: std::env::var("DISCORD_CLIENT_SECRET").unwrap_or_default(),
            discord_redirect_uri: std::env::var("DISCORD_OAUTH_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:5173/auth/callback".into()),
        }
    }

    pub fn discord(&self) -> DiscordOAuthConfig {
        DiscordOAuthConfig::new(
            &self.discord_client_id,
            &self.discord_client_secret,
            &self.discord_redirect_uri,
        )
    }
}
