//! Client-facing auth surface.

use tracing::{info, warn};

use super::service::{AuthService, RotationOutcome};
use super::tokens::TokenValidation;
use crate::error::{CoreResult, HttpFault};
use crate::models::auth::{
    AccessTokenClaims, AuthUrl, AuthUser, DeviceInfo, LoginResult, SessionInfo, TokenIntent,
};

/// Client auth: Discord login with guild caching and `client`-intent tokens.
#[derive(Clone)]
pub struct ClientAuth {
    auth: AuthService,
}

impl ClientAuth {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    pub fn service(&self) -> &AuthService {
        &self.auth
    }

    pub fn initiate_discord_oauth(&self) -> CoreResult<AuthUrl> {
        self.auth.oauth().authorization_url()
    }

    /// Complete the OAuth flow and issue a client session.
    ///
    /// Profile and guilds are fetched concurrently; the guild list is cached
    /// on the user record.
    pub async fn handle_discord_callback(
        &self,
        code: &str,
        code_verifier: &str,
        device: Option<DeviceInfo>,
    ) -> CoreResult<LoginResult> {
        let oauth = self.auth.oauth();
        let provider_tokens = oauth.exchange_code(code, code_verifier).await?;

        let (profile, guilds) = tokio::try_join!(
            oauth.fetch_profile(&provider_tokens.access_token),
            oauth.fetch_guilds(&provider_tokens.access_token),
        )?;

        let user = self.auth.find_or_create_user(&profile, Some(guilds)).await?;
        if user.is_deleted() {
            warn!(user_id = %user.id, tags = ?["auth", "security"], "Banned user attempted login");
            return Err(HttpFault::forbidden().into());
        }

        let pair = self
            .auth
            .generate_token_pair(&user, TokenIntent::Client, device)
            .await?;
        info!(user_id = %user.id, tags = ?["auth"], "Client login successful");

        Ok(LoginResult {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: AuthUser::from(&user),
        })
    }

    pub fn validate_access_token(&self, token: &str) -> TokenValidation<AccessTokenClaims> {
        self.auth.validate_access_token(token)
    }

    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        device: Option<DeviceInfo>,
    ) -> CoreResult<RotationOutcome> {
        self.auth
            .rotate_refresh_token(refresh_token, TokenIntent::Client, device)
            .await
    }

    pub async fn revoke_session(&self, refresh_token: &str) -> CoreResult<bool> {
        self.auth
            .revoke_refresh_token(refresh_token, TokenIntent::Client)
            .await
    }

    /// Log out everywhere. The caller decides whose sessions `user_id` may name.
    pub async fn revoke_all_sessions(&self, user_id: &str) -> CoreResult<u64> {
        self.auth.refresh_tokens().revoke_all_for_user(user_id).await
    }

    pub async fn get_user_sessions(&self, user_id: &str) -> CoreResult<Vec<SessionInfo>> {
        self.auth.refresh_tokens().list_active_sessions(user_id).await
    }
}
