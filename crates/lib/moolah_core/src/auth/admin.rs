//! Admin auth surface: the shared service behind a role gate, plus session
//! management over any user.

use tracing::{debug, info, warn};

use super::service::{AuthService, RotationOutcome};
use super::tokens::TokenValidation;
use crate::error::{CoreResult, HttpFault, MessageKey};
use crate::models::auth::{
    AccessTokenClaims, AuthUrl, AuthUser, DeviceInfo, LoginResult, SessionInfo, TokenIntent,
};

/// Reason given when a valid access token belongs to a non-admin role.
pub const ADMIN_ROLE_REQUIRED: &str = "Access denied: Admin role required";

#[derive(Clone)]
pub struct AdminAuth {
    auth: AuthService,
}

impl AdminAuth {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    pub fn service(&self) -> &AuthService {
        &self.auth
    }

    pub fn initiate_discord_oauth(&self) -> CoreResult<AuthUrl> {
        self.auth.oauth().authorization_url()
    }

    /// Complete the OAuth flow and issue an admin session.
    ///
    /// The user record is upserted first (without guilds); only then is the
    /// role checked, so a non-admin is recorded but gets no tokens.
    pub async fn handle_discord_callback(
        &self,
        code: &str,
        code_verifier: &str,
        device: Option<DeviceInfo>,
    ) -> CoreResult<LoginResult> {
        info!(tags = ?["auth"], "Admin OAuth callback started");

        let oauth = self.auth.oauth();
        let provider_tokens = oauth.exchange_code(code, code_verifier).await?;
        debug!(tags = ?["auth", "discord"], "Discord tokens exchanged");

        let profile = oauth.fetch_profile(&provider_tokens.access_token).await?;
        debug!(discord_id = %profile.id, tags = ?["auth", "discord"], "Discord profile fetched");

        let user = self.auth.find_or_create_user(&profile, None).await?;

        if !user.role.is_admin() || user.is_deleted() {
            warn!(
                user_id = %user.id,
                role = %user.role,
                discord_id = %profile.id,
                banned = user.is_deleted(),
                tags = ?["auth", "admin", "security"],
                "Non-admin attempted admin login"
            );
            return Err(HttpFault::forbidden()
                .with_message_key(MessageKey::AdminAccessRequired)
                .into());
        }

        let pair = self
            .auth
            .generate_token_pair(&user, TokenIntent::Admin, device)
            .await?;
        info!(user_id = %user.id, tags = ?["auth", "admin"], "Admin login successful");

        Ok(LoginResult {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: AuthUser::from(&user),
        })
    }

    /// Base validation, then reject any token whose role is not an admin role.
    pub fn validate_access_token(&self, token: &str) -> TokenValidation<AccessTokenClaims> {
        match self.auth.validate_access_token(token) {
            TokenValidation::Valid(claims) if !claims.role.is_admin() => {
                TokenValidation::invalid(ADMIN_ROLE_REQUIRED)
            }
            other => other,
        }
    }

    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        device: Option<DeviceInfo>,
    ) -> CoreResult<RotationOutcome> {
        self.auth
            .rotate_refresh_token(refresh_token, TokenIntent::Admin, device)
            .await
    }

    pub async fn revoke_session(&self, refresh_token: &str) -> CoreResult<bool> {
        self.auth
            .revoke_refresh_token(refresh_token, TokenIntent::Admin)
            .await
    }

    pub async fn get_any_user_sessions(&self, user_id: &str) -> CoreResult<Vec<SessionInfo>> {
        self.auth.refresh_tokens().list_active_sessions(user_id).await
    }

    /// Revoke a session by record id. No token is needed.
    pub async fn revoke_any_user_session(&self, token_id: &str) -> CoreResult<bool> {
        let revoked = self.auth.refresh_tokens().revoke(token_id).await?;
        info!(token_id, revoked, tags = ?["auth", "admin"], "Admin revoked session");
        Ok(revoked)
    }

    pub async fn revoke_all_user_sessions(&self, user_id: &str) -> CoreResult<u64> {
        let count = self.auth.refresh_tokens().revoke_all_for_user(user_id).await?;
        info!(user_id, count, tags = ?["auth", "admin"], "Admin revoked all sessions");
        Ok(count)
    }
}
