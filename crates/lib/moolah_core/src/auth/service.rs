//! Logic shared by the client and admin auth surfaces: user upsert on login,
//! token pair issuance, refresh-token rotation and revocation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use super::discord::OAuthProvider;
use super::jwt::generate_secure_token;
use super::refresh_tokens::RefreshTokenService;
use super::tokens::{self, REFRESH_TOKEN_EXPIRY_SECS, TokenValidation};
use crate::error::{CoreResult, InternalFault, InternalKind};
use crate::models::auth::{
    AccessTokenClaims, DeviceInfo, DiscordGuild, DiscordProfile, TokenIntent, TokenPair,
};
use crate::models::user::{NewUser, ProfileUpdate, User, UserRole};
use crate::store::{RefreshTokenStore, UserStore};

/// Entropy of a generated user id, in bytes.
const USER_ID_BYTES: usize = 16;

/// Result of [`AuthService::rotate_refresh_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    Rotated {
        access_token: String,
        refresh_token: String,
    },
    Rejected {
        reason: String,
    },
}

impl RotationOutcome {
    fn rejected(reason: impl Into<String>) -> Self {
        RotationOutcome::Rejected {
            reason: reason.into(),
        }
    }
}

/// Shared auth service. Cheap to clone.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: RefreshTokenService,
    oauth: Arc<dyn OAuthProvider>,
    jwt_secret: Arc<[u8]>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        oauth: Arc<dyn OAuthProvider>,
        jwt_secret: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokenService::new(refresh_store),
            oauth,
            jwt_secret: Arc::from(jwt_secret.as_ref()),
        }
    }

    pub fn oauth(&self) -> &dyn OAuthProvider {
        self.oauth.as_ref()
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenService {
        &self.refresh_tokens
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn jwt_secret(&self) -> &[u8] {
        &self.jwt_secret
    }

    /// Upsert the user behind a Discord profile.
    ///
    /// Existing users get their Discord-sourced fields refreshed; `guilds`,
    /// when given, replaces the cached guild list. New users start as
    /// [`UserRole::Regular`].
    pub async fn find_or_create_user(
        &self,
        profile: &DiscordProfile,
        guilds: Option<Vec<DiscordGuild>>,
    ) -> CoreResult<User> {
        let now = Utc::now();

        if let Some(existing) = self.users.find_user_by_discord_id(&profile.id).await? {
            let update = ProfileUpdate {
                display_name: profile.username.clone(),
                avatar_url: profile.avatar_url(),
                email: profile.email.clone(),
                email_is_verified: profile.verified,
                discord_guilds: guilds,
                now,
            };
            return self
                .users
                .update_user_profile(&existing.id, update)
                .await?
                .ok_or_else(|| {
                    InternalFault::new(InternalKind::ResourceNotFound)
                        .message("user disappeared during profile update")
                        .meta("userId", existing.id.clone())
                        .origin("AuthService", "find_or_create_user")
                        .tags(&["auth"])
                        .into()
                });
        }

        let user = self
            .users
            .insert_user(NewUser {
                id: generate_secure_token(USER_ID_BYTES),
                discord_id: profile.id.clone(),
                role: UserRole::Regular,
                display_name: profile.username.clone(),
                avatar_url: profile.avatar_url(),
                email: profile.email.clone(),
                email_is_verified: profile.verified,
                discord_guilds: guilds,
                now,
            })
            .await?;
        info!(
            user_id = %user.id,
            discord_id = %user.discord_id,
            tags = ?["auth"],
            "created user from Discord profile"
        );
        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> CoreResult<Option<User>> {
        self.users.find_user_by_id(user_id).await
    }

    /// Issue an access token and a refresh token for `user`.
    ///
    /// The refresh-token record is stored before the refresh token is signed,
    /// so the id embedded in the token always resolves.
    pub async fn generate_token_pair(
        &self,
        user: &User,
        intent: TokenIntent,
        device: Option<DeviceInfo>,
    ) -> CoreResult<TokenPair> {
        let expires_at = Utc::now() + Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS);
        let refresh_token_id = self
            .refresh_tokens
            .create(&user.id, expires_at, intent, device)
            .await?;

        let access_token =
            tokens::generate_access_token(&self.jwt_secret, &user.id, &user.discord_id, user.role)?;
        let refresh_token =
            tokens::generate_refresh_token(&self.jwt_secret, &user.id, &refresh_token_id, intent)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_token_id,
        })
    }

    pub fn validate_access_token(&self, token: &str) -> TokenValidation<AccessTokenClaims> {
        tokens::validate_access_token(&self.jwt_secret, token)
    }

    /// Exchange a refresh token for a new pair. The presented token is single-use.
    ///
    /// Without `device`, the new record inherits the old record's device info.
    pub async fn rotate_refresh_token(
        &self,
        refresh_token: &str,
        expected_intent: TokenIntent,
        device: Option<DeviceInfo>,
    ) -> CoreResult<RotationOutcome> {
        let claims = match tokens::validate_refresh_token(&self.jwt_secret, refresh_token, expected_intent) {
            TokenValidation::Valid(claims) => claims,
            TokenValidation::Invalid { reason, .. } => {
                debug!(%reason, "refresh token rejected");
                return Ok(RotationOutcome::Rejected { reason });
            }
        };

        let Some(record) = self.refresh_tokens.find_valid(&claims.token_id).await? else {
            return Ok(RotationOutcome::rejected("Refresh token not found or expired"));
        };

        if record.intent != claims.intent {
            return Ok(RotationOutcome::rejected("Token intent mismatch"));
        }

        let user = match self.users.find_user_by_id(&claims.sub).await? {
            Some(user) if !user.is_deleted() => user,
            _ => return Ok(RotationOutcome::rejected("User not found")),
        };

        self.refresh_tokens.touch_last_used(&record.id).await;
        if !self.refresh_tokens.revoke(&record.id).await? {
            // Another rotation of the same token won the race.
            return Ok(RotationOutcome::rejected("Refresh token not found or expired"));
        }

        let device = device.or_else(|| Some(record.device_info()));
        let pair = self.generate_token_pair(&user, claims.intent, device).await?;
        debug!(user_id = %user.id, intent = %claims.intent, "rotated refresh token");

        Ok(RotationOutcome::Rotated {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Revoke the record behind a refresh token.
    ///
    /// A token that fails verification is a no-op returning `false`.
    pub async fn revoke_refresh_token(
        &self,
        refresh_token: &str,
        expected_intent: TokenIntent,
    ) -> CoreResult<bool> {
        match tokens::validate_refresh_token(&self.jwt_secret, refresh_token, expected_intent) {
            TokenValidation::Valid(claims) => {
                self.refresh_tokens.revoke(&claims.token_id).await?;
                Ok(true)
            }
            TokenValidation::Invalid { .. } => Ok(false),
        }
    }
}
