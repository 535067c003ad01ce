//! Authentication domain models.
//!
//! Token claims use the wire names signed into tokens (`discordId`,
//! `tokenId`, `type`), everything else is plain domain data.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{User, UserRole};

/// Trust boundary a refresh token was issued through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenIntent {
    Client,
    Admin,
}

impl TokenIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenIntent::Client => "client",
            TokenIntent::Admin => "admin",
        }
    }
}

impl fmt::Display for TokenIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(TokenIntent::Client),
            "admin" => Ok(TokenIntent::Admin),
            other => Err(format!("unknown token intent: {other}")),
        }
    }
}

/// Discriminator stamped into every token as the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Caller-supplied device metadata attached to a refresh-token record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

/// One row per issued refresh token. Never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: String,
    pub user_id: String,
    pub intent: TokenIntent,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub device_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Active iff not revoked and not yet expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            user_agent: self.user_agent.clone(),
            ip_address: self.ip_address.clone(),
            device_name: self.device_name.clone(),
        }
    }

    pub fn to_session(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            device_name: self.device_name.clone(),
            user_agent: self.user_agent.clone(),
            ip_address: self.ip_address.clone(),
            created_at: self.created_at,
            last_used_at: self.last_used_at,
            expires_at: self.expires_at,
        }
    }
}

/// Insert payload for a refresh-token record.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub id: String,
    pub user_id: String,
    pub intent: TokenIntent,
    pub expires_at: DateTime<Utc>,
    pub device: DeviceInfo,
    pub created_at: DateTime<Utc>,
}

impl NewRefreshToken {
    pub fn into_record(self) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: self.id,
            user_id: self.user_id,
            intent: self.intent,
            expires_at: self.expires_at,
            user_agent: self.device.user_agent,
            ip_address: self.device.ip_address,
            device_name: self.device.device_name,
            created_at: self.created_at,
            last_used_at: None,
            revoked_at: None,
        }
    }
}

/// Active session as shown in "active devices" listings. Holds no secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub device_name: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: user id.
    pub sub: String,
    #[serde(rename = "discordId")]
    pub discord_id: String,
    pub role: UserRole,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Subject: user id.
    pub sub: String,
    /// Id of the backing [`RefreshTokenRecord`].
    #[serde(rename = "tokenId")]
    pub token_id: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub intent: TokenIntent,
    pub iat: i64,
    pub exp: i64,
}

/// Discord user profile after shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub verified: bool,
    pub locale: String,
}

impl DiscordProfile {
    /// CDN URL of the avatar, if the user has one.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{hash}.png", self.id))
    }
}

/// Discord guild as cached on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordGuild {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub owner: bool,
    /// Permission bitfield as a decimal string.
    pub permissions: String,
}

/// Tokens returned by the provider's code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Authorization URL plus the per-attempt secrets the caller must keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrl {
    pub auth_url: String,
    pub state: String,
    pub code_verifier: String,
}

/// Freshly issued access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_token_id: String,
}

/// User fields returned after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub discord_id: String,
    pub role: UserRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            discord_id: user.discord_id.clone(),
            role: user.role,
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            email: user.email.clone(),
        }
    }
}

/// Result of a completed OAuth callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}
