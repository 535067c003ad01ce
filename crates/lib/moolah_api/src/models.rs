//! Request and response bodies of the RPC surface.

use chrono::{DateTime, Utc};
use moolah_core::auth::jwt::VerifyFailureCode;
use moolah_core::auth::{RotationOutcome, TokenValidation};
use moolah_core::models::auth::{AccessTokenClaims, AuthUser, DeviceInfo, LoginResult};
use moolah_core::models::user::{User, UserQuery, UserRole};
use moolah_core::users::UsersPage;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Auth
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleDiscordCallbackInput {
    pub code: String,
    pub code_verifier: String,
    #[serde(flatten)]
    pub device: DeviceInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

impl From<LoginResult> for LoginOutput {
    fn from(login: LoginResult) -> Self {
        Self {
            access_token: login.access_token,
            refresh_token: login.refresh_token,
            user: login.user,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateAccessTokenInput {
    pub token: String,
}

/// `{valid: true, payload}` or `{valid: false, reason, code?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenValidationOutput {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<AccessTokenClaims>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<VerifyFailureCode>,
}

impl From<TokenValidation<AccessTokenClaims>> for TokenValidationOutput {
    fn from(validation: TokenValidation<AccessTokenClaims>) -> Self {
        match validation {
            TokenValidation::Valid(claims) => Self {
                valid: true,
                payload: Some(claims),
                reason: None,
                code: None,
            },
            TokenValidation::Invalid { reason, code } => Self {
                valid: false,
                payload: None,
                reason: Some(reason),
                code,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshAccessTokenInput {
    pub refresh_token: String,
    #[serde(flatten)]
    pub device: DeviceInfo,
}

/// `{success: true, accessToken, refreshToken}` or `{success: false, reason}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<RotationOutcome> for RotationOutput {
    fn from(outcome: RotationOutcome) -> Self {
        match outcome {
            RotationOutcome::Rotated {
                access_token,
                refresh_token,
            } => Self {
                success: true,
                access_token: Some(access_token),
                refresh_token: Some(refresh_token),
                reason: None,
            },
            RotationOutcome::Rejected { reason } => Self {
                success: false,
                access_token: None,
                refresh_token: None,
                reason: Some(reason),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeSessionInput {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessOutput {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedCountOutput {
    pub revoked_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdInput {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdInput {
    pub token_id: String,
}

// -----------------------------------------------------------------------------
// Current user
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserDto {
    pub id: String,
    pub discord_id: String,
    pub role: UserRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub email_is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for CurrentUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            discord_id: user.discord_id,
            role: user.role,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            email: user.email,
            email_is_verified: user.email_is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNameInput {
    pub display_name: String,
}

// -----------------------------------------------------------------------------
// Admin users
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRowDto {
    pub id: String,
    pub discord_id: String,
    pub role: UserRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<User> for AdminUserRowDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            discord_id: user.discord_id,
            role: user.role,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            email: user.email,
            created_at: user.created_at,
            deleted_at: user.deleted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserDetailDto {
    pub id: String,
    pub discord_id: String,
    pub role: UserRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub email_is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<User> for AdminUserDetailDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            discord_id: user.discord_id,
            role: user.role,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            email: user.email,
            email_is_verified: user.email_is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminGetUsersInput {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub include_deleted: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<AdminGetUsersInput> for UserQuery {
    fn from(input: AdminGetUsersInput) -> Self {
        let defaults = UserQuery::default();
        Self {
            search: input.search.filter(|s| !s.trim().is_empty()),
            role: input.role,
            include_deleted: input.include_deleted,
            page: input.page.unwrap_or(defaults.page),
            limit: input.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminGetUsersOutput {
    pub users: Vec<AdminUserRowDto>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u32,
}

impl From<UsersPage> for AdminGetUsersOutput {
    fn from(page: UsersPage) -> Self {
        Self {
            users: page.users.into_iter().map(AdminUserRowDto::from).collect(),
            total: page.total,
            total_pages: page.total_pages,
            page: page.page,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRoleInput {
    pub user_id: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminMutationResultDto {
    pub success: bool,
    pub id: String,
}

impl AdminMutationResultDto {
    pub fn done(id: String) -> Self {
        Self { success: true, id }
    }
}
