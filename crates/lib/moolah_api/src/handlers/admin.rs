//! Admin RPC handlers, under `/rpc/admin`.

use axum::extract::State;
use moolah_core::models::auth::{AuthUrl, SessionInfo};

use crate::AppState;
use crate::error::RpcResult;
use crate::models::{
    AdminGetUsersInput, AdminGetUsersOutput, AdminMutationResultDto, AdminUpdateUserRoleInput,
    AdminUserDetailDto, HandleDiscordCallbackInput, LoginOutput, RefreshAccessTokenInput,
    RevokeSessionInput, RevokedCountOutput, RotationOutput, SuccessOutput, TokenIdInput,
    TokenValidationOutput, UserIdInput, ValidateAccessTokenInput,
};
use crate::rpc::{RpcContext, RpcInput};

// -----------------------------------------------------------------------------
// Auth (public)
// -----------------------------------------------------------------------------

pub async fn initiate_discord_oauth_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
) -> RpcResult<AuthUrl> {
    state.auth_admin.initiate_discord_oauth(&ctx).await
}

/// `POST /rpc/admin/auth/handleDiscordCallback`. Fails with FORBIDDEN for non-admins.
pub async fn handle_discord_callback_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<HandleDiscordCallbackInput>,
) -> RpcResult<LoginOutput> {
    state.auth_admin.handle_discord_callback(&ctx, input).await
}

pub async fn validate_access_token_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<ValidateAccessTokenInput>,
) -> RpcResult<TokenValidationOutput> {
    state.auth_admin.validate_access_token(&ctx, input).await
}

pub async fn refresh_access_token_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<RefreshAccessTokenInput>,
) -> RpcResult<RotationOutput> {
    state.auth_admin.refresh_access_token(&ctx, input).await
}

pub async fn revoke_session_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<RevokeSessionInput>,
) -> RpcResult<SuccessOutput> {
    state.auth_admin.revoke_session(&ctx, input).await
}

// -----------------------------------------------------------------------------
// Sessions of any user (admin token required)
// -----------------------------------------------------------------------------

pub async fn get_any_user_sessions_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<UserIdInput>,
) -> RpcResult<Vec<SessionInfo>> {
    state.auth_admin.get_any_user_sessions(&ctx, input).await
}

pub async fn revoke_any_user_session_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<TokenIdInput>,
) -> RpcResult<SuccessOutput> {
    state.auth_admin.revoke_any_user_session(&ctx, input).await
}

pub async fn revoke_all_user_sessions_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<UserIdInput>,
) -> RpcResult<RevokedCountOutput> {
    state.auth_admin.revoke_all_user_sessions(&ctx, input).await
}

// -----------------------------------------------------------------------------
// User moderation (admin token required)
// -----------------------------------------------------------------------------

pub async fn get_user_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<UserIdInput>,
) -> RpcResult<Option<AdminUserDetailDto>> {
    state.users_admin.get_user(&ctx, input).await
}

pub async fn get_users_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<AdminGetUsersInput>,
) -> RpcResult<AdminGetUsersOutput> {
    state.users_admin.get_users(&ctx, input).await
}

pub async fn update_user_role_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<AdminUpdateUserRoleInput>,
) -> RpcResult<AdminMutationResultDto> {
    state.users_admin.update_user_role(&ctx, input).await
}

pub async fn ban_user_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<UserIdInput>,
) -> RpcResult<AdminMutationResultDto> {
    state.users_admin.ban_user(&ctx, input).await
}

pub async fn unban_user_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<UserIdInput>,
) -> RpcResult<AdminMutationResultDto> {
    state.users_admin.unban_user(&ctx, input).await
}
