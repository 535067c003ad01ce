//! Client auth RPC handlers, under `/rpc/auth`.

use axum::Extension;
use axum::extract::State;
use moolah_core::models::auth::{AuthUrl, SessionInfo};

use crate::AppState;
use crate::error::RpcResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    HandleDiscordCallbackInput, LoginOutput, RefreshAccessTokenInput, RevokeSessionInput,
    RevokedCountOutput, RotationOutput, SuccessOutput, TokenValidationOutput, UserIdInput,
    ValidateAccessTokenInput,
};
use crate::rpc::{RpcContext, RpcInput};

/// `POST /rpc/auth/initiateDiscordOAuth`
pub async fn initiate_discord_oauth_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
) -> RpcResult<AuthUrl> {
    state.auth_client.initiate_discord_oauth(&ctx).await
}

/// `POST /rpc/auth/handleDiscordCallback`
pub async fn handle_discord_callback_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<HandleDiscordCallbackInput>,
) -> RpcResult<LoginOutput> {
    state.auth_client.handle_discord_callback(&ctx, input).await
}

/// `POST /rpc/auth/validateAccessToken`
pub async fn validate_access_token_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<ValidateAccessTokenInput>,
) -> RpcResult<TokenValidationOutput> {
    state.auth_client.validate_access_token(&ctx, input).await
}

/// `POST /rpc/auth/refreshAccessToken`
pub async fn refresh_access_token_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<RefreshAccessTokenInput>,
) -> RpcResult<RotationOutput> {
    state.auth_client.refresh_access_token(&ctx, input).await
}

/// `POST /rpc/auth/revokeSession`
pub async fn revoke_session_handler(
    State(state): State<AppState>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<RevokeSessionInput>,
) -> RpcResult<SuccessOutput> {
    state.auth_client.revoke_session(&ctx, input).await
}

/// `POST /rpc/auth/revokeAllSessions`. Always the caller's own sessions.
pub async fn revoke_all_sessions_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    ctx: RpcContext,
) -> RpcResult<RevokedCountOutput> {
    let input = UserIdInput { user_id: claims.sub };
    state.auth_client.revoke_all_sessions(&ctx, input).await
}

/// `POST /rpc/auth/getUserSessions`. Always the caller's own sessions.
pub async fn get_user_sessions_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    ctx: RpcContext,
) -> RpcResult<Vec<SessionInfo>> {
    let input = UserIdInput { user_id: claims.sub };
    state.auth_client.get_user_sessions(&ctx, input).await
}
