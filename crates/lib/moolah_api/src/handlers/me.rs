//! Current-user RPC handlers, under `/rpc/me`. The user is the bearer.

use axum::Extension;
use axum::extract::State;

use crate::AppState;
use crate::error::RpcResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CurrentUserDto, DisplayNameInput, UserIdInput};
use crate::rpc::{RpcContext, RpcInput};

/// `POST /rpc/me/getCurrentUser`
pub async fn get_current_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    ctx: RpcContext,
) -> RpcResult<CurrentUserDto> {
    let input = UserIdInput { user_id: claims.sub };
    state.current_user.get_current_user(&ctx, input).await
}

/// `POST /rpc/me/updateDisplayName`
pub async fn update_display_name_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    ctx: RpcContext,
    RpcInput(input): RpcInput<DisplayNameInput>,
) -> RpcResult<DisplayNameInput> {
    state
        .current_user
        .update_display_name(&ctx, &claims.sub, input)
        .await
}
