use moolah_core::auth::AdminAuth;
use moolah_core::error::CoreError;
use moolah_core::models::auth::{AuthUrl, SessionInfo};

use super::supplied;
use crate::error::RpcResult;
use crate::models::{
    HandleDiscordCallbackInput, LoginOutput, RefreshAccessTokenInput, RevokeSessionInput,
    RevokedCountOutput, RotationOutput, SuccessOutput, TokenIdInput, TokenValidationOutput,
    UserIdInput, ValidateAccessTokenInput,
};
use crate::rpc::{RpcContext, RpcHandler, RpcList};

/// Admin auth surface. Tokens carry the `admin` intent and require an admin role.
#[derive(Clone)]
pub struct AuthAdminTarget {
    auth: AdminAuth,
    rpc: RpcHandler,
}

impl AuthAdminTarget {
    pub fn new(auth: AdminAuth, rpc: RpcHandler) -> Self {
        Self { auth, rpc }
    }

    pub fn auth(&self) -> &AdminAuth {
        &self.auth
    }

    pub async fn initiate_discord_oauth(&self, ctx: &RpcContext) -> RpcResult<AuthUrl> {
        self.rpc
            .rpc(ctx, async { self.auth.initiate_discord_oauth() })
            .await
    }

    pub async fn handle_discord_callback(
        &self,
        ctx: &RpcContext,
        input: HandleDiscordCallbackInput,
    ) -> RpcResult<LoginOutput> {
        self.rpc
            .rpc(ctx, async {
                self.auth
                    .handle_discord_callback(
                        &input.code,
                        &input.code_verifier,
                        supplied(input.device),
                    )
                    .await
                    .map(LoginOutput::from)
            })
            .await
    }

    pub async fn validate_access_token(
        &self,
        ctx: &RpcContext,
        input: ValidateAccessTokenInput,
    ) -> RpcResult<TokenValidationOutput> {
        self.rpc
            .rpc(ctx, async {
                let validation = self.auth.validate_access_token(&input.token);
                Ok::<_, CoreError>(TokenValidationOutput::from(validation))
            })
            .await
    }

    pub async fn refresh_access_token(
        &self,
        ctx: &RpcContext,
        input: RefreshAccessTokenInput,
    ) -> RpcResult<RotationOutput> {
        self.rpc
            .rpc(ctx, async {
                self.auth
                    .refresh_access_token(&input.refresh_token, supplied(input.device))
                    .await
                    .map(RotationOutput::from)
            })
            .await
    }

    pub async fn revoke_session(
        &self,
        ctx: &RpcContext,
        input: RevokeSessionInput,
    ) -> RpcResult<SuccessOutput> {
        self.rpc
            .rpc(ctx, async {
                let success = self.auth.revoke_session(&input.refresh_token).await?;
                Ok::<_, CoreError>(SuccessOutput { success })
            })
            .await
    }

    // =========================================================================
    // Other users' sessions
    // =========================================================================

    pub async fn get_any_user_sessions(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<Vec<SessionInfo>> {
        self.rpc
            .rpc_list(ctx, async {
                let sessions = self.auth.get_any_user_sessions(&input.user_id).await?;
                Ok::<_, CoreError>(RpcList::all(sessions))
            })
            .await
    }

    pub async fn revoke_any_user_session(
        &self,
        ctx: &RpcContext,
        input: TokenIdInput,
    ) -> RpcResult<SuccessOutput> {
        self.rpc
            .rpc(ctx, async {
                let success = self.auth.revoke_any_user_session(&input.token_id).await?;
                Ok::<_, CoreError>(SuccessOutput { success })
            })
            .await
    }

    pub async fn revoke_all_user_sessions(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<RevokedCountOutput> {
        self.rpc
            .rpc(ctx, async {
                let revoked_count = self.auth.revoke_all_user_sessions(&input.user_id).await?;
                Ok::<_, CoreError>(RevokedCountOutput { revoked_count })
            })
            .await
    }
}
