use moolah_core::auth::ClientAuth;
use moolah_core::error::CoreError;
use moolah_core::models::auth::{AuthUrl, SessionInfo};

use super::supplied;
use crate::error::RpcResult;
use crate::models::{
    HandleDiscordCallbackInput, LoginOutput, RefreshAccessTokenInput, RevokeSessionInput,
    RevokedCountOutput, RotationOutput, SuccessOutput, TokenValidationOutput, UserIdInput,
    ValidateAccessTokenInput,
};
use crate::rpc::{RpcContext, RpcHandler, RpcList};

#[derive(Clone)]
pub struct AuthClientTarget {
    auth: ClientAuth,
    rpc: RpcHandler,
}

impl AuthClientTarget {
    pub fn new(auth: ClientAuth, rpc: RpcHandler) -> Self {
        Self { auth, rpc }
    }

    pub fn auth(&self) -> &ClientAuth {
        &self.auth
    }

    /// Authorization URL plus the PKCE verifier and state the caller must keep.
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

    /// Rotate the refresh token.
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

    pub async fn revoke_all_sessions(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<RevokedCountOutput> {
        self.rpc
            .rpc(ctx, async {
                let revoked_count = self.auth.revoke_all_sessions(&input.user_id).await?;
                Ok::<_, CoreError>(RevokedCountOutput { revoked_count })
            })
            .await
    }

    pub async fn get_user_sessions(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<Vec<SessionInfo>> {
        self.rpc
            .rpc_list(ctx, async {
                let sessions = self.auth.get_user_sessions(&input.user_id).await?;
                Ok::<_, CoreError>(RpcList::all(sessions))
            })
            .await
    }
}
