use moolah_core::error::CoreError;
use moolah_core::users::UserService;

use crate::error::RpcResult;
use crate::models::{
    AdminGetUsersInput, AdminGetUsersOutput, AdminMutationResultDto, AdminUpdateUserRoleInput,
    AdminUserDetailDto, UserIdInput,
};
use crate::rpc::{RpcContext, RpcHandler};

/// Admin user moderation.
#[derive(Clone)]
pub struct UsersAdminTarget {
    users: UserService,
    rpc: RpcHandler,
}

impl UsersAdminTarget {
    pub fn new(users: UserService, rpc: RpcHandler) -> Self {
        Self { users, rpc }
    }

    /// `null` data when no such user exists.
    pub async fn get_user(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<Option<AdminUserDetailDto>> {
        self.rpc
            .rpc(ctx, async {
                let user = self.users.get_user(&input.user_id).await?;
                Ok::<_, CoreError>(user.map(AdminUserDetailDto::from))
            })
            .await
    }

    pub async fn get_users(
        &self,
        ctx: &RpcContext,
        input: AdminGetUsersInput,
    ) -> RpcResult<AdminGetUsersOutput> {
        self.rpc
            .rpc(ctx, async {
                self.users
                    .get_users(input.into())
                    .await
                    .map(AdminGetUsersOutput::from)
            })
            .await
    }

    pub async fn update_user_role(
        &self,
        ctx: &RpcContext,
        input: AdminUpdateUserRoleInput,
    ) -> RpcResult<AdminMutationResultDto> {
        self.rpc
            .rpc(ctx, async {
                self.users
                    .update_user_role(&input.user_id, input.role)
                    .await
                    .map(AdminMutationResultDto::done)
            })
            .await
    }

    pub async fn ban_user(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<AdminMutationResultDto> {
        self.rpc
            .rpc(ctx, async {
                self.users
                    .ban_user(&input.user_id)
                    .await
                    .map(AdminMutationResultDto::done)
            })
            .await
    }

    pub async fn unban_user(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<AdminMutationResultDto> {
        self.rpc
            .rpc(ctx, async {
                self.users
                    .unban_user(&input.user_id)
                    .await
                    .map(AdminMutationResultDto::done)
            })
            .await
    }
}
