use moolah_core::error::CoreError;
use moolah_core::users::UserService;

use crate::error::RpcResult;
use crate::models::{CurrentUserDto, DisplayNameInput, UserIdInput};
use crate::rpc::{RpcContext, RpcHandler};

#[derive(Clone)]
pub struct CurrentUserTarget {
    users: UserService,
    rpc: RpcHandler,
}

impl CurrentUserTarget {
    pub fn new(users: UserService, rpc: RpcHandler) -> Self {
        Self { users, rpc }
    }

    pub async fn get_current_user(
        &self,
        ctx: &RpcContext,
        input: UserIdInput,
    ) -> RpcResult<CurrentUserDto> {
        self.rpc
            .rpc(ctx, async {
                self.users
                    .get_current_user(&input.user_id)
                    .await
                    .map(CurrentUserDto::from)
            })
            .await
    }

    pub async fn update_display_name(
        &self,
        ctx: &RpcContext,
        user_id: &str,
        input: DisplayNameInput,
    ) -> RpcResult<DisplayNameInput> {
        self.rpc
            .rpc(ctx, async {
                let display_name = self
                    .users
                    .update_current_user_display_name(user_id, &input.display_name)
                    .await?;
                Ok::<_, CoreError>(DisplayNameInput { display_name })
            })
            .await
    }
}
