//! RPC targets: one per surface, each forwarding to a core service through
//! [`RpcHandler`](crate::rpc::RpcHandler).

pub mod auth_admin;
pub mod auth_client;
pub mod current_user;
pub mod users_admin;

pub use auth_admin::AuthAdminTarget;
pub use auth_client::AuthClientTarget;
pub use current_user::CurrentUserTarget;
pub use users_admin::UsersAdminTarget;

use moolah_core::models::auth::DeviceInfo;

/// Empty device info means "not supplied", so rotation can inherit the old one.
fn supplied(device: DeviceInfo) -> Option<DeviceInfo> {
    (device != DeviceInfo::default()).then_some(device)
}
