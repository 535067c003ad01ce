//! Route paths. Every RPC method is a JSON `POST`.

pub const POST_AUTH_INITIATE_DISCORD_OAUTH: &str = "/rpc/auth/initiateDiscordOAuth";
pub const POST_AUTH_HANDLE_DISCORD_CALLBACK: &str = "/rpc/auth/handleDiscordCallback";
pub const POST_AUTH_VALIDATE_ACCESS_TOKEN: &str = "/rpc/auth/validateAccessToken";
pub const POST_AUTH_REFRESH_ACCESS_TOKEN: &str = "/rpc/auth/refreshAccessToken";
pub const POST_AUTH_REVOKE_SESSION: &str = "/rpc/auth/revokeSession";
pub const POST_AUTH_REVOKE_ALL_SESSIONS: &str = "/rpc/auth/revokeAllSessions";
pub const POST_AUTH_GET_USER_SESSIONS: &str = "/rpc/auth/getUserSessions";

pub const POST_ME_GET_CURRENT_USER: &str = "/rpc/me/getCurrentUser";
pub const POST_ME_UPDATE_DISPLAY_NAME: &str = "/rpc/me/updateDisplayName";

pub const POST_ADMIN_AUTH_INITIATE_DISCORD_OAUTH: &str = "/rpc/admin/auth/initiateDiscordOAuth";
pub const POST_ADMIN_AUTH_HANDLE_DISCORD_CALLBACK: &str = "/rpc/admin/auth/handleDiscordCallback";
pub const POST_ADMIN_AUTH_VALIDATE_ACCESS_TOKEN: &str = "/rpc/admin/auth/validateAccessToken";
pub const POST_ADMIN_AUTH_REFRESH_ACCESS_TOKEN: &str = "/rpc/admin/auth/refreshAccessToken";
pub const POST_ADMIN_AUTH_REVOKE_SESSION: &str = "/rpc/admin/auth/revokeSession";
pub const POST_ADMIN_AUTH_GET_ANY_USER_SESSIONS: &str = "/rpc/admin/auth/getAnyUserSessions";
pub const POST_ADMIN_AUTH_REVOKE_ANY_USER_SESSION: &str = "/rpc/admin/auth/revokeAnyUserSession";
pub const POST_ADMIN_AUTH_REVOKE_ALL_USER_SESSIONS: &str = "/rpc/admin/auth/revokeAllUserSessions";

pub const POST_ADMIN_USERS_GET_USER: &str = "/rpc/admin/users/getUser";
pub const POST_ADMIN_USERS_GET_USERS: &str = "/rpc/admin/users/getUsers";
pub const POST_ADMIN_USERS_UPDATE_USER_ROLE: &str = "/rpc/admin/users/updateUserRole";
pub const POST_ADMIN_USERS_BAN_USER: &str = "/rpc/admin/users/banUser";
pub const POST_ADMIN_USERS_UNBAN_USER: &str = "/rpc/admin/users/unbanUser";
