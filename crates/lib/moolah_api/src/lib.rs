//! # moolah_api
//!
//! RPC and HTTP API library for Moolah.

pub mod config;
pub mod error;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod rpc;
pub mod targets;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::post;
use moolah_core::auth::{AdminAuth, AuthService, ClientAuth};
use moolah_core::store::UserStore;
use moolah_core::users::UserService;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{admin, auth, me};
use crate::i18n::Translator;
use crate::rpc::RpcHandler;
use crate::targets::{AuthAdminTarget, AuthClientTarget, CurrentUserTarget, UsersAdminTarget};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_client: AuthClientTarget,
    pub auth_admin: AuthAdminTarget,
    pub current_user: CurrentUserTarget,
    pub users_admin: UsersAdminTarget,
    pub rpc: RpcHandler,
}

impl AppState {
    pub fn new(
        auth: AuthService,
        users: Arc<dyn UserStore>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let rpc = RpcHandler::new(translator);
        let user_service = UserService::new(users);
        Self {
            auth_client: AuthClientTarget::new(ClientAuth::new(auth.clone()), rpc.clone()),
            auth_admin: AuthAdminTarget::new(AdminAuth::new(auth), rpc.clone()),
            current_user: CurrentUserTarget::new(user_service.clone(), rpc.clone()),
            users_admin: UsersAdminTarget::new(user_service, rpc.clone()),
            rpc,
        }
    }
}

impl FromRef<AppState> for RpcHandler {
    fn from_ref(state: &AppState) -> Self {
        state.rpc.clone()
    }
}

/// Run embedded database migrations.
///
/// Delegates to `moolah_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    moolah_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_INITIATE_DISCORD_OAUTH, post(auth::initiate_discord_oauth_handler))
        .route(routes::POST_AUTH_HANDLE_DISCORD_CALLBACK, post(auth::handle_discord_callback_handler))
        .route(routes::POST_AUTH_VALIDATE_ACCESS_TOKEN, post(auth::validate_access_token_handler))
        .route(routes::POST_AUTH_REFRESH_ACCESS_TOKEN, post(auth::refresh_access_token_handler))
        .route(routes::POST_AUTH_REVOKE_SESSION, post(auth::revoke_session_handler))
        .route(routes::POST_ADMIN_AUTH_INITIATE_DISCORD_OAUTH, post(admin::initiate_discord_oauth_handler))
        .route(routes::POST_ADMIN_AUTH_HANDLE_DISCORD_CALLBACK, post(admin::handle_discord_callback_handler))
        .route(routes::POST_ADMIN_AUTH_VALIDATE_ACCESS_TOKEN, post(admin::validate_access_token_handler))
        .route(routes::POST_ADMIN_AUTH_REFRESH_ACCESS_TOKEN, post(admin::refresh_access_token_handler))
        .route(routes::POST_ADMIN_AUTH_REVOKE_SESSION, post(admin::revoke_session_handler));

    // Client routes (require a valid access token)
    let protected = Router::new()
        .route(routes::POST_AUTH_REVOKE_ALL_SESSIONS, post(auth::revoke_all_sessions_handler))
        .route(routes::POST_AUTH_GET_USER_SESSIONS, post(auth::get_user_sessions_handler))
        .route(routes::POST_ME_GET_CURRENT_USER, post(me::get_current_user_handler))
        .route(routes::POST_ME_UPDATE_DISPLAY_NAME, post(me::update_display_name_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Admin routes (require an admin access token)
    let admin_only = Router::new()
        .route(routes::POST_ADMIN_AUTH_GET_ANY_USER_SESSIONS, post(admin::get_any_user_sessions_handler))
        .route(routes::POST_ADMIN_AUTH_REVOKE_ANY_USER_SESSION, post(admin::revoke_any_user_session_handler))
        .route(routes::POST_ADMIN_AUTH_REVOKE_ALL_USER_SESSIONS, post(admin::revoke_all_user_sessions_handler))
        .route(routes::POST_ADMIN_USERS_GET_USER, post(admin::get_user_handler))
        .route(routes::POST_ADMIN_USERS_GET_USERS, post(admin::get_users_handler))
        .route(routes::POST_ADMIN_USERS_UPDATE_USER_ROLE, post(admin::update_user_role_handler))
        .route(routes::POST_ADMIN_USERS_BAN_USER, post(admin::ban_user_handler))
        .route(routes::POST_ADMIN_USERS_UNBAN_USER, post(admin::unban_user_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin_only)
        .layer(cors)
        .with_state(state)
}
