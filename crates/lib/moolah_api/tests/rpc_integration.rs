//! Integration test: build the router over an in-memory store and a scripted
//! OAuth provider, then drive the RPC surface over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use moolah_api::i18n::Messages;
use moolah_api::{AppState, routes};
use moolah_core::auth::{AuthService, OAuthProvider};
use moolah_core::error::{CoreResult, ErrorCode, HttpFault};
use moolah_core::models::auth::{AuthUrl, DiscordGuild, DiscordProfile, ProviderTokens};
use moolah_core::models::user::UserRole;
use moolah_core::store::{MemoryStore, UserStore};
use serde_json::{Value, json};
use tower::ServiceExt;

struct ScriptedDiscord;

#[async_trait]
impl OAuthProvider for ScriptedDiscord {
    fn authorization_url(&self) -> CoreResult<AuthUrl> {
        Ok(AuthUrl {
            auth_url: "https://discord.test/oauth2/authorize?state=st".into(),
            state: "st".into(),
            code_verifier: "cv".into(),
        })
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> CoreResult<ProviderTokens> {
        if code != "validcode" || code_verifier != "validverifier" {
            return Err(HttpFault::bad_request()
                .with_code(ErrorCode::InvalidInput)
                .into());
        }
        Ok(ProviderTokens {
            access_token: "discord-access".into(),
            refresh_token: None,
            expires_at: None,
        })
    }

    async fn fetch_profile(&self, _access_token: &str) -> CoreResult<DiscordProfile> {
        Ok(DiscordProfile {
            id: "123".into(),
            username: "bob".into(),
            discriminator: "0".into(),
            avatar: None,
            email: Some("b@x.com".into()),
            verified: true,
            locale: "en".into(),
        })
    }

    async fn fetch_guilds(&self, _access_token: &str) -> CoreResult<Vec<DiscordGuild>> {
        Ok(Vec::new())
    }
}

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthService::new(
        store.clone(),
        store.clone(),
        Arc::new(ScriptedDiscord),
        "integration-secret",
    );
    let state = AppState::new(auth, store.clone(), Arc::new(Messages));
    (store, moolah_api::router(state))
}

async fn call(
    app: &Router,
    path: &str,
    bearer: Option<&str>,
    locale: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    if let Some(locale) = locale {
        req = req.header("accept-language", locale);
    }
    let req = req.body(Body::from(body.to_string())).unwrap();

    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).expect("parse JSON");
    (status, json)
}

async fn login(app: &Router, path: &str) -> (StatusCode, Value) {
    call(
        app,
        path,
        None,
        None,
        json!({ "code": "validcode", "codeVerifier": "validverifier", "userAgent": "it" }),
    )
    .await
}

#[tokio::test]
async fn client_login_sessions_and_rotation() {
    let (_store, app) = app();

    let (status, auth_url) = call(&app, routes::POST_AUTH_INITIATE_DISCORD_OAUTH, None, None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(auth_url["data"]["codeVerifier"], "cv");

    let (status, body) = login(&app, routes::POST_AUTH_HANDLE_DISCORD_CALLBACK).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["user"]["discordId"], "123");
    assert_eq!(body["data"]["user"]["role"], "REGULAR");
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();
    let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (_, validation) = call(
        &app,
        routes::POST_AUTH_VALIDATE_ACCESS_TOKEN,
        None,
        None,
        json!({ "token": access }),
    )
    .await;
    assert_eq!(validation["data"]["valid"], true);
    assert_eq!(validation["data"]["payload"]["type"], "access");

    let (status, sessions) = call(&app, routes::POST_AUTH_GET_USER_SESSIONS, Some(&access), None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions["meta"]["count"], 1);
    assert_eq!(sessions["data"][0]["userAgent"], "it");

    let (_, rotated) = call(
        &app,
        routes::POST_AUTH_REFRESH_ACCESS_TOKEN,
        None,
        None,
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(rotated["data"]["success"], true);
    assert!(rotated["data"]["refreshToken"].is_string());

    let (status, replay) = call(
        &app,
        routes::POST_AUTH_REFRESH_ACCESS_TOKEN,
        None,
        None,
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["data"]["success"], false);
    assert_eq!(replay["data"]["reason"], "Refresh token not found or expired");

    let (_, revoked) = call(&app, routes::POST_AUTH_REVOKE_ALL_SESSIONS, Some(&access), None, json!({})).await;
    assert_eq!(revoked["data"]["revokedCount"], 1);
}

#[tokio::test]
async fn failures_are_translated() {
    let (_store, app) = app();

    let (status, body) = call(
        &app,
        routes::POST_AUTH_HANDLE_DISCORD_CALLBACK,
        None,
        Some("es-ES,es;q=0.9"),
        json!({ "code": "usedcode", "codeVerifier": "validverifier" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(
        body["error"]["message"],
        "Algo falta o es incorrecto. Por favor revisa e intenta de nuevo."
    );

    let (status, body) = call(&app, routes::POST_AUTH_HANDLE_DISCORD_CALLBACK, None, None, json!({ "code": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = call(&app, routes::POST_ME_GET_CURRENT_USER, None, None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
    assert_eq!(body["error"]["message"], "You need to sign in to access this.");

    let (status, body) = call(&app, routes::POST_ME_GET_CURRENT_USER, Some("junk"), None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_INVALID");
}

#[tokio::test]
async fn current_user_profile() {
    let (_store, app) = app();
    let (_, body) = login(&app, routes::POST_AUTH_HANDLE_DISCORD_CALLBACK).await;
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (_, me) = call(&app, routes::POST_ME_GET_CURRENT_USER, Some(&access), None, json!({})).await;
    assert_eq!(me["data"]["displayName"], "bob");
    assert_eq!(me["data"]["emailIsVerified"], true);

    let (status, _) = call(
        &app,
        routes::POST_ME_UPDATE_DISPLAY_NAME,
        Some(&access),
        None,
        json!({ "displayName": "ab" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, renamed) = call(
        &app,
        routes::POST_ME_UPDATE_DISPLAY_NAME,
        Some(&access),
        None,
        json!({ "displayName": "Bobby" }),
    )
    .await;
    assert_eq!(renamed["data"]["displayName"], "Bobby");
}

#[tokio::test]
async fn admin_gate_and_moderation() {
    let (store, app) = app();

    // A regular user is recorded but refused admin tokens.
    let (status, body) = login(&app, routes::POST_ADMIN_AUTH_HANDLE_DISCORD_CALLBACK).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(body["error"]["message"], "Access denied: Admin access required.");
    let user = store.find_user_by_discord_id("123").await.unwrap().unwrap();

    // Client tokens don't open admin routes.
    let (_, client) = login(&app, routes::POST_AUTH_HANDLE_DISCORD_CALLBACK).await;
    let client_access = client["data"]["accessToken"].as_str().unwrap().to_string();
    let client_refresh = client["data"]["refreshToken"].as_str().unwrap().to_string();
    let (status, _) = call(&app, routes::POST_ADMIN_USERS_GET_USERS, Some(&client_access), None, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A second, moderated account.
    store
        .insert_user(moolah_core::models::user::NewUser {
            id: "target".into(),
            discord_id: "999".into(),
            role: UserRole::Regular,
            display_name: "target".into(),
            avatar_url: None,
            email: None,
            email_is_verified: false,
            discord_guilds: None,
            now: Utc::now(),
        })
        .await
        .unwrap();

    store
        .update_user_role(&user.id, UserRole::Admin, Utc::now())
        .await
        .unwrap();
    let (status, admin) = login(&app, routes::POST_ADMIN_AUTH_HANDLE_DISCORD_CALLBACK).await;
    assert_eq!(status, StatusCode::OK);
    let admin_access = admin["data"]["accessToken"].as_str().unwrap().to_string();

    let (_, page) = call(
        &app,
        routes::POST_ADMIN_USERS_GET_USERS,
        Some(&admin_access),
        None,
        json!({ "limit": 1 }),
    )
    .await;
    assert_eq!(page["data"]["total"], 2);
    assert_eq!(page["data"]["totalPages"], 2);

    let (_, banned) = call(
        &app,
        routes::POST_ADMIN_USERS_BAN_USER,
        Some(&admin_access),
        None,
        json!({ "userId": "target" }),
    )
    .await;
    assert_eq!(banned["data"], json!({ "success": true, "id": "target" }));

    let (status, again) = call(
        &app,
        routes::POST_ADMIN_USERS_BAN_USER,
        Some(&admin_access),
        None,
        json!({ "userId": "target" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        again["error"]["message"],
        "There's a conflict with something. Please try again."
    );

    let (_, detail) = call(
        &app,
        routes::POST_ADMIN_USERS_GET_USER,
        Some(&admin_access),
        None,
        json!({ "userId": "target" }),
    )
    .await;
    assert!(detail["data"]["deletedAt"].is_string());

    let (_, missing) = call(
        &app,
        routes::POST_ADMIN_USERS_GET_USER,
        Some(&admin_access),
        None,
        json!({ "userId": "nobody" }),
    )
    .await;
    assert_eq!(missing["ok"], true);
    assert!(missing["data"].is_null());

    // Admin revokes every session the user holds, including the client one.
    let (_, sessions) = call(
        &app,
        routes::POST_ADMIN_AUTH_GET_ANY_USER_SESSIONS,
        Some(&admin_access),
        None,
        json!({ "userId": user.id }),
    )
    .await;
    assert_eq!(sessions["meta"]["count"], 2);

    let (_, revoked) = call(
        &app,
        routes::POST_ADMIN_AUTH_REVOKE_ALL_USER_SESSIONS,
        Some(&admin_access),
        None,
        json!({ "userId": user.id }),
    )
    .await;
    assert_eq!(revoked["data"]["revokedCount"], 2);

    let (_, rotated) = call(
        &app,
        routes::POST_AUTH_REFRESH_ACCESS_TOKEN,
        None,
        None,
        json!({ "refreshToken": client_refresh }),
    )
    .await;
    assert_eq!(rotated["data"]["success"], false);
}
