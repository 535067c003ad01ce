//! Bearer-token middleware for the client and admin surfaces.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use moolah_core::auth::TokenValidation;
use moolah_core::auth::admin::ADMIN_ROLE_REQUIRED;
use moolah_core::auth::jwt::VerifyFailureCode;
use moolah_core::error::{ErrorCode, HttpFault};
use moolah_core::models::auth::AccessTokenClaims;
use tracing::debug;

use crate::AppState;
use crate::error::RpcError;
use crate::rpc::RpcContext;

/// Verified access-token claims, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AccessTokenClaims);

/// Require a valid access token.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RpcError> {
    authenticate(&state, request, next, |token| {
        state.auth_client.auth().validate_access_token(token)
    })
    .await
}

/// Require a valid access token whose role is an admin role.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RpcError> {
    authenticate(&state, request, next, |token| {
        state.auth_admin.auth().validate_access_token(token)
    })
    .await
}

async fn authenticate(
    state: &AppState,
    mut request: Request,
    next: Next,
    validate: impl FnOnce(&str) -> TokenValidation<AccessTokenClaims>,
) -> Result<Response, RpcError> {
    let ctx = RpcContext::from_headers(request.headers());

    let token = bearer_token(request.headers())
        .ok_or_else(|| state.rpc.reject(HttpFault::unauthorized(), &ctx))?;

    match validate(token) {
        TokenValidation::Valid(claims) => {
            request.extensions_mut().insert(AuthenticatedUser(claims));
            Ok(next.run(request).await)
        }
        TokenValidation::Invalid { reason, code } => {
            debug!(request_id = ctx.id.as_deref(), %reason, tags = ?["auth"], "access token rejected");
            Err(state.rpc.reject(rejection(&reason, code), &ctx))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn rejection(reason: &str, code: Option<VerifyFailureCode>) -> HttpFault {
    if reason == ADMIN_ROLE_REQUIRED {
        return HttpFault::forbidden();
    }
    match code {
        Some(VerifyFailureCode::Expired) => {
            HttpFault::unauthorized().with_code(ErrorCode::AuthExpired)
        }
        _ => HttpFault::unauthorized().with_code(ErrorCode::AuthInvalid),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn rejection_codes() {
        assert_eq!(
            rejection("Token expired", Some(VerifyFailureCode::Expired)).code,
            ErrorCode::AuthExpired
        );
        assert_eq!(
            rejection("Invalid token type", None).code,
            ErrorCode::AuthInvalid
        );
        assert_eq!(rejection(ADMIN_ROLE_REQUIRED, None).status, 403);
    }
}
