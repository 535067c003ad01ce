//! Access and refresh token issuance and validation.

use serde::Serialize;
use serde_json::Value;

use super::jwt::{self, SignOptions, Verification, VerifyFailureCode, VerifyOptions};
use crate::error::CoreResult;
use crate::models::auth::{AccessTokenClaims, RefreshTokenClaims, TokenIntent, TokenType};
use crate::models::user::UserRole;

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// Outcome of validating an access or refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValidation<T> {
    Valid(T),
    Invalid {
        reason: String,
        /// Set when the codec rejected the token, `None` for type/intent checks.
        code: Option<VerifyFailureCode>,
    },
}

impl<T> TokenValidation<T> {
    pub fn invalid(reason: impl Into<String>) -> Self {
        TokenValidation::Invalid {
            reason: reason.into(),
            code: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, TokenValidation::Valid(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TokenValidation::Valid(_) => None,
            TokenValidation::Invalid { reason, .. } => Some(reason),
        }
    }
}

#[derive(Serialize)]
struct AccessPayload<'a> {
    sub: &'a str,
    #[serde(rename = "discordId")]
    discord_id: &'a str,
    role: UserRole,
    #[serde(rename = "type")]
    token_type: TokenType,
}

#[derive(Serialize)]
struct RefreshPayload<'a> {
    sub: &'a str,
    #[serde(rename = "tokenId")]
    token_id: &'a str,
    #[serde(rename = "type")]
    token_type: TokenType,
    intent: TokenIntent,
}

/// Sign a 15-minute access token.
pub fn generate_access_token(
    secret: &[u8],
    user_id: &str,
    discord_id: &str,
    role: UserRole,
) -> CoreResult<String> {
    let payload = AccessPayload {
        sub: user_id,
        discord_id,
        role,
        token_type: TokenType::Access,
    };
    jwt::sign(
        secret,
        &payload,
        &SignOptions {
            expires_in: Some(ACCESS_TOKEN_EXPIRY_SECS),
            ..Default::default()
        },
    )
}

/// Sign a 7-day refresh token pointing at refresh-token record `token_id`.
pub fn generate_refresh_token(
    secret: &[u8],
    user_id: &str,
    token_id: &str,
    intent: TokenIntent,
) -> CoreResult<String> {
    let payload = RefreshPayload {
        sub: user_id,
        token_id,
        token_type: TokenType::Refresh,
        intent,
    };
    jwt::sign(
        secret,
        &payload,
        &SignOptions {
            expires_in: Some(REFRESH_TOKEN_EXPIRY_SECS),
            ..Default::default()
        },
    )
}

/// Verify an access token and check its `type` claim.
pub fn validate_access_token(secret: &[u8], token: &str) -> TokenValidation<AccessTokenClaims> {
    let claims = match verify_typed(secret, token, TokenType::Access) {
        Ok(claims) => claims,
        Err(invalid) => return invalid,
    };
    match serde_json::from_value::<AccessTokenClaims>(claims) {
        Ok(claims) => TokenValidation::Valid(claims),
        Err(_) => malformed(),
    }
}

/// Verify a refresh token, check its `type` claim and require `expected_intent`.
pub fn validate_refresh_token(
    secret: &[u8],
    token: &str,
    expected_intent: TokenIntent,
) -> TokenValidation<RefreshTokenClaims> {
    let claims = match verify_typed(secret, token, TokenType::Refresh) {
        Ok(claims) => claims,
        Err(invalid) => return invalid,
    };
    let claims = match serde_json::from_value::<RefreshTokenClaims>(claims) {
        Ok(claims) => claims,
        Err(_) => return malformed(),
    };
    if claims.intent != expected_intent {
        return TokenValidation::invalid(format!(
            "Invalid token intent: expected {expected_intent}, got {}",
            claims.intent
        ));
    }
    TokenValidation::Valid(claims)
}

/// Codec verification plus the `type` discriminator check. The discriminator is
/// checked on the raw claims so a well-signed token of the other kind reports
/// "Invalid token type" rather than a decoding failure.
fn verify_typed<T>(
    secret: &[u8],
    token: &str,
    expected: TokenType,
) -> Result<Value, TokenValidation<T>> {
    let claims = match jwt::verify::<Value>(secret, token, &VerifyOptions::default()) {
        Verification::Valid(claims) => claims,
        Verification::Invalid(failure) => {
            return Err(TokenValidation::Invalid {
                reason: failure.reason,
                code: Some(failure.code),
            });
        }
    };
    if claims.get("type").and_then(Value::as_str) != Some(expected.as_str()) {
        return Err(TokenValidation::invalid("Invalid token type"));
    }
    Ok(claims)
}

fn malformed<T>() -> TokenValidation<T> {
    TokenValidation::Invalid {
        reason: "Token malformed or invalid claims".into(),
        code: Some(VerifyFailureCode::Malformed),
    }
}
