//! HS256 token signing, verification and unverified decoding.
//!
//! Verification never fails with an error: every rejection is returned as a
//! [`Verification::Invalid`] carrying a [`VerifyFailureCode`], since expired
//! tokens are an ordinary outcome on the request path.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, RngCore, rng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};

/// Options applied when signing.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Lifetime in seconds; stamps `exp = iat + expires_in`.
    pub expires_in: Option<i64>,
    pub subject: Option<String>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub jwt_id: Option<String>,
}

/// Options applied when verifying.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub audience: Option<String>,
    pub issuer: Option<String>,
    /// Allowed clock skew in seconds for `exp`.
    pub clock_tolerance: u64,
}

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFailureCode {
    Expired,
    InvalidSignature,
    Malformed,
    ValidationError,
}

impl VerifyFailureCode {
    pub fn as_str(self) -> &'static str {
        match self {
            VerifyFailureCode::Expired => "expired",
            VerifyFailureCode::InvalidSignature => "invalid_signature",
            VerifyFailureCode::Malformed => "malformed",
            VerifyFailureCode::ValidationError => "validation_error",
        }
    }
}

/// A rejected token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyFailure {
    pub reason: String,
    pub code: VerifyFailureCode,
}

impl VerifyFailure {
    fn new(code: VerifyFailureCode, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            code,
        }
    }
}

/// Outcome of [`verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification<T> {
    Valid(T),
    Invalid(VerifyFailure),
}

impl<T> Verification<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Verification::Valid(claims) => Some(claims),
            Verification::Invalid(_) => None,
        }
    }
}

/// Sign `claims` with HS256, stamping `iat` and any optional registered claims.
///
/// `claims` must serialize to a JSON object.
pub fn sign<T: Serialize>(secret: &[u8], claims: &T, opts: &SignOptions) -> CoreResult<String> {
    let Value::Object(mut payload) = serde_json::to_value(claims)
        .map_err(|e| CoreError::TokenError(format!("jwt claims: {e}")))?
    else {
        return Err(CoreError::TokenError(
            "jwt claims must be a JSON object".into(),
        ));
    };

    let now = Utc::now().timestamp();
    payload.insert("iat".into(), now.into());
    if let Some(expires_in) = opts.expires_in {
        payload.insert("exp".into(), (now + expires_in).into());
    }
    if let Some(sub) = &opts.subject {
        payload.insert("sub".into(), sub.clone().into());
    }
    if let Some(aud) = &opts.audience {
        payload.insert("aud".into(), aud.clone().into());
    }
    if let Some(iss) = &opts.issuer {
        payload.insert("iss".into(), iss.clone().into());
    }
    if let Some(jti) = &opts.jwt_id {
        payload.insert("jti".into(), jti.clone().into());
    }

    encode(
        &Header::new(Algorithm::HS256),
        &payload,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| CoreError::TokenError(format!("jwt encode: {e}")))
}

/// Verify signature, expiry and the optional audience/issuer, then decode the claims.
pub fn verify<T: DeserializeOwned>(
    secret: &[u8],
    token: &str,
    opts: &VerifyOptions,
) -> Verification<T> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.leeway = opts.clock_tolerance;
    match &opts.audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }
    if let Some(iss) = &opts.issuer {
        validation.set_issuer(&[iss]);
    }

    match decode::<T>(token, &DecodingKey::from_secret(secret), &validation) {
        Ok(data) => Verification::Valid(data.claims),
        Err(e) => Verification::Invalid(classify(e.kind())),
    }
}

fn classify(kind: &ErrorKind) -> VerifyFailure {
    use VerifyFailureCode::*;
    match kind {
        ErrorKind::ExpiredSignature => VerifyFailure::new(Expired, "Token expired"),
        ErrorKind::InvalidSignature => VerifyFailure::new(InvalidSignature, "Invalid signature"),
        ErrorKind::InvalidToken
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingAlgorithm
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => VerifyFailure::new(Malformed, "Token malformed or invalid claims"),
        ErrorKind::InvalidAudience => VerifyFailure::new(ValidationError, "Invalid audience"),
        ErrorKind::InvalidIssuer => VerifyFailure::new(ValidationError, "Invalid issuer"),
        ErrorKind::ImmatureSignature => VerifyFailure::new(ValidationError, "Token not yet valid"),
        ErrorKind::MissingRequiredClaim(claim) => {
            VerifyFailure::new(ValidationError, format!("Missing required claim: {claim}"))
        }
        _ => VerifyFailure::new(ValidationError, "Token verification failed"),
    }
}

/// Decode the payload WITHOUT checking the signature or expiry.
///
/// Diagnostics only. Never base an authorization decision on the result.
pub fn decode_unsafe<T: DeserializeOwned>(token: &str) -> Option<T> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;
    decode::<T>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

/// Random URL-safe identifier built from `bytes` bytes of entropy.
pub fn generate_secure_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    load_or_create_secret(&jwt_secret_path())
}

/// Read the secret stored at `path`, or generate one and try to store it there.
///
/// A secret that cannot be stored is still returned, but it will not survive
/// a restart.
fn load_or_create_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    match persist_secret(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "generated JWT secret could not be saved; tokens will not survive a restart"
        ),
    }
    secret
}

fn persist_secret(path: &Path, secret: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, secret)
}

fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moolah")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &[u8] = b"test-secret-at-least-32-bytes-long!!";

    #[test]
    fn sign_then_verify_returns_claims() {
        let token = sign(
            SECRET,
            &json!({ "userId": "u1", "scopes": ["a", "b"] }),
            &SignOptions {
                expires_in: Some(60),
                ..Default::default()
            },
        )
        .unwrap();

        let Verification::Valid(claims) =
            verify::<Value>(SECRET, &token, &VerifyOptions::default())
        else {
            panic!("expected valid token");
        };
        assert_eq!(claims["userId"], "u1");
        assert_eq!(claims["scopes"], json!(["a", "b"]));
        let iat = claims["iat"].as_i64().unwrap();
        assert_eq!(claims["exp"].as_i64().unwrap(), iat + 60);
    }

    #[test]
    fn token_without_expiry_still_verifies() {
        let token = sign(SECRET, &json!({ "k": 1 }), &SignOptions::default()).unwrap();
        let claims = verify::<Value>(SECRET, &token, &VerifyOptions::default())
            .ok()
            .unwrap();
        assert!(claims.get("exp").is_none());
        assert!(claims.get("iat").is_some());
    }

    #[test]
    fn registered_claims_are_stamped() {
        let opts = SignOptions {
            expires_in: Some(60),
            subject: Some("user-1".into()),
            audience: Some("moolah-admin".into()),
            issuer: Some("moolah".into()),
            jwt_id: Some("jti-1".into()),
        };
        let token = sign(SECRET, &json!({}), &opts).unwrap();
        let claims = verify::<Value>(
            SECRET,
            &token,
            &VerifyOptions {
                audience: Some("moolah-admin".into()),
                issuer: Some("moolah".into()),
                clock_tolerance: 0,
            },
        )
        .ok()
        .unwrap();
        assert_eq!(claims["sub"], "user-1");
        assert_eq!(claims["aud"], "moolah-admin");
        assert_eq!(claims["iss"], "moolah");
        assert_eq!(claims["jti"], "jti-1");
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let token = sign(
            SECRET,
            &json!({ "k": 1 }),
            &SignOptions {
                expires_in: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        let Verification::Invalid(failure) =
            verify::<Value>(SECRET, &token, &VerifyOptions::default())
        else {
            panic!("expected expired token");
        };
        assert_eq!(failure.code, VerifyFailureCode::Expired);
        assert_eq!(failure.reason, "Token expired");
    }

    #[test]
    fn clock_tolerance_accepts_recently_expired_token() {
        let token = sign(
            SECRET,
            &json!({ "k": 1 }),
            &SignOptions {
                expires_in: Some(-5),
                ..Default::default()
            },
        )
        .unwrap();
        let strict = verify::<Value>(SECRET, &token, &VerifyOptions::default());
        assert!(!strict.is_valid());
        let lenient = verify::<Value>(
            SECRET,
            &token,
            &VerifyOptions {
                clock_tolerance: 30,
                ..Default::default()
            },
        );
        assert!(lenient.is_valid());
    }

    #[test]
    fn tampered_signature_is_detected_at_every_position() {
        let token = sign(SECRET, &json!({ "k": 1 }), &SignOptions::default()).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for pos in sig_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            let Verification::Invalid(failure) =
                verify::<Value>(SECRET, &tampered, &VerifyOptions::default())
            else {
                panic!("tampered token at {pos} verified");
            };
            assert_eq!(failure.code, VerifyFailureCode::InvalidSignature);
        }
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let token = sign(SECRET, &json!({ "k": 1 }), &SignOptions::default()).unwrap();
        let result = verify::<Value>(b"another-secret", &token, &VerifyOptions::default());
        assert_eq!(
            result,
            Verification::Invalid(VerifyFailure::new(
                VerifyFailureCode::InvalidSignature,
                "Invalid signature"
            ))
        );
    }

    #[test]
    fn garbage_is_malformed() {
        for token in ["", "not-a-token", "a.b", "a.b.c"] {
            let Verification::Invalid(failure) =
                verify::<Value>(SECRET, token, &VerifyOptions::default())
            else {
                panic!("garbage verified: {token}");
            };
            assert_eq!(failure.code, VerifyFailureCode::Malformed, "{token}");
        }
    }

    #[test]
    fn audience_and_issuer_mismatch_are_validation_errors() {
        let token = sign(
            SECRET,
            &json!({}),
            &SignOptions {
                audience: Some("client".into()),
                issuer: Some("moolah".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let aud = verify::<Value>(
            SECRET,
            &token,
            &VerifyOptions {
                audience: Some("admin".into()),
                ..Default::default()
            },
        );
        let iss = verify::<Value>(
            SECRET,
            &token,
            &VerifyOptions {
                issuer: Some("someone-else".into()),
                ..Default::default()
            },
        );
        for result in [aud, iss] {
            let Verification::Invalid(failure) = result else {
                panic!("claim mismatch verified");
            };
            assert_eq!(failure.code, VerifyFailureCode::ValidationError);
        }
    }

    #[test]
    fn decode_unsafe_ignores_signature() {
        let token = sign(SECRET, &json!({ "k": "v" }), &SignOptions::default()).unwrap();
        let claims: Value = decode_unsafe(&token).unwrap();
        assert_eq!(claims["k"], "v");

        let claims: Option<Value> = decode_unsafe("definitely.not.jwt");
        assert!(claims.is_none());
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("moolah-jwt-{}", generate_secure_token(8)))
            .join(name)
    }

    #[test]
    fn generated_secret_is_persisted_and_reused() {
        let path = scratch_path("jwt-secret");
        let first = load_or_create_secret(&path);
        assert_eq!(first.len(), 64);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
        assert_eq!(load_or_create_secret(&path), first);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn unwritable_secret_location_is_reported() {
        // The parent "directory" is a regular file, so nothing can be created under it.
        let blocker = scratch_path("blocker");
        std::fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        std::fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("jwt-secret");

        assert!(persist_secret(&path, "s3cret").is_err());
        let secret = load_or_create_secret(&path);
        assert_eq!(secret.len(), 64);
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(blocker.parent().unwrap());
    }

    #[test]
    fn secure_token_has_expected_length_and_alphabet() {
        let a = generate_secure_token(32);
        let b = generate_secure_token(32);
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(generate_secure_token(16).len(), 22);
    }
}
