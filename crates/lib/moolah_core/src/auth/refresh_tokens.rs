//! Refresh-token records: creation, lookup, revocation and session listing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::jwt::generate_secure_token;
use crate::error::CoreResult;
use crate::models::auth::{DeviceInfo, NewRefreshToken, RefreshTokenRecord, SessionInfo, TokenIntent};
use crate::store::RefreshTokenStore;

/// Entropy of a refresh-token record id, in bytes.
const TOKEN_ID_BYTES: usize = 32;

/// Service over the refresh-token table.
#[derive(Clone)]
pub struct RefreshTokenService {
    store: Arc<dyn RefreshTokenStore>,
}

impl RefreshTokenService {
    pub fn new(store: Arc<dyn RefreshTokenStore>) -> Self {
        Self { store }
    }

    /// Insert a new record and return its id.
    pub async fn create(
        &self,
        user_id: &str,
        expires_at: DateTime<Utc>,
        intent: TokenIntent,
        device: Option<DeviceInfo>,
    ) -> CoreResult<String> {
        let id = generate_secure_token(TOKEN_ID_BYTES);
        self.store
            .insert_refresh_token(NewRefreshToken {
                id: id.clone(),
                user_id: user_id.to_string(),
                intent,
                expires_at,
                device: device.unwrap_or_default(),
                created_at: Utc::now(),
            })
            .await?;
        debug!(user_id, %intent, "created refresh token");
        Ok(id)
    }

    /// The record if it is active (unrevoked and unexpired).
    pub async fn find_valid(&self, token_id: &str) -> CoreResult<Option<RefreshTokenRecord>> {
        self.store
            .find_active_refresh_token(token_id, Utc::now())
            .await
    }

    /// Revoke one record. `false` if it does not exist or was already revoked.
    pub async fn revoke(&self, token_id: &str) -> CoreResult<bool> {
        self.store.revoke_refresh_token(token_id, Utc::now()).await
    }

    /// Revoke every active record of a user.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> CoreResult<u64> {
        let count = self
            .store
            .revoke_user_refresh_tokens(user_id, Utc::now())
            .await?;
        debug!(user_id, count, "revoked all refresh tokens");
        Ok(count)
    }

    /// Record that a token was just used. Failures are logged, never returned.
    pub async fn touch_last_used(&self, token_id: &str) {
        if let Err(e) = self.store.touch_refresh_token(token_id, Utc::now()).await {
            warn!(error = %e, tags = ?["auth"], "failed to update refresh token last_used_at");
        }
    }

    /// Active sessions of a user, oldest first.
    pub async fn list_active_sessions(&self, user_id: &str) -> CoreResult<Vec<SessionInfo>> {
        let records = self
            .store
            .list_active_refresh_tokens(user_id, Utc::now())
            .await?;
        Ok(records.iter().map(RefreshTokenRecord::to_session).collect())
    }
}
