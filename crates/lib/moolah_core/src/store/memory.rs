//! In-memory backend over [`DashMap`]s.
//!
//! Per-entry locks give the same guarantees the SQL backend gets from
//! conditional updates: Discord ids stay unique and a refresh token can only
//! be revoked once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{RefreshTokenStore, UserStore};
use crate::error::{CoreResult, ErrorCode, HttpFault};
use crate::models::auth::{NewRefreshToken, RefreshTokenRecord};
use crate::models::user::{NewUser, ProfileUpdate, User, UserPage, UserQuery, UserRole};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// Discord id → user id.
    discord_index: DashMap<String, String>,
    refresh_tokens: DashMap<String, RefreshTokenRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored refresh-token record, revoked or not.
    pub fn refresh_token_records(&self) -> Vec<RefreshTokenRecord> {
        self.refresh_tokens.iter().map(|r| r.value().clone()).collect()
    }

    fn update_user(&self, id: &str, f: impl FnOnce(&mut User)) -> Option<User> {
        let mut user = self.users.get_mut(id)?;
        f(user.value_mut());
        Some(user.value().clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> CoreResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn find_user_by_discord_id(&self, discord_id: &str) -> CoreResult<Option<User>> {
        let Some(id) = self.discord_index.get(discord_id).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.find_user_by_id(&id).await
    }

    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        match self.discord_index.entry(user.discord_id.clone()) {
            Entry::Occupied(_) => {
                Err(HttpFault::conflict().with_code(ErrorCode::AlreadyExists).into())
            }
            Entry::Vacant(slot) => {
                let guilds_updated_at = user.discord_guilds.as_ref().map(|_| user.now);
                let stored = User {
                    id: user.id.clone(),
                    discord_id: user.discord_id,
                    role: user.role,
                    display_name: user.display_name,
                    avatar_url: user.avatar_url,
                    email: user.email,
                    email_is_verified: user.email_is_verified,
                    discord_guilds: user.discord_guilds,
                    discord_guilds_updated_at: guilds_updated_at,
                    created_at: user.now,
                    updated_at: user.now,
                    deleted_at: None,
                };
                self.users.insert(user.id.clone(), stored.clone());
                slot.insert(user.id);
                Ok(stored)
            }
        }
    }

    async fn update_user_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> CoreResult<Option<User>> {
        Ok(self.update_user(id, |user| {
            user.display_name = update.display_name;
            user.avatar_url = update.avatar_url;
            user.email = update.email;
            user.email_is_verified = update.email_is_verified;
            if let Some(guilds) = update.discord_guilds {
                user.discord_guilds = Some(guilds);
                user.discord_guilds_updated_at = Some(update.now);
            }
            user.updated_at = update.now;
        }))
    }

    async fn update_user_role(
        &self,
        id: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        Ok(self
            .update_user(id, |user| {
                user.role = role;
                user.updated_at = now;
            })
            .is_some())
    }

    async fn update_display_name(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        Ok(self
            .update_user(id, |user| {
                user.display_name = display_name.to_string();
                user.updated_at = now;
            })
            .is_some())
    }

    async fn set_user_deleted_at(
        &self,
        id: &str,
        deleted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        Ok(self
            .update_user(id, |user| {
                user.deleted_at = deleted_at;
                user.updated_at = now;
            })
            .is_some())
    }

    async fn list_users(&self, query: &UserQuery) -> CoreResult<UserPage> {
        let mut matching: Vec<User> = self
            .users
            .iter()
            .filter(|u| query.matches(u.value()))
            .map(|u| u.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let users = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok(UserPage { users, total })
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> CoreResult<()> {
        let record = token.into_record();
        self.refresh_tokens.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<RefreshTokenRecord>> {
        Ok(self
            .refresh_tokens
            .get(id)
            .filter(|r| r.is_active_at(now))
            .map(|r| r.value().clone()))
    }

    async fn revoke_refresh_token(&self, id: &str, now: DateTime<Utc>) -> CoreResult<bool> {
        let Some(mut record) = self.refresh_tokens.get_mut(id) else {
            return Ok(false);
        };
        if record.revoked_at.is_some() {
            return Ok(false);
        }
        record.revoked_at = Some(now);
        Ok(true)
    }

    async fn revoke_user_refresh_tokens(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<u64> {
        let mut revoked = 0;
        for mut record in self.refresh_tokens.iter_mut() {
            if record.user_id == user_id && record.is_active_at(now) {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn touch_refresh_token(&self, id: &str, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(mut record) = self.refresh_tokens.get_mut(id) {
            record.last_used_at = Some(now);
        }
        Ok(())
    }

    async fn list_active_refresh_tokens(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<RefreshTokenRecord>> {
        let mut records: Vec<RefreshTokenRecord> = self
            .refresh_tokens
            .iter()
            .filter(|r| r.user_id == user_id && r.is_active_at(now))
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }
}
