//! Persistence interface used by the auth and user services.
//!
//! Two backends implement it: [`postgres::PgStore`] for production and
//! [`memory::MemoryStore`] for tests and local runs. Every method takes the
//! caller's notion of "now" so activity checks are evaluated against one clock.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::models::auth::{NewRefreshToken, RefreshTokenRecord};
use crate::models::user::{NewUser, ProfileUpdate, User, UserPage, UserQuery, UserRole};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage for the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: &str) -> CoreResult<Option<User>>;

    async fn find_user_by_discord_id(&self, discord_id: &str) -> CoreResult<Option<User>>;

    /// Insert a user. A duplicate Discord id fails with an `ALREADY_EXISTS` conflict.
    async fn insert_user(&self, user: NewUser) -> CoreResult<User>;

    /// Overwrite the Discord-sourced profile fields. Returns the updated user.
    async fn update_user_profile(&self, id: &str, update: ProfileUpdate)
    -> CoreResult<Option<User>>;

    async fn update_user_role(&self, id: &str, role: UserRole, now: DateTime<Utc>)
    -> CoreResult<bool>;

    async fn update_display_name(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<bool>;

    /// Set or clear the ban marker.
    async fn set_user_deleted_at(
        &self,
        id: &str,
        deleted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> CoreResult<bool>;

    /// Filtered page of users, newest first.
    async fn list_users(&self, query: &UserQuery) -> CoreResult<UserPage>;
}

/// Storage for the `refresh_tokens` table.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> CoreResult<()>;

    /// The record if it is unrevoked and unexpired at `now`, evaluated as one predicate.
    async fn find_active_refresh_token(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<RefreshTokenRecord>>;

    /// Atomic compare-and-set: marks the record revoked only if it is not
    /// already. Of several concurrent calls for one id at most one returns `true`.
    async fn revoke_refresh_token(&self, id: &str, now: DateTime<Utc>) -> CoreResult<bool>;

    /// Revoke every currently active record of a user, returning how many.
    async fn revoke_user_refresh_tokens(&self, user_id: &str, now: DateTime<Utc>)
    -> CoreResult<u64>;

    async fn touch_refresh_token(&self, id: &str, now: DateTime<Utc>) -> CoreResult<()>;

    /// Active records of a user, oldest first.
    async fn list_active_refresh_tokens(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<RefreshTokenRecord>>;
}
