//! PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{RefreshTokenStore, UserStore};
use crate::error::{CoreError, CoreResult, ErrorCode, HttpFault, InternalFault, InternalKind};
use crate::models::auth::{DiscordGuild, NewRefreshToken, RefreshTokenRecord, TokenIntent};
use crate::models::user::{NewUser, ProfileUpdate, User, UserPage, UserQuery, UserRole};

const USER_COLUMNS: &str = "id, discord_id, role, display_name, avatar_url, email, \
     email_verified, guilds, guilds_updated_at, created_at, updated_at, deleted_at";

const TOKEN_COLUMNS: &str = "id, user_id, intent, expires_at, user_agent, ip_address, \
     device_name, created_at, last_used_at, revoked_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    discord_id: String,
    role: String,
    display_name: String,
    avatar_url: Option<String>,
    email: Option<String>,
    email_verified: bool,
    guilds: Option<String>,
    guilds_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> CoreResult<Self> {
        let role = row.role.parse::<UserRole>().map_err(|e| {
            InternalFault::new(InternalKind::InvalidField)
                .message(e)
                .meta("userId", row.id.clone())
                .origin("PgStore", "decode_user")
        })?;
        let discord_guilds = row
            .guilds
            .as_deref()
            .map(serde_json::from_str::<Vec<DiscordGuild>>)
            .transpose()
            .map_err(|e| {
                InternalFault::new(InternalKind::InvalidField)
                    .message("cached guild list is not valid JSON")
                    .cause(e)
                    .meta("userId", row.id.clone())
                    .origin("PgStore", "decode_user")
            })?;
        Ok(User {
            id: row.id,
            discord_id: row.discord_id,
            role,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            email: row.email,
            email_is_verified: row.email_verified,
            discord_guilds,
            discord_guilds_updated_at: row.guilds_updated_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: String,
    user_id: String,
    intent: String,
    expires_at: DateTime<Utc>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    device_name: Option<String>,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl TryFrom<TokenRow> for RefreshTokenRecord {
    type Error = CoreError;

    fn try_from(row: TokenRow) -> CoreResult<Self> {
        let intent = row.intent.parse::<TokenIntent>().map_err(|e| {
            InternalFault::new(InternalKind::InvalidField)
                .message(e)
                .meta("tokenId", row.id.clone())
                .origin("PgStore", "decode_refresh_token")
        })?;
        Ok(RefreshTokenRecord {
            id: row.id,
            user_id: row.user_id,
            intent,
            expires_at: row.expires_at,
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            device_name: row.device_name,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            revoked_at: row.revoked_at,
        })
    }
}

fn guilds_json(guilds: &Option<Vec<DiscordGuild>>) -> CoreResult<Option<String>> {
    guilds
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| {
            InternalFault::new(InternalKind::Unexpected)
                .message("failed to encode guild list")
                .cause(e)
                .into()
        })
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &UserQuery) {
    qb.push(" WHERE TRUE");
    if !query.include_deleted {
        qb.push(" AND deleted_at IS NULL");
    }
    if let Some(role) = query.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (id LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR display_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR discord_id LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR email LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// `%search%` with the `LIKE` metacharacters in `search` matched literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// sqlx-backed store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_discord_id(&self, discord_id: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE discord_id = $1"
        ))
        .bind(discord_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        let guilds = guilds_json(&user.discord_guilds)?;
        let guilds_updated_at = user.discord_guilds.as_ref().map(|_| user.now);
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users \
             (id, discord_id, role, display_name, avatar_url, email, email_verified, \
              guilds, guilds_updated_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.id)
        .bind(&user.discord_id)
        .bind(user.role.as_str())
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.email)
        .bind(user.email_is_verified)
        .bind(guilds)
        .bind(guilds_updated_at)
        .bind(user.now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Http(HttpFault::conflict().with_code(ErrorCode::AlreadyExists))
            }
            other => CoreError::DbError(other),
        })?;
        User::try_from(row)
    }

    async fn update_user_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> CoreResult<Option<User>> {
        let guilds = guilds_json(&update.discord_guilds)?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
               display_name = $2, avatar_url = $3, email = $4, email_verified = $5, \
               guilds = CASE WHEN $6::text IS NULL THEN guilds ELSE $6 END, \
               guilds_updated_at = CASE WHEN $6::text IS NULL THEN guilds_updated_at ELSE $7 END, \
               updated_at = $7 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.display_name)
        .bind(&update.avatar_url)
        .bind(&update.email)
        .bind(update.email_is_verified)
        .bind(guilds)
        .bind(update.now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn update_user_role(
        &self,
        id: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_display_name(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let result =
            sqlx::query("UPDATE users SET display_name = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(display_name)
                .bind(now)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_user_deleted_at(
        &self,
        id: &str,
        deleted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let result = sqlx::query("UPDATE users SET deleted_at = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(deleted_at)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, query: &UserQuery) -> CoreResult<UserPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_user_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);
        let rows = select
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(UserPage {
            users,
            total: total.max(0) as u64,
        })
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens \
             (id, user_id, intent, expires_at, user_agent, ip_address, device_name, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&token.id)
        .bind(&token.user_id)
        .bind(token.intent.as_str())
        .bind(token.expires_at)
        .bind(&token.device.user_agent)
        .bind(&token.device.ip_address)
        .bind(&token.device.device_name)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens \
             WHERE id = $1 AND revoked_at IS NULL AND expires_at > $2"
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RefreshTokenRecord::try_from).transpose()
    }

    async fn revoke_refresh_token(&self, id: &str, now: DateTime<Utc>) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 \
             WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_user_refresh_tokens(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn touch_refresh_token(&self, id: &str, now: DateTime<Utc>) -> CoreResult<()> {
        sqlx::query("UPDATE refresh_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_active_refresh_tokens(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<RefreshTokenRecord>> {
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2 \
             ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(RefreshTokenRecord::try_from)
            .collect()
    }
}
