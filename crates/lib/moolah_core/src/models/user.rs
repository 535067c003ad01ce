//! User domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::auth::DiscordGuild;

/// Role of a user. Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Regular,
    Moderator,
    Support,
    Admin,
    SuperAdmin,
}

impl UserRole {
    /// Roles allowed to authenticate through the admin surface.
    pub const ADMIN_ROLES: [UserRole; 2] = [UserRole::Admin, UserRole::SuperAdmin];

    pub fn is_admin(self) -> bool {
        Self::ADMIN_ROLES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Regular => "REGULAR",
            UserRole::Moderator => "MODERATOR",
            UserRole::Support => "SUPPORT",
            UserRole::Admin => "ADMIN",
            UserRole::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGULAR" => Ok(UserRole::Regular),
            "MODERATOR" => Ok(UserRole::Moderator),
            "SUPPORT" => Ok(UserRole::Support),
            "ADMIN" => Ok(UserRole::Admin),
            "SUPER_ADMIN" => Ok(UserRole::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Stored user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Discord snowflake. Unique and never changed once set.
    pub discord_id: String,
    pub role: UserRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub email_is_verified: bool,
    pub discord_guilds: Option<Vec<DiscordGuild>>,
    pub discord_guilds_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the user is banned.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Insert payload for a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub discord_id: String,
    pub role: UserRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub email_is_verified: bool,
    pub discord_guilds: Option<Vec<DiscordGuild>>,
    pub now: DateTime<Utc>,
}

/// Mutable profile fields refreshed from Discord on every login.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub email_is_verified: bool,
    /// `None` leaves the cached guild list untouched.
    pub discord_guilds: Option<Vec<DiscordGuild>>,
    pub now: DateTime<Utc>,
}

/// Filter and paging for admin user listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    /// Substring matched against id, display name, Discord id and email.
    /// Matched literally: `%` and `_` are not wildcards.
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub include_deleted: bool,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: None,
            role: None,
            include_deleted: false,
            page: 1,
            limit: 25,
        }
    }
}

impl UserQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether `user` passes the search, role and deletion filters.
    pub fn matches(&self, user: &User) -> bool {
        if !self.include_deleted && user.is_deleted() {
            return false;
        }
        if let Some(role) = self.role
            && user.role != role
        {
            return false;
        }
        match self.search.as_deref().filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                user.id.contains(needle)
                    || user.display_name.contains(needle)
                    || user.discord_id.contains(needle)
                    || user.email.as_deref().is_some_and(|e| e.contains(needle))
            }
        }
    }
}

/// One page of users.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
}
