//! Current-user profile and admin user moderation.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::{CoreResult, HttpFault, MessageKey};
use crate::models::user::{User, UserQuery, UserRole};
use crate::store::UserStore;

pub const DISPLAY_NAME_MIN_LENGTH: usize = 3;
pub const DISPLAY_NAME_MAX_LENGTH: usize = 50;

/// One page of the admin user table.
#[derive(Debug, Clone)]
pub struct UsersPage {
    pub users: Vec<User>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u32,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    // -------------------------------------------------------------------------
    // Current user
    // -------------------------------------------------------------------------

    pub async fn get_current_user(&self, user_id: &str) -> CoreResult<User> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| HttpFault::not_found().into())
    }

    /// Set the display name, returning it. Length is counted in characters.
    pub async fn update_current_user_display_name(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> CoreResult<String> {
        let len = display_name.chars().count();
        if !(DISPLAY_NAME_MIN_LENGTH..=DISPLAY_NAME_MAX_LENGTH).contains(&len) {
            return Err(HttpFault::bad_request().into());
        }
        if !self
            .store
            .update_display_name(user_id, display_name, Utc::now())
            .await?
        {
            return Err(HttpFault::not_found().into());
        }
        Ok(display_name.to_string())
    }

    // -------------------------------------------------------------------------
    // Admin moderation
    // -------------------------------------------------------------------------

    pub async fn get_user(&self, user_id: &str) -> CoreResult<Option<User>> {
        self.store.find_user_by_id(user_id).await
    }

    pub async fn get_users(&self, query: UserQuery) -> CoreResult<UsersPage> {
        let query = UserQuery {
            page: query.page.max(1),
            limit: query.limit.max(1),
            ..query
        };
        let page = self.store.list_users(&query).await?;
        Ok(UsersPage {
            total_pages: page.total.div_ceil(u64::from(query.limit)),
            users: page.users,
            total: page.total,
            page: query.page,
        })
    }

    /// Change a user's role. Super admins are immutable.
    pub async fn update_user_role(&self, user_id: &str, role: UserRole) -> CoreResult<String> {
        let user = self.require_user(user_id).await?;
        if user.role == UserRole::SuperAdmin {
            return Err(forbidden_change().into());
        }
        self.store
            .update_user_role(user_id, role, Utc::now())
            .await?;
        info!(user_id, from = %user.role, to = %role, tags = ?["admin", "user"], "updated user role");
        Ok(user.id)
    }

    /// Soft-delete a user.
    pub async fn ban_user(&self, user_id: &str) -> CoreResult<String> {
        let user = self.require_user(user_id).await?;
        if user.role == UserRole::SuperAdmin {
            return Err(forbidden_change().into());
        }
        if user.is_deleted() {
            return Err(HttpFault::bad_request()
                .with_message_key(MessageKey::Conflict)
                .into());
        }
        let now = Utc::now();
        self.store
            .set_user_deleted_at(user_id, Some(now), now)
            .await?;
        info!(user_id, tags = ?["admin", "user"], "banned user");
        Ok(user.id)
    }

    /// Lift a ban. Only currently banned users can be unbanned.
    pub async fn unban_user(&self, user_id: &str) -> CoreResult<String> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .filter(User::is_deleted)
            .ok_or(HttpFault::not_found())?;
        self.store
            .set_user_deleted_at(user_id, None, Utc::now())
            .await?;
        info!(user_id, tags = ?["admin", "user"], "unbanned user");
        Ok(user.id)
    }

    async fn require_user(&self, user_id: &str) -> CoreResult<User> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| HttpFault::not_found().into())
    }
}

fn forbidden_change() -> HttpFault {
    HttpFault::bad_request().with_message_key(MessageKey::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ErrorCode};
    use crate::models::user::NewUser;
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, id: &str, role: UserRole) {
        store
            .insert_user(NewUser {
                id: id.into(),
                discord_id: format!("d-{id}"),
                role,
                display_name: format!("user {id}"),
                avatar_url: None,
                email: Some(format!("{id}@example.com")),
                email_is_verified: true,
                discord_guilds: None,
                now: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn setup() -> (Arc<MemoryStore>, UserService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), UserService::new(store))
    }

    fn fault(err: CoreError) -> HttpFault {
        match err {
            CoreError::Http(fault) => fault,
            other => panic!("expected http fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn current_user_lookup_and_rename() {
        let (store, users) = setup();
        seed(&store, "u1", UserRole::Regular).await;

        assert_eq!(users.get_current_user("u1").await.unwrap().id, "u1");
        assert_eq!(
            fault(users.get_current_user("nope").await.unwrap_err()).code,
            ErrorCode::NotFound
        );

        let name = users
            .update_current_user_display_name("u1", "Bobby")
            .await
            .unwrap();
        assert_eq!(name, "Bobby");
        assert_eq!(users.get_current_user("u1").await.unwrap().display_name, "Bobby");

        let too_short = users.update_current_user_display_name("u1", "ab").await;
        assert_eq!(fault(too_short.unwrap_err()).status, 400);
        let too_long = users
            .update_current_user_display_name("u1", &"x".repeat(51))
            .await;
        assert_eq!(fault(too_long.unwrap_err()).status, 400);
        let missing = users.update_current_user_display_name("nope", "Bobby").await;
        assert_eq!(fault(missing.unwrap_err()).status, 404);
    }

    #[tokio::test]
    async fn super_admin_role_is_immutable() {
        let (store, users) = setup();
        seed(&store, "root", UserRole::SuperAdmin).await;
        seed(&store, "mod", UserRole::Moderator).await;

        let err = fault(
            users
                .update_user_role("root", UserRole::Regular)
                .await
                .unwrap_err(),
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.message_key, MessageKey::Forbidden);

        assert_eq!(users.update_user_role("mod", UserRole::Admin).await.unwrap(), "mod");
        assert_eq!(users.get_user("mod").await.unwrap().unwrap().role, UserRole::Admin);

        let err = fault(
            users
                .update_user_role("ghost", UserRole::Admin)
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn ban_and_unban_rules() {
        let (store, users) = setup();
        seed(&store, "root", UserRole::SuperAdmin).await;
        seed(&store, "u1", UserRole::Regular).await;

        assert_eq!(
            fault(users.ban_user("root").await.unwrap_err()).message_key,
            MessageKey::Forbidden
        );
        assert_eq!(
            fault(users.unban_user("u1").await.unwrap_err()).code,
            ErrorCode::NotFound
        );

        users.ban_user("u1").await.unwrap();
        assert!(users.get_user("u1").await.unwrap().unwrap().is_deleted());
        assert_eq!(
            fault(users.ban_user("u1").await.unwrap_err()).message_key,
            MessageKey::Conflict
        );

        users.unban_user("u1").await.unwrap();
        assert!(!users.get_user("u1").await.unwrap().unwrap().is_deleted());
        assert_eq!(
            fault(users.ban_user("ghost").await.unwrap_err()).code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn get_users_filters_and_paginates() {
        let (store, users) = setup();
        for i in 0..7 {
            seed(&store, &format!("u{i}"), UserRole::Regular).await;
        }
        seed(&store, "admin", UserRole::Admin).await;
        users.ban_user("u0").await.unwrap();

        let page = users
            .get_users(UserQuery {
                limit: 3,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.users.len(), 3);

        let admins = users
            .get_users(UserQuery {
                role: Some(UserRole::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admins.total, 1);

        let with_banned = users
            .get_users(UserQuery {
                search: Some("u0@".into()),
                include_deleted: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(with_banned.users[0].id, "u0");
    }
}
