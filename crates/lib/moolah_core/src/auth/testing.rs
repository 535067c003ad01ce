//! Fixtures for auth tests: an in-memory store and a scripted OAuth provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::discord::OAuthProvider;
use super::service::AuthService;
use crate::error::{CoreResult, ErrorCode, HttpFault};
use crate::models::auth::{AuthUrl, DiscordGuild, DiscordProfile, ProviderTokens};
use crate::store::MemoryStore;

pub const TEST_SECRET: &[u8] = b"moolah-test-secret";

pub fn bob_profile() -> DiscordProfile {
    DiscordProfile {
        id: "123".into(),
        username: "bob".into(),
        discriminator: "0".into(),
        avatar: None,
        email: Some("b@x.com".into()),
        verified: true,
        locale: "en".into(),
    }
}

/// Accepts `code == "validcode"` and `verifier == "validverifier"` only.
pub struct StubOAuth {
    pub profile: DiscordProfile,
    pub guilds: Vec<DiscordGuild>,
    pub guild_fetches: AtomicUsize,
}

impl StubOAuth {
    pub fn new(profile: DiscordProfile) -> Self {
        Self {
            profile,
            guilds: Vec::new(),
            guild_fetches: AtomicUsize::new(0),
        }
    }

    pub fn guild_fetches(&self) -> usize {
        self.guild_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthProvider for StubOAuth {
    fn authorization_url(&self) -> CoreResult<AuthUrl> {
        Ok(AuthUrl {
            auth_url: "https://discord.test/oauth2/authorize?state=s".into(),
            state: "s".into(),
            code_verifier: "v".into(),
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
        Ok(self.profile.clone())
    }

    async fn fetch_guilds(&self, _access_token: &str) -> CoreResult<Vec<DiscordGuild>> {
        self.guild_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.guilds.clone())
    }
}

pub struct TestAuth {
    pub store: Arc<MemoryStore>,
    pub oauth: Arc<StubOAuth>,
    pub auth: AuthService,
}

impl TestAuth {
    pub fn new() -> Self {
        Self::with_oauth(StubOAuth::new(bob_profile()))
    }

    pub fn with_oauth(oauth: StubOAuth) -> Self {
        let store = Arc::new(MemoryStore::new());
        let oauth = Arc::new(oauth);
        let auth = AuthService::new(store.clone(), store.clone(), oauth.clone(), TEST_SECRET);
        Self { store, oauth, auth }
    }
}
