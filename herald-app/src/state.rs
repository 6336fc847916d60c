use anyhow::Context;
use herald_config::HeraldConfig;
use herald_llm::traits::LlmClient;
use herald_social::Poster;
use herald_social::bluesky::BlueskyPoster;
use herald_social::twitch::{TwitchClient, VideoSource};
use herald_social::x::{OAuthApp, XOAuth, XPoster};
use herald_store::{CredentialStore, open_store};
use std::sync::Arc;

/// Everything a request handler needs. Built once at startup and shared
/// read-only; the credential store is the only mutable part.
pub struct AppState {
    pub creds: CredentialStore,
    pub videos: Arc<dyn VideoSource>,
    pub llm: Arc<dyn LlmClient>,
    /// Posting order: X first, then Bluesky.
    pub posters: Vec<Arc<dyn Poster>>,
    pub oauth: XOAuth,
    pub allowed_usernames: Vec<String>,
    pub webhook_secret: Option<String>,
    pub channel_url: Option<String>,
}

impl AppState {
    /// Wire real clients from configuration.
    pub async fn from_config(cfg: &HeraldConfig) -> anyhow::Result<Self> {
        let kv = open_store(&cfg.store.database_url)
            .await
            .with_context(|| format!("opening store {}", cfg.store.database_url))?;
        let creds = CredentialStore::new(kv);

        let videos = TwitchClient::new(
            &cfg.twitch.api_base,
            &cfg.twitch.client_id,
            cfg.twitch.app_access_token.clone(),
            cfg.twitch.user_id.clone(),
        )?;
        let llm = herald_llm::client_from_config(&cfg.llm)?;

        let oauth = XOAuth::new(
            &cfg.x.api_base,
            OAuthApp {
                client_id: cfg.x.client_id.clone(),
                client_secret: cfg.x.client_secret.clone(),
                redirect_uri: cfg.x.redirect_uri.clone(),
                scopes: cfg.x.scopes.clone(),
                authorize_url: cfg.x.authorize_url.clone(),
            },
        )?;
        let x = XPoster::new(&cfg.x.api_base, oauth.clone(), creds.clone())?;
        let bluesky = BlueskyPoster::new(
            &cfg.bluesky.service,
            cfg.bluesky.identifier.clone(),
            cfg.bluesky.password.clone(),
            cfg.bluesky.langs.clone(),
        )?;

        Ok(Self {
            creds,
            videos: Arc::new(videos),
            llm,
            posters: vec![Arc::new(x), Arc::new(bluesky)],
            oauth,
            allowed_usernames: cfg.x.allowed_usernames.clone(),
            webhook_secret: cfg.twitch.webhook_secret.clone(),
            channel_url: cfg.twitch.channel_url.clone(),
        })
    }

    /// Case-insensitive allowlist check, ignoring a leading `@`.
    pub fn is_allowed(&self, username: &str) -> bool {
        let username = username.trim_start_matches('@');
        self.allowed_usernames
            .iter()
            .any(|allowed| allowed.trim().trim_start_matches('@').eq_ignore_ascii_case(username))
    }
}
