//! OAuth 2.0 authorization code with PKCE (RFC 7636) for X.
use super::SERVICE;
use super::types::{Data, TokenResponse, XUser};
use crate::SocialError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use herald_http::{Auth, HttpClient, RequestOpts};
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

/// KV prefix for the code verifier stashed between redirect and callback.
pub const STATE_KEY_PREFIX: &str = "x_oauth_state_";

pub fn state_key(state: &str) -> String {
    format!("{STATE_KEY_PREFIX}{state}")
}

/// Random URL-safe string from 32 bytes (43 chars).
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn generate_state() -> String {
    random_token()
}

#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = random_token();
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// `base64url_nopad(sha256(verifier))`
    pub fn challenge_for(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }
}

/// Registered X application.
#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
}

#[derive(Clone)]
pub struct XOAuth {
    http: HttpClient,
    app: OAuthApp,
    authorize_url: Url,
}

impl XOAuth {
    pub fn new(api_base: &str, app: OAuthApp) -> Result<Self, SocialError> {
        let http = HttpClient::new(api_base)
            .map_err(|e| SocialError::Config(SERVICE, e.to_string()))?
            .with_retries(0);
        let authorize_url = Url::parse(&app.authorize_url)
            .map_err(|e| SocialError::Config(SERVICE, format!("authorize url: {e}")))?;
        Ok(Self {
            http,
            app,
            authorize_url,
        })
    }

    /// Where to send the user to approve the app.
    pub fn authorize_url(&self, state: &str, code_challenge: &str) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.app.client_id)
            .append_pair("redirect_uri", &self.app.redirect_uri)
            .append_pair("scope", &self.app.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256");
        url
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, SocialError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.app.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
            ("client_id", self.app.client_id.as_str()),
        ];
        let tokens = self.token_request(&form).await?;
        tracing::info!(scope = tokens.scope.as_deref().unwrap_or(""), "x.oauth.exchanged");
        Ok(tokens)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, SocialError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.app.client_id.as_str()),
        ];
        self.token_request(&form).await
    }

    /// The account the access token belongs to.
    pub async fn fetch_user(&self, access_token: &str) -> Result<XUser, SocialError> {
        let me: Data<XUser> = self
            .http
            .get_json(
                "2/users/me",
                RequestOpts {
                    auth: Some(Auth::Bearer(access_token)),
                    ..Default::default()
                },
            )
            .await
            .map_err(SocialError::http(SERVICE))?;
        Ok(me.data)
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, SocialError> {
        self.http
            .post_form_opts(
                "2/oauth2/token",
                form,
                RequestOpts {
                    auth: Some(Auth::Basic {
                        username: &self.app.client_id,
                        password: &self.app.client_secret,
                    }),
                    ..Default::default()
                },
            )
            .await
            .map_err(SocialError::http(SERVICE))
    }
}
