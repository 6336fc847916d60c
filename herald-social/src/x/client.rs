use super::SERVICE;
use super::oauth::XOAuth;
use super::types::{CreateTweet, Data, Tweet};
use crate::retry::with_refresh;
use crate::{PostReceipt, Poster, SocialError};
use async_trait::async_trait;
use herald_common::Network;
use herald_http::{Auth, HttpClient, RequestOpts};
use herald_store::{CredentialStore, Credentials};

/// Posts tweets as the user whose tokens are in the credential store.
#[derive(Clone)]
pub struct XPoster {
    http: HttpClient,
    oauth: XOAuth,
    creds: CredentialStore,
}

impl XPoster {
    pub fn new(api_base: &str, oauth: XOAuth, creds: CredentialStore) -> Result<Self, SocialError> {
        let http = HttpClient::new(api_base)
            .map_err(|e| SocialError::Config(SERVICE, e.to_string()))?
            .with_retries(0);
        Ok(Self { http, oauth, creds })
    }

    pub async fn create_tweet(&self, access_token: &str, text: &str) -> Result<Tweet, SocialError> {
        let created: Data<Tweet> = self
            .http
            .post_json_opts(
                "2/tweets",
                &CreateTweet { text },
                RequestOpts {
                    auth: Some(Auth::Bearer(access_token)),
                    ..Default::default()
                },
            )
            .await
            .map_err(SocialError::http(SERVICE))?;
        Ok(created.data)
    }

    /// Trade the stored refresh token for a new pair and persist it.
    ///
    /// X rotates refresh tokens; if the response omits one the old token is
    /// kept.
    pub async fn refresh_credentials(&self) -> Result<String, SocialError> {
        let refresh_token = self
            .creds
            .refresh_token(Network::X)
            .await?
            .ok_or(SocialError::MissingCredentials(Network::X))?;

        let tokens = self.oauth.refresh(&refresh_token).await?;
        let creds = Credentials {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.unwrap_or(refresh_token),
        };
        self.creds.save(Network::X, &creds).await?;
        tracing::info!("x.tokens.refreshed");
        Ok(creds.access_token)
    }
}

#[async_trait]
impl Poster for XPoster {
    fn network(&self) -> Network {
        Network::X
    }

    async fn post(&self, text: &str) -> Result<PostReceipt, SocialError> {
        let token = self
            .creds
            .access_token(Network::X)
            .await?
            .ok_or(SocialError::MissingCredentials(Network::X))?;

        let tweet = with_refresh(
            token,
            |t| async move { self.create_tweet(&t, text).await },
            || self.refresh_credentials(),
        )
        .await?;

        tracing::info!(id = %tweet.id, "x.tweet.created");
        Ok(PostReceipt {
            network: Network::X,
            id: tweet.id,
        })
    }
}
