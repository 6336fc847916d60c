//! Twitch Helix lookups for the channel being announced.
use crate::SocialError;
use async_trait::async_trait;
use herald_http::header::{HeaderMap, HeaderValue};
use herald_http::{Auth, HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "twitch";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    data: Vec<Video>,
}

/// Source of the metadata the announcement prompt is built from.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn latest_video(&self) -> Result<Option<Video>, SocialError>;
}

#[derive(Clone)]
pub struct TwitchClient {
    http: HttpClient,
    client_id: HeaderValue,
    app_token: String,
    user_id: String,
}

impl TwitchClient {
    pub fn new(
        api_base: &str,
        client_id: &str,
        app_token: String,
        user_id: String,
    ) -> Result<Self, SocialError> {
        let http = HttpClient::new(api_base)
            .map_err(|e| SocialError::Config(SERVICE, e.to_string()))?
            .with_retries(0);
        let client_id = HeaderValue::from_str(client_id)
            .map_err(|e| SocialError::Config(SERVICE, format!("client id: {e}")))?;
        Ok(Self {
            http,
            client_id,
            app_token,
            user_id,
        })
    }

    /// Most recent videos from the last day, newest first.
    pub async fn recent_videos(&self, first: u8) -> Result<Vec<Video>, SocialError> {
        let mut headers = HeaderMap::new();
        headers.insert("client-id", self.client_id.clone());

        let resp: VideosResponse = self
            .http
            .get_json(
                "videos",
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.app_token)),
                    headers: Some(headers),
                    query: Some(vec![
                        ("user_id", self.user_id.as_str().into()),
                        ("first", first.to_string().into()),
                        ("sort", "time".into()),
                        ("period", "day".into()),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .map_err(SocialError::http(SERVICE))?;

        tracing::debug!(user_id = %self.user_id, count = resp.data.len(), "twitch.videos");
        Ok(resp.data)
    }
}

#[async_trait]
impl VideoSource for TwitchClient {
    async fn latest_video(&self) -> Result<Option<Video>, SocialError> {
        Ok(self.recent_videos(2).await?.into_iter().next())
    }
}
