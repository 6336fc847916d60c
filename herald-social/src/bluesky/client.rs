use super::SERVICE;
use super::facets::{self, Detected, Facet};
use super::types::{
    CreateRecord, CreateSession, POST_COLLECTION, PostRecord, ResolvedHandle, Session, StrongRef,
};
use crate::{PostReceipt, Poster, SocialError};
use async_trait::async_trait;
use herald_common::Network;
use herald_http::{Auth, HttpClient, RequestOpts};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Posts to Bluesky with an app password. A fresh session is created for
/// every post; nothing is cached between announcements.
#[derive(Clone)]
pub struct BlueskyPoster {
    http: HttpClient,
    identifier: String,
    password: String,
    langs: Vec<String>,
}

impl BlueskyPoster {
    pub fn new(
        service: &str,
        identifier: String,
        password: String,
        langs: Vec<String>,
    ) -> Result<Self, SocialError> {
        let http = HttpClient::new(service)
            .map_err(|e| SocialError::Config(SERVICE, e.to_string()))?
            .with_retries(0);
        Ok(Self {
            http,
            identifier,
            password,
            langs,
        })
    }

    pub async fn create_session(&self) -> Result<Session, SocialError> {
        let session: Session = self
            .http
            .post_json(
                "xrpc/com.atproto.server.createSession",
                None,
                &CreateSession {
                    identifier: &self.identifier,
                    password: &self.password,
                },
            )
            .await
            .map_err(SocialError::http(SERVICE))?;
        tracing::debug!(did = %session.did, "bluesky.session.created");
        Ok(session)
    }

    pub async fn resolve_handle(&self, session: &Session, handle: &str) -> Result<String, SocialError> {
        let resolved: ResolvedHandle = self
            .http
            .get_json(
                "xrpc/com.atproto.identity.resolveHandle",
                RequestOpts {
                    auth: Some(Auth::Bearer(&session.access_jwt)),
                    query: Some(vec![("handle", handle.into())]),
                    ..Default::default()
                },
            )
            .await
            .map_err(SocialError::http(SERVICE))?;
        Ok(resolved.did)
    }

    /// Detect facets in `text`, resolving mentions. Mentions whose handle
    /// does not resolve are left as plain text.
    pub async fn facets(&self, session: &Session, text: &str) -> Vec<Facet> {
        let mut out = Vec::new();
        for span in facets::detect(text) {
            let did = match &span.kind {
                Detected::Mention(handle) => match self.resolve_handle(session, handle).await {
                    Ok(did) => Some(did),
                    Err(e) => {
                        tracing::debug!(%handle, error = %e, "bluesky.mention.unresolved");
                        continue;
                    }
                },
                _ => None,
            };
            out.extend(span.into_facet(did));
        }
        out
    }

    pub async fn create_post(
        &self,
        session: &Session,
        record: &PostRecord,
    ) -> Result<StrongRef, SocialError> {
        self.http
            .post_json_opts(
                "xrpc/com.atproto.repo.createRecord",
                &CreateRecord {
                    repo: &session.did,
                    collection: POST_COLLECTION,
                    record,
                },
                RequestOpts {
                    auth: Some(Auth::Bearer(&session.access_jwt)),
                    ..Default::default()
                },
            )
            .await
            .map_err(SocialError::http(SERVICE))
    }
}

#[async_trait]
impl Poster for BlueskyPoster {
    fn network(&self) -> Network {
        Network::Bluesky
    }

    async fn post(&self, text: &str) -> Result<PostReceipt, SocialError> {
        let session = self.create_session().await?;
        let facets = self.facets(&session, text).await;
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| SocialError::Config(SERVICE, format!("timestamp: {e}")))?;

        let record = PostRecord {
            kind: POST_COLLECTION.to_string(),
            text: text.to_string(),
            facets,
            created_at,
            langs: self.langs.clone(),
        };
        let created = self.create_post(&session, &record).await?;

        tracing::info!(uri = %created.uri, facets = record.facets.len(), "bluesky.post.created");
        Ok(PostReceipt {
            network: Network::Bluesky,
            id: created.uri,
        })
    }
}
