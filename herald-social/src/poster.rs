use crate::SocialError;
use async_trait::async_trait;
use herald_common::Network;
use serde::Serialize;

/// Identifier of a post that was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostReceipt {
    pub network: Network,
    pub id: String,
}

/// A social network the announcement can be published to.
#[async_trait]
pub trait Poster: Send + Sync {
    fn network(&self) -> Network;

    async fn post(&self, text: &str) -> Result<PostReceipt, SocialError>;
}
