use herald_common::Network;
use herald_http::HttpError;
use herald_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("no stored {0} credentials")]
    MissingCredentials(Network),

    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: HttpError,
    },

    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    #[error("invalid {0} configuration: {1}")]
    Config(&'static str, String),
}

impl SocialError {
    pub(crate) fn http(service: &'static str) -> impl FnOnce(HttpError) -> Self {
        move |source| Self::Http { service, source }
    }

    /// True when the upstream rejected our credentials (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { source, .. } if source.is_unauthorized())
    }
}
