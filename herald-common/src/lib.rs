//! Common types and utilities shared across Herald crates.
//!
//! This crate holds the pieces every other crate needs without pulling in
//! the HTTP or storage stacks: the shared error type, the [`Network`]
//! identifier used for credential keys and post reports, and the tracing
//! setup in [`observability`].
//!
//! # Examples
//!
//! ```rust
//! use herald_common::Network;
//!
//! assert_eq!(Network::X.as_str(), "x");
//! assert_eq!(Network::X.access_token_key(), "x_access_token");
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod observability;

/// Social networks the bot posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Network A: X (formerly Twitter), OAuth 2.0 user tokens.
    X,
    /// Network B: Bluesky, AT Protocol app-password sessions.
    Bluesky,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Bluesky => "bluesky",
        }
    }

    /// Store key holding this network's access token.
    pub fn access_token_key(&self) -> String {
        format!("{}_access_token", self.as_str())
    }

    /// Store key holding this network's refresh token.
    pub fn refresh_token_key(&self) -> String {
        format!("{}_refresh_token", self.as_str())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types used across the Herald system.
#[derive(thiserror::Error, Debug)]
pub enum HeraldError {
    /// An outbound service call failed.
    #[error("Upstream error ({service}): {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HeraldError {
    pub fn upstream(service: &'static str, message: impl fmt::Display) -> Self {
        Self::Upstream {
            service,
            message: message.to_string(),
        }
    }
}

/// Convenient alias for results that use [`HeraldError`].
pub type Result<T> = std::result::Result<T, HeraldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_keys_follow_network_name() {
        assert_eq!(Network::X.refresh_token_key(), "x_refresh_token");
        assert_eq!(Network::Bluesky.access_token_key(), "bluesky_access_token");
    }

    #[test]
    fn upstream_error_names_the_service() {
        let e = HeraldError::upstream("workers-ai", "5007: No such model");
        assert_eq!(e.to_string(), "Upstream error (workers-ai): 5007: No such model");
    }

    #[test]
    fn network_serializes_lowercase() {
        let v = serde_json::to_value(Network::Bluesky).unwrap();
        assert_eq!(v, serde_json::json!("bluesky"));
    }
}
