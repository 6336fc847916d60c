//! X (network A): tweet posting with stored user tokens and the OAuth 2.0
//! authorization-code + PKCE flow that produces them.
pub mod client;
pub mod oauth;
pub mod types;

pub use client::XPoster;
pub use oauth::{OAuthApp, Pkce, XOAuth};
pub use types::{TokenResponse, Tweet, XUser};

pub(crate) const SERVICE: &str = "x";
