//! Outbound platform clients used by Herald.
//!
//! * [`twitch`] reads recent videos for the stream being announced.
//! * [`x`] posts to X with stored OAuth 2.0 user tokens and owns the
//!   authorization-code + PKCE flow that produces them.
//! * [`bluesky`] logs in with an app password and creates feed posts with
//!   rich-text facets.
//!
//! Both posting clients implement [`Poster`], which is what the webhook
//! handler depends on.
pub mod bluesky;
pub mod error;
pub mod poster;
pub mod retry;
pub mod twitch;
pub mod x;

pub use error::SocialError;
pub use poster::{PostReceipt, Poster};
