//! Bluesky (network B): app-password session, rich-text facets, feed posts.
pub mod client;
pub mod facets;
pub mod types;

pub use client::BlueskyPoster;
pub use facets::{Facet, FacetFeature};

pub(crate) const SERVICE: &str = "bluesky";
