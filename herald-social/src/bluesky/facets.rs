//! Rich-text facet detection.
//!
//! Bluesky does not parse post text; links, mentions and hashtags are only
//! clickable when the record carries facets that point at them by UTF-8 byte
//! offset. Detection here is purely lexical. Mentions still need a DID, which
//! the client resolves before building the final [`Facet`].
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MAX_TAG_LEN: usize = 64;

static LINK_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(])(https?://\S+)").ok());
static MENTION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(])(@)([a-zA-Z0-9.-]+)").ok());
static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?:^|\s)([#＃])(\S+)").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

/// What a span of text turned out to be, before DID resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detected {
    Link(String),
    /// Handle without the leading `@`.
    Mention(String),
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub index: ByteSlice,
    pub kind: Detected,
}

impl Span {
    /// Turn into a facet. Mentions need the DID their handle resolved to.
    pub fn into_facet(self, did: Option<String>) -> Option<Facet> {
        let feature = match self.kind {
            Detected::Link(uri) => FacetFeature::Link { uri },
            Detected::Tag(tag) => FacetFeature::Tag { tag },
            Detected::Mention(_) => FacetFeature::Mention { did: did? },
        };
        Some(Facet {
            index: self.index,
            features: vec![feature],
        })
    }
}

/// Find links, mentions and hashtags, ordered by position.
pub fn detect(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    spans.extend(links(text));
    spans.extend(mentions(text));
    spans.extend(tags(text));
    spans.sort_by_key(|s| s.index.byte_start);
    spans
}

fn links(text: &str) -> Vec<Span> {
    let Some(re) = LINK_RE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            let uri = trim_link(m.as_str());
            url::Url::parse(uri).ok()?;
            Some(Span {
                index: ByteSlice {
                    byte_start: m.start(),
                    byte_end: m.start() + uri.len(),
                },
                kind: Detected::Link(uri.to_string()),
            })
        })
        .collect()
}

/// Drop trailing sentence punctuation and unbalanced closing parens.
fn trim_link(raw: &str) -> &str {
    let mut uri = raw;
    loop {
        let mut trimmed = uri.trim_end_matches(['.', ',', ';', ':', '!', '?', '"', '\'']);
        if trimmed.ends_with(')') && trimmed.matches(')').count() > trimmed.matches('(').count() {
            trimmed = &trimmed[..trimmed.len() - 1];
        }
        if trimmed.len() == uri.len() {
            return uri;
        }
        uri = trimmed;
    }
}

fn mentions(text: &str) -> Vec<Span> {
    let Some(re) = MENTION_RE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| {
            let at = caps.get(1)?;
            let handle = caps.get(2)?.as_str().trim_end_matches(['.', '-']);
            if !is_handle(handle) {
                return None;
            }
            Some(Span {
                index: ByteSlice {
                    byte_start: at.start(),
                    byte_end: at.end() + handle.len(),
                },
                kind: Detected::Mention(handle.to_ascii_lowercase()),
            })
        })
        .collect()
}

/// `name.tld` with a non-numeric TLD.
fn is_handle(handle: &str) -> bool {
    let labels: Vec<&str> = handle.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty())
        && labels
            .last()
            .is_some_and(|tld| tld.chars().any(|c| c.is_ascii_alphabetic()))
}

fn tags(text: &str) -> Vec<Span> {
    let Some(re) = TAG_RE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| {
            let hash = caps.get(1)?;
            let tag = caps
                .get(2)?
                .as_str()
                .trim_end_matches(|c: char| c.is_ascii_punctuation());
            if tag.is_empty()
                || tag.chars().count() > MAX_TAG_LEN
                || tag.chars().all(|c| c.is_ascii_digit())
            {
                return None;
            }
            Some(Span {
                index: ByteSlice {
                    byte_start: hash.start(),
                    byte_end: hash.end() + tag.len(),
                },
                kind: Detected::Tag(tag.to_string()),
            })
        })
        .collect()
}
