//! Twitch EventSub message signatures.
//!
//! `Twitch-Eventsub-Message-Signature` is `sha256=` followed by the hex
//! HMAC-SHA256 of message id, timestamp and raw body, keyed with the
//! subscription secret. Deliveries whose timestamp is more than
//! [`MAX_AGE`] away from now are rejected as replays.
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

type HmacSha256 = Hmac<Sha256>;

pub const MESSAGE_ID: &str = "twitch-eventsub-message-id";
pub const MESSAGE_TIMESTAMP: &str = "twitch-eventsub-message-timestamp";
pub const MESSAGE_SIGNATURE: &str = "twitch-eventsub-message-signature";

const PREFIX: &str = "sha256=";

pub const MAX_AGE: Duration = Duration::minutes(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    Missing(&'static str),
    #[error("malformed signature")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
    #[error("message timestamp is not RFC 3339")]
    BadTimestamp,
    #[error("message timestamp outside the accepted window")]
    Stale,
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a [u8], SignatureError> {
    headers
        .get(name)
        .map(|v| v.as_bytes())
        .ok_or(SignatureError::Missing(name))
}

fn mac(secret: &str, id: &[u8], timestamp: &[u8], body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(id);
    mac.update(timestamp);
    mac.update(body);
    Some(mac)
}

/// Verify a delivery against `secret`; comparison is constant time.
pub fn verify(secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
    verify_at(secret, headers, body, OffsetDateTime::now_utc())
}

/// [`verify`] with an explicit clock.
pub fn verify_at(
    secret: &str,
    headers: &HeaderMap,
    body: &[u8],
    now: OffsetDateTime,
) -> Result<(), SignatureError> {
    let id = header(headers, MESSAGE_ID)?;
    let timestamp = header(headers, MESSAGE_TIMESTAMP)?;
    let signature = header(headers, MESSAGE_SIGNATURE)?;

    let hex_sig = signature
        .strip_prefix(PREFIX.as_bytes())
        .ok_or(SignatureError::Malformed)?;
    let expected = hex::decode(hex_sig).map_err(|_| SignatureError::Malformed)?;

    mac(secret, id, timestamp, body)
        .ok_or(SignatureError::Mismatch)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)?;

    let sent = std::str::from_utf8(timestamp)
        .ok()
        .and_then(|ts| OffsetDateTime::parse(ts, &Rfc3339).ok())
        .ok_or(SignatureError::BadTimestamp)?;
    if (now - sent).abs() > MAX_AGE {
        return Err(SignatureError::Stale);
    }
    Ok(())
}

/// Signature header value for a delivery; the sender side of [`verify`].
pub fn sign(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> Option<String> {
    let tag = mac(secret, id.as_bytes(), timestamp.as_bytes(), body)?.finalize();
    Some(format!("{PREFIX}{}", hex::encode(tag.into_bytes())))
}
