//! `POST /api/live-announcement`
use crate::announce::{self, AnnounceStatus, STREAM_ONLINE};
use crate::error::AppError;
use crate::signature;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use herald_common::Network;
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn live_announcement(
    State(s): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if let Some(secret) = s.webhook_secret.as_deref() {
        signature::verify(secret, &headers, &body)
            .map_err(|e| AppError::Forbidden(format!("invalid webhook signature: {e}")))?;
    }

    let event: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?;

    if let Some(challenge) = challenge(&event) {
        tracing::info!("webhook.challenge");
        return Ok(challenge.into_response());
    }

    let kind = event
        .pointer("/subscription/type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if kind != STREAM_ONLINE {
        tracing::debug!(kind, "webhook.echo");
        return Ok(Json(json!({ "data": event })).into_response());
    }

    let broadcaster = event
        .pointer("/event/broadcaster_user_login")
        .and_then(Value::as_str);
    tracing::info!(broadcaster, "webhook.stream_online");
    announce_live(&s).await
}

/// A verification challenge is echoed as plain text. Non-string values are
/// echoed in their JSON form.
fn challenge(event: &Value) -> Option<String> {
    match event.get("challenge")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

async fn announce_live(s: &AppState) -> Result<Response, AppError> {
    let video = match s.videos.latest_video().await {
        Ok(Some(video)) => video,
        Ok(None) => {
            tracing::info!("announce.video.none");
            Default::default()
        }
        Err(e) => {
            tracing::warn!(error = %e, "announce.video.failed");
            Default::default()
        }
    };

    let text = announce::compose(s.llm.as_ref(), &video, s.channel_url.as_deref()).await;

    if s.creds.access_token(Network::X).await?.is_none() {
        return Err(AppError::Unauthorized(
            "no stored X credentials; authorize at /auth/x first".into(),
        ));
    }

    let report = announce::publish(&s.posters, &text).await;
    let status = match report.status {
        AnnounceStatus::Announced => StatusCode::OK,
        AnnounceStatus::Partial | AnnounceStatus::Failed => StatusCode::BAD_GATEWAY,
    };
    Ok((status, Json(report)).into_response())
}

#[cfg(test)]
mod tests {
    use super::challenge;
    use serde_json::json;

    #[test]
    fn challenge_values() {
        assert_eq!(challenge(&json!({"challenge": "abc"})).as_deref(), Some("abc"));
        assert_eq!(challenge(&json!({"challenge": 42})).as_deref(), Some("42"));
        assert_eq!(challenge(&json!({"challenge": null})), None);
        assert_eq!(challenge(&json!({"subscription": {}})), None);
    }
}
