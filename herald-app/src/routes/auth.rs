//! `GET /auth/x`: both legs of the X authorization-code flow.
//!
//! Without a `code` the user is redirected to X with a fresh PKCE challenge;
//! the verifier waits in the store under the `state` value. X then calls
//! back here with `code` and `state`, and the tokens are stored once the
//! account is confirmed to be on the allowlist.
use crate::error::AppError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use herald_common::Network;
use herald_social::x::oauth::{generate_state, state_key};
use herald_social::x::{Pkce, TokenResponse, XUser};
use herald_store::Credentials;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorizedResponse {
    pub token: TokenResponse,
    pub user: XUser,
}

pub async fn x_callback(
    State(s): State<Arc<AppState>>,
    Query(q): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = q.error {
        let detail = q.error_description.unwrap_or_default();
        return Err(AppError::Unauthorized(format!(
            "authorization failed: {error} {detail}"
        )));
    }

    let Some(code) = q.code else {
        return begin(&s).await;
    };

    let state = q
        .state
        .ok_or_else(|| AppError::Unauthorized("missing state".into()))?;
    let verifier = s
        .creds
        .kv()
        .take(&state_key(&state))
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown or already used state".into()))?;

    let token = s
        .oauth
        .exchange_code(&code, &verifier)
        .await
        .map_err(|e| AppError::Unauthorized(format!("code exchange failed: {e}")))?;
    let user = s
        .oauth
        .fetch_user(&token.access_token)
        .await
        .map_err(|e| AppError::Unauthorized(format!("could not identify user: {e}")))?;

    if !s.is_allowed(&user.username) {
        return Err(AppError::Forbidden(format!(
            "@{} is not allowed to authorize this bot",
            user.username
        )));
    }

    if token.refresh_token.is_none() {
        tracing::warn!("x.oauth.no_refresh_token");
    }
    s.creds
        .save(
            Network::X,
            &Credentials {
                access_token: token.access_token.clone(),
                refresh_token: token.refresh_token.clone().unwrap_or_default(),
            },
        )
        .await?;
    tracing::info!(username = %user.username, "x.oauth.authorized");

    Ok(Json(AuthorizedResponse { token, user }).into_response())
}

async fn begin(s: &AppState) -> Result<Response, AppError> {
    let pkce = Pkce::generate();
    let state = generate_state();
    s.creds.kv().put(&state_key(&state), &pkce.verifier).await?;

    let url = s.oauth.authorize_url(&state, &pkce.challenge);
    tracing::info!("x.oauth.redirect");
    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
}
