use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use herald_store::StoreError;
use thiserror::Error;

/// Failures a handler turns into a plain-text HTTP response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("credential store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "http.request.failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "http.request.rejected");
        }
        (status, self.to_string()).into_response()
    }
}
