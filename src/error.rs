use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no scrape url provided")]
    MissingUrl,

    #[error("malformed scrape url")]
    MalformedUrl,

    #[error("scrape url not allowed: {0}")]
    TargetNotAllowed(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::MalformedUrl => StatusCode::BAD_REQUEST,
            ProxyError::TargetNotAllowed(_) => StatusCode::FORBIDDEN,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message exposed to the client. Upstream details stay in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            ProxyError::MissingUrl => "no scrape url provided",
            ProxyError::MalformedUrl => "malformed scrape url",
            ProxyError::TargetNotAllowed(_) => "scrape url not allowed",
            ProxyError::Upstream(_) => "upstream request failed",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }

        let body = ErrorBody {
            success: false,
            message: self.public_message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
