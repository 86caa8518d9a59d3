//! Unified error handling for the relay.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::automation::AutomationError;
use crate::discord::DiscordError;

/// Application-level error type for the relay's HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Inbound request signature did not verify.
    #[error("Invalid request signature: {0}")]
    SignatureInvalid(String),

    /// Fetching from Discord failed; the poll cycle is aborted.
    #[error("Discord fetch failed: {0}")]
    UpstreamFetchFailed(#[from] DiscordError),

    /// Posting to the automation endpoint failed.
    #[error("Forwarding to automation endpoint failed: {0}")]
    ForwardFailed(#[from] AutomationError),

    /// Unknown command or resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::SignatureInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamFetchFailed(_) | Self::ForwardFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Relay request error"
            );
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Rejected request");
        }

        // Don't expose upstream response bodies or config details to clients
        let message = match &self {
            Self::UpstreamFetchFailed(_) => "Failed to fetch messages from Discord".to_string(),
            Self::ForwardFailed(_) => "Failed to forward tasks to automation endpoint".to_string(),
            Self::SignatureInvalid(_) => "Invalid request signature".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}
