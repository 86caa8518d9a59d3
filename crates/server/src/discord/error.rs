//! Discord-related errors.

use thiserror::Error;

/// Errors that can occur when interacting with Discord.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// HTTP request failed (connection error or timeout).
    #[error("Discord request failed: {0}")]
    Request(String),

    /// Discord returned a non-success status.
    #[error("Discord API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Discord response error: {0}")]
    Response(String),

    /// Invalid interaction signature.
    #[error("Invalid Discord signature: {0}")]
    InvalidSignature(String),

    /// Configuration error.
    #[error("Discord configuration error: {0}")]
    Config(String),
}
