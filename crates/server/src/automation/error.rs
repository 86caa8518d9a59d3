//! Automation webhook errors.

use thiserror::Error;

/// Errors that can occur when posting to the automation endpoint.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// HTTP request failed (connection error or timeout).
    #[error("Automation request failed: {0}")]
    Request(String),

    /// The endpoint returned a non-success status.
    #[error("Automation endpoint error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Configuration error.
    #[error("Automation configuration error: {0}")]
    Config(String),
}
