//! Spreadsheet automation webhook integration.
//!
//! The automation endpoint (a Google Apps Script web app in production)
//! receives two kinds of `POST`:
//!
//! - `{"user": ..., "message": ...}` from the `/log` slash command
//! - poll results, either `{"newTasks": [...], "updatedTasks": [...]}` or a
//!   flat task array depending on [`PayloadFormat`](crate::config::PayloadFormat)
//!
//! Delivery is at-most-once: a failed POST is reported, never retried.

mod client;
mod error;

pub use client::{AutomationClient, LogEntry};
pub use error::AutomationError;
