//! Automation webhook client.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use task_relay_core::{ExtractedTask, TaskBatch};
use tracing::{debug, error, instrument};

use super::error::AutomationError;
use crate::config::{AutomationConfig, PayloadFormat};

/// Longest slice of an error body kept for logs.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// A `/log` slash command entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Display name of the invoking user.
    pub user: String,
    /// Text to record.
    pub message: String,
}

/// Client for the spreadsheet automation webhook.
#[derive(Clone)]
pub struct AutomationClient {
    inner: Arc<AutomationClientInner>,
}

struct AutomationClientInner {
    client: reqwest::Client,
    webhook_url: SecretString,
    payload_format: PayloadFormat,
}

impl std::fmt::Debug for AutomationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationClient")
            .field("webhook_url", &"[REDACTED]")
            .field("payload_format", &self.inner.payload_format)
            .finish_non_exhaustive()
    }
}

impl AutomationClient {
    /// Create a new automation client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &AutomationConfig, timeout: Duration) -> Result<Self, AutomationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AutomationError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(AutomationClientInner {
                client,
                webhook_url: config.webhook_url.clone(),
                payload_format: config.payload_format,
            }),
        })
    }

    /// Forward one poll cycle's tasks in a single POST.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status.
    #[instrument(skip(self, batch), fields(
        new_tasks = batch.new_tasks.len(),
        updated_tasks = batch.updated_tasks.len(),
        format = ?self.inner.payload_format,
    ))]
    pub async fn forward_tasks(&self, batch: &TaskBatch) -> Result<(), AutomationError> {
        match self.inner.payload_format {
            PayloadFormat::Partitioned => self.post(batch).await,
            PayloadFormat::Flat => {
                let flat: Vec<&ExtractedTask> = batch.all_tasks().collect();
                self.post(&flat).await
            }
        }
    }

    /// Forward a `/log` command entry.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status.
    #[instrument(skip(self, entry), fields(user = %entry.user))]
    pub async fn forward_log_entry(&self, entry: &LogEntry) -> Result<(), AutomationError> {
        self.post(entry).await
    }

    async fn post<B: Serialize + Sync + ?Sized>(&self, body: &B) -> Result<(), AutomationError> {
        let response = self
            .inner
            .client
            .post(self.inner.webhook_url.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| AutomationError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Automation endpoint accepted payload");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        error!(status = status.as_u16(), body = %message, "Automation endpoint rejected payload");

        Err(AutomationError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
