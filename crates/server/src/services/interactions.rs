//! Slash command handling.
//!
//! Discord expects an answer within three seconds, so a command is handled
//! in two phases:
//!
//! 1. [`InteractionService::acknowledge`] validates the interaction and
//!    returns the immediate response plus, for deferred commands, the work
//!    left to do.
//! 2. [`InteractionService::run_deferred`] performs that work off the
//!    request path and edits the original response with the result.

use tracing::{info, instrument, warn};

use crate::automation::{AutomationClient, LogEntry};
use crate::discord::{
    DiscordClient, FollowupToken, Interaction, InteractionKind, InteractionResponse,
};
use crate::error::AppError;

/// Name of the slash command that records a message.
pub const LOG_COMMAND: &str = "log";

/// Option of [`LOG_COMMAND`] holding the text to record.
pub const LOG_MESSAGE_OPTION: &str = "message";

/// Work to finish after a deferred acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredLog {
    /// Where to post the result.
    pub token: FollowupToken,
    /// What to forward.
    pub entry: LogEntry,
}

/// Immediate answer to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    /// Body returned on the interaction request.
    pub response: InteractionResponse,
    /// Follow-up work, if the response was deferred.
    pub deferred: Option<DeferredLog>,
}

impl Acknowledgement {
    const fn pong() -> Self {
        Self {
            response: InteractionResponse::PONG,
            deferred: None,
        }
    }
}

/// Handles verified interactions.
#[derive(Debug, Clone)]
pub struct InteractionService {
    discord: DiscordClient,
    automation: AutomationClient,
}

impl InteractionService {
    /// Create an interaction service.
    #[must_use]
    pub const fn new(discord: DiscordClient, automation: AutomationClient) -> Self {
        Self {
            discord,
            automation,
        }
    }

    /// Decide the immediate response to an interaction.
    ///
    /// No side effects happen here.
    ///
    /// # Errors
    ///
    /// - `AppError::BadRequest` for unsupported interaction types, missing
    ///   command data or a missing `message` option.
    /// - `AppError::NotFound` for commands other than `log`.
    #[instrument(skip(self, interaction), fields(kind = ?interaction.kind))]
    pub fn acknowledge(&self, interaction: &Interaction) -> Result<Acknowledgement, AppError> {
        match interaction.kind {
            InteractionKind::Ping => Ok(Acknowledgement::pong()),
            InteractionKind::ApplicationCommand => Self::acknowledge_command(interaction),
            InteractionKind::Unknown(code) => Err(AppError::BadRequest(format!(
                "Unsupported interaction type: {code}"
            ))),
        }
    }

    fn acknowledge_command(interaction: &Interaction) -> Result<Acknowledgement, AppError> {
        let data = interaction
            .data
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Missing command data".into()))?;

        if data.name != LOG_COMMAND {
            return Err(AppError::NotFound(format!("Unknown command: {}", data.name)));
        }

        let message = data
            .option_str(LOG_MESSAGE_OPTION)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing message option".into()))?;

        let user = interaction
            .invoker_name()
            .ok_or_else(|| AppError::BadRequest("Missing invoking user".into()))?;

        Ok(Acknowledgement {
            response: InteractionResponse::DEFERRED_CHANNEL_MESSAGE,
            deferred: Some(DeferredLog {
                token: interaction.followup_token(),
                entry: LogEntry {
                    user: user.to_string(),
                    message: message.to_string(),
                },
            }),
        })
    }

    /// Forward a log entry and report the result in the original response.
    ///
    /// Never fails: a forwarding error is reported to the user, and a failed
    /// edit is only logged.
    #[instrument(skip(self, job), fields(application = %job.token.application_id, user = %job.entry.user))]
    pub async fn run_deferred(&self, job: DeferredLog) {
        let content = match self.automation.forward_log_entry(&job.entry).await {
            Ok(()) => {
                info!("Log entry recorded");
                recorded_text(&job.entry.message)
            }
            Err(e) => {
                warn!(error = %e, "Failed to record log entry");
                failed_text(&job.entry.message)
            }
        };

        self.complete(&job.token, &content).await;
    }

    /// Replace the deferred placeholder with `content`.
    pub async fn complete(&self, token: &FollowupToken, content: &str) {
        if let Err(e) = self.discord.edit_original_response(token, content).await {
            warn!(error = %e, "Failed to edit original interaction response");
        }
    }
}

/// Confirmation shown after a message was recorded.
#[must_use]
pub fn recorded_text(message: &str) -> String {
    format!("「{message}」を記録しました。")
}

/// Notice shown when recording failed.
#[must_use]
pub fn failed_text(message: &str) -> String {
    format!("「{message}」の記録に失敗しました。")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::Method::{PATCH, POST};
    use httpmock::MockServer;
    use secrecy::SecretString;
    use serde_json::json;
    use task_relay_core::ApplicationId;

    use super::*;
    use crate::config::{AutomationConfig, PayloadFormat};

    fn service(base_url: &str, webhook_url: &str) -> InteractionService {
        let discord = DiscordClient::with_token(
            base_url,
            &SecretString::from("discord-token"),
            Duration::from_secs(5),
        )
        .expect("discord client");
        let automation = AutomationClient::new(
            &AutomationConfig {
                webhook_url: SecretString::from(webhook_url),
                payload_format: PayloadFormat::Partitioned,
            },
            Duration::from_secs(5),
        )
        .expect("automation client");
        InteractionService::new(discord, automation)
    }

    fn offline() -> InteractionService {
        service("http://127.0.0.1:9", "http://127.0.0.1:9/exec")
    }

    fn token(raw: &str) -> FollowupToken {
        FollowupToken {
            application_id: ApplicationId::new(111),
            token: raw.to_string(),
        }
    }

    fn interaction(value: serde_json::Value) -> Interaction {
        serde_json::from_value(value).expect("interaction")
    }

    fn log_command(message: Option<&str>) -> Interaction {
        let options: Vec<_> = message
            .map(|m| json!({"name": "message", "type": 3, "value": m}))
            .into_iter()
            .collect();
        interaction(json!({
            "type": 2,
            "application_id": "111",
            "token": "tok-abc",
            "member": {"nick": "Aki", "user": {"id": "42", "username": "aki_s"}},
            "data": {"name": "log", "options": options}
        }))
    }

    #[test]
    fn test_ping_is_pong() {
        let ack = offline()
            .acknowledge(&interaction(json!({
                "type": 1,
                "application_id": "111",
                "token": "tok"
            })))
            .expect("ack");

        assert_eq!(ack.response, InteractionResponse::PONG);
        assert!(ack.deferred.is_none());
    }

    #[test]
    fn test_log_command_is_deferred() {
        let ack = offline()
            .acknowledge(&log_command(Some("buy milk")))
            .expect("ack");

        assert_eq!(ack.response, InteractionResponse::DEFERRED_CHANNEL_MESSAGE);
        let job = ack.deferred.expect("deferred work");
        assert_eq!(job.token, token("tok-abc"));
        assert_eq!(
            job.entry,
            LogEntry {
                user: "Aki".to_string(),
                message: "buy milk".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let result = offline().acknowledge(&interaction(json!({
            "type": 2,
            "application_id": "111",
            "token": "tok",
            "data": {"name": "deploy"}
        })));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_missing_message_option_is_bad_request() {
        for message in [None, Some("   ")] {
            let result = offline().acknowledge(&log_command(message));
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_unknown_interaction_type_is_bad_request() {
        let result = offline().acknowledge(&interaction(json!({
            "type": 3,
            "application_id": "111",
            "token": "tok"
        })));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_run_deferred_reports_success() {
        let server = MockServer::start();
        let forward = server.mock(|when, then| {
            when.method(POST)
                .path("/exec")
                .json_body(json!({"user": "Aki", "message": "buy milk"}));
            then.status(200);
        });
        let edit = server.mock(|when, then| {
            when.method(PATCH)
                .path("/webhooks/111/tok-abc/messages/@original")
                .json_body(json!({"content": "「buy milk」を記録しました。"}));
            then.status(200).json_body(json!({"id": "1"}));
        });

        let service = service(&server.base_url(), &server.url("/exec"));
        let job = service
            .acknowledge(&log_command(Some("buy milk")))
            .expect("ack")
            .deferred
            .expect("deferred work");
        service.run_deferred(job).await;

        forward.assert();
        edit.assert();
    }

    #[tokio::test]
    async fn test_run_deferred_reports_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/exec");
            then.status(500).body("quota exceeded");
        });
        let edit = server.mock(|when, then| {
            when.method(PATCH)
                .path("/webhooks/111/tok-abc/messages/@original")
                .json_body(json!({"content": "「buy milk」の記録に失敗しました。"}));
            then.status(200).json_body(json!({"id": "1"}));
        });

        let service = service(&server.base_url(), &server.url("/exec"));
        let job = service
            .acknowledge(&log_command(Some("buy milk")))
            .expect("ack")
            .deferred
            .expect("deferred work");
        service.run_deferred(job).await;

        edit.assert();
    }

    #[tokio::test]
    async fn test_failed_edit_is_swallowed() {
        offline().complete(&token("tok"), "done").await;
    }
}
