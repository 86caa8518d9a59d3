//! Discord REST API client.
//!
//! Provides methods for listing and fetching channel messages, looking up
//! guild members, and editing the original response of a deferred
//! interaction.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use task_relay_core::{ChannelId, GuildId, MessageId, UserId};
use tracing::{debug, instrument, warn};

use super::error::DiscordError;
use super::types::{ChannelMessage, FollowupToken, GuildMember};
use crate::config::DiscordConfig;

/// Discord's maximum page size for message listing.
pub const MESSAGE_PAGE_LIMIT: u8 = 100;

/// Discord API client.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct DiscordClient {
    inner: Arc<DiscordClientInner>,
}

struct DiscordClientInner {
    /// Client that sends `Authorization: Bot <token>` on every call.
    authed: reqwest::Client,
    /// Client for webhook endpoints, which authenticate via the URL token.
    webhook: reqwest::Client,
    api_base: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("api_base", &self.inner.api_base)
            .field("bot_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// Create a new Discord API client.
    ///
    /// # Errors
    ///
    /// Returns error if the bot token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &DiscordConfig, timeout: Duration) -> Result<Self, DiscordError> {
        Self::with_token(&config.api_base, &config.bot_token, timeout)
    }

    /// Create a client against an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the bot token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn with_token(
        api_base: &str,
        bot_token: &SecretString,
        timeout: Duration,
    ) -> Result<Self, DiscordError> {
        let mut auth = HeaderValue::from_str(&format!("Bot {}", bot_token.expose_secret()))
            .map_err(|e| DiscordError::Config(format!("Invalid bot token format: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let authed = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DiscordError::Config(e.to_string()))?;
        let webhook = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscordError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(DiscordClientInner {
                authed,
                webhook,
                api_base: api_base.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Fetch up to 100 messages from a channel, newest first.
    ///
    /// With `after`, only messages newer than that ID are returned.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status.
    #[instrument(skip(self), fields(channel = %channel_id))]
    pub async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        after: Option<MessageId>,
    ) -> Result<Vec<ChannelMessage>, DiscordError> {
        let url = format!("{}/channels/{channel_id}/messages", self.inner.api_base);

        let mut query = vec![("limit", MESSAGE_PAGE_LIMIT.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let response = self
            .inner
            .authed
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| DiscordError::Request(e.to_string()))?;

        let messages: Vec<ChannelMessage> = handle_response(response).await?;
        debug!(count = messages.len(), "Fetched channel messages");

        Ok(messages)
    }

    /// Fetch a single message by ID.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status
    /// (including 404 when the message was deleted).
    #[instrument(skip(self), fields(channel = %channel_id, message = %message_id))]
    pub async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<ChannelMessage, DiscordError> {
        let url = format!(
            "{}/channels/{channel_id}/messages/{message_id}",
            self.inner.api_base
        );

        let response = self
            .inner
            .authed
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscordError::Request(e.to_string()))?;

        handle_response(response).await
    }

    /// Look up a member of a guild.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status
    /// (including 404 when the user has left the guild).
    #[instrument(skip(self), fields(guild = %guild_id, user = %user_id))]
    pub async fn get_guild_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<GuildMember, DiscordError> {
        let url = format!("{}/guilds/{guild_id}/members/{user_id}", self.inner.api_base);

        let response = self
            .inner
            .authed
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscordError::Request(e.to_string()))?;

        handle_response(response).await
    }

    /// Replace the content of a deferred interaction's original response.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status.
    #[instrument(skip(self, token, content), fields(application = %token.application_id))]
    pub async fn edit_original_response(
        &self,
        token: &FollowupToken,
        content: &str,
    ) -> Result<(), DiscordError> {
        #[derive(serde::Serialize)]
        struct EditMessage<'a> {
            content: &'a str,
        }

        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.inner.api_base, token.application_id, token.token
        );

        let response = self
            .inner
            .webhook
            .patch(&url)
            .json(&EditMessage { content })
            .send()
            .await
            .map_err(|e| DiscordError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(parse_error(response).await);
        }

        debug!("Edited original interaction response");

        Ok(())
    }
}

/// Handle API response and parse JSON.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DiscordError> {
    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| DiscordError::Response(format!("Failed to parse response: {e}")));
    }

    Err(parse_error(response).await)
}

/// Parse an error response from Discord.
///
/// Discord error bodies look like `{"message": "Unknown Member", "code": 10007}`.
async fn parse_error(response: reqwest::Response) -> DiscordError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or(body);

    warn!(status, message = %message, "Discord API returned an error");

    DiscordError::Api { status, message }
}
