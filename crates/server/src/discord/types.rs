//! Discord REST and interaction wire types.
//!
//! These types cover the subset of the Discord API v10 payloads the relay
//! reads or writes. Unknown fields are ignored on input.
//!
//! See: <https://discord.com/developers/docs/interactions/receiving-and-responding>

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use task_relay_core::{ApplicationId, MessageId, UserId};

/// A Discord user.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Global display name, if the user set one.
    #[serde(default)]
    pub global_name: Option<String>,
}

impl User {
    /// Global display name, falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        non_blank(self.global_name.as_deref()).unwrap_or(&self.username)
    }
}

/// A guild member as returned by `GET /guilds/{guild}/members/{user}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    /// Guild-specific nickname.
    #[serde(default)]
    pub nick: Option<String>,
    /// The underlying user.
    #[serde(default)]
    pub user: Option<User>,
}

impl GuildMember {
    /// Guild nickname, then global display name, then username.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.nick.as_deref()).or_else(|| self.user.as_ref().map(User::display_name))
    }
}

/// Emoji attached to a reaction.
#[derive(Debug, Clone, Deserialize)]
pub struct Emoji {
    /// Custom emoji ID (`None` for unicode emoji).
    #[serde(default)]
    pub id: Option<String>,
    /// Unicode character or custom emoji name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A reaction summary on a message.
#[derive(Debug, Clone, Deserialize)]
pub struct Reaction {
    /// Number of users who reacted.
    #[serde(default)]
    pub count: u32,
    /// The emoji used.
    pub emoji: Emoji,
}

/// A channel message snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMessage {
    /// Message ID.
    pub id: MessageId,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Raw message text.
    #[serde(default)]
    pub content: String,
    /// Message author.
    pub author: User,
    /// Users mentioned in the message.
    #[serde(default)]
    pub mentions: Vec<User>,
    /// Reaction summaries.
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl ChannelMessage {
    /// Returns true if any of the given emoji was reacted at least once.
    #[must_use]
    pub fn has_any_reaction(&self, emoji: &[String]) -> bool {
        self.reactions.iter().any(|reaction| {
            reaction.count > 0
                && reaction
                    .emoji
                    .name
                    .as_deref()
                    .is_some_and(|name| emoji.iter().any(|e| e == name))
        })
    }
}

/// Interaction type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionKind {
    /// Endpoint health check from Discord.
    Ping,
    /// Slash command invocation.
    ApplicationCommand,
    /// Any other interaction type (components, autocomplete, modals).
    Unknown(u8),
}

impl From<u8> for InteractionKind {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            other => Self::Unknown(other),
        }
    }
}

/// An inbound interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    /// Interaction type.
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    /// Application the interaction is for.
    pub application_id: ApplicationId,
    /// Continuation token for follow-up calls.
    pub token: String,
    /// Invoking member (guild interactions only).
    #[serde(default)]
    pub member: Option<GuildMember>,
    /// Invoking user (DM interactions only).
    #[serde(default)]
    pub user: Option<User>,
    /// Command payload (application commands only).
    #[serde(default)]
    pub data: Option<CommandData>,
}

impl Interaction {
    /// Display name of whoever invoked the interaction.
    #[must_use]
    pub fn invoker_name(&self) -> Option<&str> {
        self.member
            .as_ref()
            .and_then(GuildMember::display_name)
            .or_else(|| self.user.as_ref().map(User::display_name))
    }

    /// Token needed to edit the original response later.
    #[must_use]
    pub fn followup_token(&self) -> FollowupToken {
        FollowupToken {
            application_id: self.application_id,
            token: self.token.clone(),
        }
    }
}

/// Slash command payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    /// Command name.
    pub name: String,
    /// Supplied options.
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandData {
    /// String value of a named option.
    #[must_use]
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.name == name)
            .and_then(|opt| opt.value.as_ref())
            .and_then(serde_json::Value::as_str)
    }
}

/// A single slash command option.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    /// Option name.
    pub name: String,
    /// Option value (string, number or boolean).
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Immediate response to an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InteractionResponse {
    /// Response type code.
    #[serde(rename = "type")]
    pub kind: u8,
}

impl InteractionResponse {
    /// PONG, the answer to a ping.
    pub const PONG: Self = Self { kind: 1 };
    /// "Bot is thinking..." placeholder, edited later.
    pub const DEFERRED_CHANNEL_MESSAGE: Self = Self { kind: 5 };
}

/// Identity needed to edit a deferred response after the ack was sent.
///
/// Implements `Debug` manually because the token authorizes edits.
#[derive(Clone, PartialEq, Eq)]
pub struct FollowupToken {
    /// Application that received the interaction.
    pub application_id: ApplicationId,
    /// Interaction continuation token.
    pub token: String,
}

impl std::fmt::Debug for FollowupToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowupToken")
            .field("application_id", &self.application_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
