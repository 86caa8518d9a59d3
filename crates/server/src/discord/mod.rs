//! Discord integration for task polling and slash-command interactions.
//!
//! This module provides:
//! - [`DiscordClient`] for listing channel messages, looking up guild
//!   members and editing deferred interaction responses
//! - [`InteractionVerifier`] for Ed25519 request signature verification
//! - Wire types for interactions, messages and members
//!
//! # Interaction Flow
//!
//! 1. Discord POSTs a signed interaction to `/interactions`
//! 2. The signature over `timestamp || body` is verified
//! 3. Ping gets an immediate PONG; the `log` command gets a deferred ack
//! 4. The side effect runs in the background
//! 5. The original response is edited with the result via [`FollowupToken`]

mod client;
mod error;
mod signature;
mod types;

pub use client::DiscordClient;
pub use error::DiscordError;
pub use signature::{InteractionVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use types::{
    ChannelMessage, CommandData, CommandOption, Emoji, FollowupToken, GuildMember, Interaction,
    InteractionKind, InteractionResponse, Reaction, User,
};
