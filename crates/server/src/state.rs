//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::automation::{AutomationClient, AutomationError};
use crate::config::RelayConfig;
use crate::discord::{DiscordClient, DiscordError, InteractionVerifier};
use crate::services::{InteractionService, NicknameResolver, PollService};
use crate::tasks::TaskExtractor;

/// Error building application state from configuration.
#[derive(Debug, Error)]
pub enum StateError {
    /// The public key or Discord HTTP client could not be set up.
    #[error("discord setup failed: {0}")]
    Discord(#[from] DiscordError),

    /// The automation HTTP client could not be built.
    #[error("automation setup failed: {0}")]
    Automation(#[from] AutomationError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The poll cursor lives here, so every clone
/// sees the same watermark.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RelayConfig,
    verifier: InteractionVerifier,
    interactions: InteractionService,
    poll: PollService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create application state, building every client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the public key is not a valid Ed25519 point or an
    /// HTTP client cannot be built.
    pub fn new(config: RelayConfig) -> Result<Self, StateError> {
        let verifier = InteractionVerifier::from_bytes(&config.discord.public_key)?;
        let discord = DiscordClient::new(&config.discord, config.http_timeout)?;
        let automation = AutomationClient::new(&config.automation, config.http_timeout)?;

        let poll = PollService::new(
            discord.clone(),
            automation.clone(),
            NicknameResolver::new(discord.clone(), config.discord.guild_id),
            TaskExtractor::new(&config.extraction),
            config.discord.channel_id,
        );
        let interactions = InteractionService::new(discord, automation);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                verifier,
                interactions,
                poll,
            }),
        })
    }

    /// Get the interaction signature verifier.
    #[must_use]
    pub fn verifier(&self) -> &InteractionVerifier {
        &self.inner.verifier
    }

    /// Get the slash command service.
    #[must_use]
    pub fn interactions(&self) -> &InteractionService {
        &self.inner.interactions
    }

    /// Get the poll service.
    #[must_use]
    pub fn poll(&self) -> &PollService {
        &self.inner.poll
    }
}
