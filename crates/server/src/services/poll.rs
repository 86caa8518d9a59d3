//! Poll cycle: fetch recent messages, resolve mentions, extract tasks and
//! forward them in one POST.
//!
//! Each cycle reads the page after the watermark, then re-reads every tracked
//! message individually so completions are seen however far behind the
//! watermark they are. Cycles are serialized so two overlapping polls never
//! forward the same window.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use task_relay_core::{ChannelId, MessageId};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::nickname::NicknameResolver;
use crate::automation::AutomationClient;
use crate::discord::{ChannelMessage, DiscordClient, DiscordError};
use crate::error::AppError;
use crate::tasks::{TaskExtractor, mentioned_user_ids};

/// Optional body of a poll request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    /// Messages the caller already logged but has not seen completed.
    #[serde(default)]
    pub uncompleted_ids: Vec<MessageId>,
}

/// Summary returned to the poll caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome {
    /// Messages returned by Discord this cycle, tracked re-reads included.
    pub fetched: usize,
    /// New task records forwarded.
    pub new_tasks: usize,
    /// Completion updates forwarded.
    pub updated_tasks: usize,
    /// Whether a POST was made to the automation endpoint.
    pub forwarded: bool,
    /// Watermark after this cycle.
    pub cursor: Option<MessageId>,
}

/// Highest message ID relayed so far.
///
/// Held in memory only, so a restart re-reads the latest page.
#[derive(Debug, Default)]
pub struct PollCursor(AtomicU64);

impl PollCursor {
    /// An empty cursor.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Current watermark, if any message was relayed yet.
    #[must_use]
    pub fn get(&self) -> Option<MessageId> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            id => Some(MessageId::new(id)),
        }
    }

    /// Move the watermark forward. Never moves it backwards.
    pub fn advance(&self, to: MessageId) {
        self.0.fetch_max(to.as_u64(), Ordering::AcqRel);
    }
}

/// Runs poll cycles against one channel.
#[derive(Debug)]
pub struct PollService {
    discord: DiscordClient,
    automation: AutomationClient,
    nicknames: NicknameResolver,
    extractor: TaskExtractor,
    channel_id: ChannelId,
    cursor: PollCursor,
    /// Held for a whole cycle, from reading the cursor to advancing it.
    cycle: Mutex<()>,
}

impl PollService {
    /// Create a poll service with an empty cursor.
    #[must_use]
    pub fn new(
        discord: DiscordClient,
        automation: AutomationClient,
        nicknames: NicknameResolver,
        extractor: TaskExtractor,
        channel_id: ChannelId,
    ) -> Self {
        Self {
            discord,
            automation,
            nicknames,
            extractor,
            channel_id,
            cursor: PollCursor::new(),
            cycle: Mutex::new(()),
        }
    }

    /// The relay watermark.
    #[must_use]
    pub const fn cursor(&self) -> &PollCursor {
        &self.cursor
    }

    /// Run one poll cycle.
    ///
    /// Overlapping calls wait for each other. The cursor advances only once
    /// the batch was forwarded, or when there was nothing to forward.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UpstreamFetchFailed` if Discord cannot be read and
    /// `AppError::ForwardFailed` if the automation endpoint rejects the batch.
    #[instrument(skip(self, request), fields(channel = %self.channel_id, tracked = request.uncompleted_ids.len()))]
    pub async fn run(&self, request: PollRequest) -> Result<PollOutcome, AppError> {
        let _cycle = self.cycle.lock().await;

        let tracked: HashSet<MessageId> = request.uncompleted_ids.into_iter().collect();
        let after = self.cursor.get();

        let mut messages = self.discord.fetch_messages(self.channel_id, after).await?;
        let newest = messages.iter().map(|m| m.id).max();
        let window = messages.len();

        let rereads = self.reread_tracked(&tracked, &messages).await?;
        messages.extend(rereads);
        let fetched = messages.len();
        debug!(window, fetched, after = ?after, "Fetched poll window");

        let user_ids = mentioned_user_ids(&messages);
        let nicknames = self.nicknames.resolve(&user_ids).await;
        let batch = self.extractor.extract_all(&messages, &nicknames, &tracked);

        let forwarded = if batch.is_empty() {
            debug!("No tasks extracted; skipping forward");
            false
        } else {
            self.automation.forward_tasks(&batch).await?;
            true
        };

        if let Some(newest) = newest {
            self.cursor.advance(newest);
        }

        let outcome = PollOutcome {
            fetched,
            new_tasks: batch.new_tasks.len(),
            updated_tasks: batch.updated_tasks.len(),
            forwarded,
            cursor: self.cursor.get(),
        };
        info!(
            new_tasks = outcome.new_tasks,
            updated_tasks = outcome.updated_tasks,
            forwarded,
            "Poll cycle complete"
        );

        Ok(outcome)
    }

    /// Fetch every tracked message that is not already in `window`.
    ///
    /// A tracked message that no longer exists is skipped.
    async fn reread_tracked(
        &self,
        tracked: &HashSet<MessageId>,
        window: &[ChannelMessage],
    ) -> Result<Vec<ChannelMessage>, DiscordError> {
        let seen: HashSet<MessageId> = window.iter().map(|m| m.id).collect();
        let missing: BTreeSet<MessageId> = tracked
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();

        let lookups = missing.into_iter().map(|message_id| async move {
            match self.discord.fetch_message(self.channel_id, message_id).await {
                Ok(message) => Ok(Some(message)),
                Err(DiscordError::Api { status: 404, .. }) => {
                    warn!(message_id = %message_id, "Tracked message no longer exists");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        });

        Ok(try_join_all(lookups).await?.into_iter().flatten().collect())
    }
}
