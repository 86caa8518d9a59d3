//! Line parser turning channel messages into task records.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use task_relay_core::{ExtractedTask, MessageId, NicknameMap, TaskBatch, UserId};
use tracing::trace;

use crate::config::ExtractionConfig;
use crate::discord::ChannelMessage;

/// A leading `<@id>` or `<@!id>` mention followed by at least one character.
static MENTION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<@!?(\d+)>(.+)$").expect("Invalid regex"));

/// Split a line into the mentioned user and the raw trailing text.
///
/// Returns `None` if the line does not start with a mention or has nothing
/// after it.
#[must_use]
pub fn parse_mention_line(line: &str) -> Option<(UserId, &str)> {
    let captures = MENTION_LINE_RE.captures(line)?;
    let user_id = captures.get(1)?.as_str().parse::<UserId>().ok()?;
    let text = captures.get(2)?.as_str();
    Some((user_id, text))
}

/// Group message content into `(user, raw text)` task blocks.
///
/// Non-mention lines after a mention line continue its text until a blank
/// line or the next line starting with a mention. Lines before the first
/// mention are ignored.
fn task_blocks(content: &str) -> Vec<(UserId, String)> {
    let mut blocks: Vec<(UserId, String)> = Vec::new();
    let mut open = false;

    for line in content.lines() {
        if let Some((user_id, text)) = parse_mention_line(line) {
            blocks.push((user_id, text.to_string()));
            open = true;
        } else if line.trim().is_empty() || line.trim_start().starts_with("<@") {
            open = false;
        } else if open && let Some((_, text)) = blocks.last_mut() {
            text.push('\n');
            text.push_str(line.trim());
        }
    }

    blocks
}

/// Unique user IDs mentioned across a batch of messages.
#[must_use]
pub fn mentioned_user_ids(messages: &[ChannelMessage]) -> BTreeSet<UserId> {
    messages
        .iter()
        .flat_map(|message| message.mentions.iter().map(|user| user.id))
        .collect()
}

/// Extracts tasks from messages using the configured filler phrases and
/// completion reactions.
#[derive(Debug, Clone)]
pub struct TaskExtractor {
    filler_phrases: Vec<String>,
    completion_reactions: Vec<String>,
}

impl TaskExtractor {
    /// Create an extractor from configuration.
    #[must_use]
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            filler_phrases: config
                .filler_phrases
                .iter()
                .filter(|phrase| !phrase.is_empty())
                .cloned()
                .collect(),
            completion_reactions: config.completion_reactions.clone(),
        }
    }

    /// Extract tasks from a batch of messages, preserving message order.
    #[must_use]
    pub fn extract_all(
        &self,
        messages: &[ChannelMessage],
        nicknames: &NicknameMap,
        tracked: &HashSet<MessageId>,
    ) -> TaskBatch {
        let mut batch = TaskBatch::default();
        for message in messages {
            batch.extend(self.extract(message, nicknames, tracked));
        }
        batch
    }

    /// Extract tasks from one message.
    ///
    /// - Messages without mentions produce nothing.
    /// - Untracked messages produce new tasks.
    /// - Tracked messages produce updates only once they carry a completion
    ///   reaction; otherwise they were already logged and produce nothing.
    #[must_use]
    pub fn extract(
        &self,
        message: &ChannelMessage,
        nicknames: &NicknameMap,
        tracked: &HashSet<MessageId>,
    ) -> TaskBatch {
        if message.mentions.is_empty() {
            return TaskBatch::default();
        }

        let completed = message.has_any_reaction(&self.completion_reactions);
        let is_tracked = tracked.contains(&message.id);
        if is_tracked && !completed {
            return TaskBatch::default();
        }

        let tasks: Vec<ExtractedTask> = task_blocks(&message.content)
            .into_iter()
            .filter_map(|(user_id, raw)| {
                let Some(name) = nicknames.get(user_id) else {
                    trace!(message_id = %message.id, user_id = %user_id, "Dropping line for unresolved user");
                    return None;
                };
                let task = self.strip_filler(&raw);
                if task.is_empty() {
                    return None;
                }
                Some(ExtractedTask {
                    message_id: message.id,
                    timestamp: message.timestamp,
                    name: name.to_string(),
                    task,
                    completed,
                })
            })
            .collect();

        if is_tracked {
            TaskBatch {
                new_tasks: Vec::new(),
                updated_tasks: tasks,
            }
        } else {
            TaskBatch {
                new_tasks: tasks,
                updated_tasks: Vec::new(),
            }
        }
    }

    /// Trim, remove every occurrence of each filler phrase in order, trim again.
    #[must_use]
    pub fn strip_filler(&self, text: &str) -> String {
        let mut stripped = text.trim().to_string();
        for phrase in &self.filler_phrases {
            stripped = stripped.replace(phrase.as_str(), "");
        }
        stripped.trim().to_string()
    }
}
