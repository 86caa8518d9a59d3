//! Task records forwarded to the automation endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::MessageId;

/// A single "<@user> task" line pulled out of a channel message.
///
/// Serialized with camelCase keys because the spreadsheet automation reads
/// `messageId` directly as a row key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTask {
    /// The message the line came from.
    pub message_id: MessageId,
    /// When the message was posted.
    pub timestamp: DateTime<Utc>,
    /// Display name of the assignee.
    pub name: String,
    /// Task text with filler phrases stripped.
    pub task: String,
    /// Whether the message carries a completion reaction.
    pub completed: bool,
}

/// The result of one poll cycle, partitioned by whether the caller already
/// tracks the source message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBatch {
    /// Tasks from messages the caller has not seen yet.
    pub new_tasks: Vec<ExtractedTask>,
    /// Completion updates for messages the caller already tracks.
    pub updated_tasks: Vec<ExtractedTask>,
}

impl TaskBatch {
    /// Returns true when there is nothing to forward.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_tasks.is_empty() && self.updated_tasks.is_empty()
    }

    /// Append another batch, keeping message order.
    pub fn extend(&mut self, other: Self) {
        self.new_tasks.extend(other.new_tasks);
        self.updated_tasks.extend(other.updated_tasks);
    }

    /// Every task record, new tasks first.
    pub fn all_tasks(&self) -> impl Iterator<Item = &ExtractedTask> {
        self.new_tasks.iter().chain(&self.updated_tasks)
    }
}
