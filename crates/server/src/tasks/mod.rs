//! Task extraction from channel messages.
//!
//! A task is a line that starts with a user mention followed by free text:
//!
//! ```text
//! <@123456789012345678> 議事録の作成お願いします
//! <@!987654321098765432> book the meeting room
//! ```
//!
//! Lines without a mention that follow a task line continue its text, up to
//! the next blank line or mention line.
//!
//! The mention resolves to an assignee display name via the poll cycle's
//! [`NicknameMap`](task_relay_core::NicknameMap); the trailing text, minus
//! filler phrases, becomes the task.

mod extractor;

pub use extractor::{TaskExtractor, mentioned_user_ids, parse_mention_line};
