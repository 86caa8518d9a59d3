//! Business logic services.
//!
//! # Services
//!
//! - `interactions` - Two-phase slash command handling (ack, then follow-up)
//! - `nickname` - Concurrent guild-member lookups for mentioned users
//! - `poll` - One poll cycle: fetch, resolve, extract, forward

pub mod interactions;
pub mod nickname;
pub mod poll;

pub use interactions::{
    Acknowledgement, DeferredLog, InteractionService, LOG_COMMAND, LOG_MESSAGE_OPTION,
};
pub use nickname::NicknameResolver;
pub use poll::{PollCursor, PollOutcome, PollRequest, PollService};
