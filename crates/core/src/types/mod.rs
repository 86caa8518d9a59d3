//! Core types for the task relay.
//!
//! This module provides type-safe wrappers for the relay's domain concepts.

pub mod id;
pub mod nickname;
pub mod task;

pub use id::*;
pub use nickname::NicknameMap;
pub use task::{ExtractedTask, TaskBatch};
