//! Task Relay Core - Shared domain types.
//!
//! This crate provides the types passed between the relay's components:
//! - snowflake ID newtypes for Discord entities
//! - [`ExtractedTask`] and [`TaskBatch`], the records sent to the automation
//!   endpoint
//! - [`NicknameMap`], the per-poll mapping from user ID to display name
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Parsing
//! message content and talking to Discord live in `task-relay-server`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
