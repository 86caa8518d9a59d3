//! Task relay server library.
//!
//! Receives signed Discord interactions and scheduled poll triggers, pulls
//! "<@user> task" lines out of a channel, and forwards them to a spreadsheet
//! automation webhook.
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around
//! [`routes::app`]; everything else lives here so it can be tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod automation;
pub mod config;
pub mod discord;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod tasks;
