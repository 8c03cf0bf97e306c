//! Provides clients for HTTP endpoints the launcher talks to.
//!
//! Includes:
//! - `keepalive`: Client for the bot's keepalive route, used by the `health` command.

mod keepalive;

pub use keepalive::*;
