//! Defines the data structures used throughout the launcher.
//!
//! This covers the readiness probe target and outcome, the state of the
//! background dependency, the report printed before hand-over, and the
//! payloads exchanged with the bot's keepalive endpoint.

mod launch;

pub use launch::*;
