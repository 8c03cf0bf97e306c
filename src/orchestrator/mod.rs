//! Sequences the dependency and the main process.
//!
//! Includes:
//! - `startup`: the `Orchestrator` that decides whether to start the dependency, waits for it and hands over.
//! - `progress`: human-readable progress output on stdout (spinner when attached to a terminal).

mod progress;
mod startup;

pub use progress::*;
pub use startup::*;
