//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes the `clap` argument definitions (with environment fallbacks for
//! container use) and the `App` that dispatches the selected subcommand.

mod commands;

pub use commands::*;
