//! Starting the external processes the launcher sequences.
//!
//! Includes:
//! - `launcher`: `CommandSpec`, the `ProcessLauncher` seam and the OS-backed `SystemLauncher`.

mod launcher;

pub use launcher::*;
