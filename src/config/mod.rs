//! Resolves command-line arguments and environment variables into a validated `LauncherConfig`.

mod settings;

pub use settings::*;
