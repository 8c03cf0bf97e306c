//! Informational checks an operator can run before (or instead of) launching.

mod checks;

pub use checks::*;
