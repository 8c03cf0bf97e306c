//! Readiness probing for the background dependency.
//!
//! Includes:
//! - `tcp`: the `ReadinessProbe` seam, a tokio-backed TCP connect probe and the bounded polling loop.

mod tcp;

pub use tcp::*;
