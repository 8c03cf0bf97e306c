//! Progress lines written to stdout while the launcher works.
//!
//! Logs go to stderr through `tracing`; this is the operator-facing channel.
//! On a terminal the polling phase is a single `indicatif` spinner, otherwise
//! every failed attempt is one plain line so container logs stay readable.

use crate::models::{DependencyState, ProbeOutcome, ProbeTarget};
use crate::process::CommandSpec;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub struct Progress {
    spinner: bool,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(spinner: bool) -> Self {
        Self { spinner, bar: None }
    }

    pub fn artifact_missing(&self, artifact: &Path) {
        println!(
            "{} {} not found, starting the bot without Lavalink",
            "warning:".yellow().bold(),
            artifact.display()
        );
    }

    pub fn config_missing(&self, config: &Path) {
        println!(
            "{} {} not found, Lavalink will use its built-in defaults",
            "warning:".yellow().bold(),
            config.display()
        );
    }

    pub fn dependency_starting(&self, command: &CommandSpec) {
        println!("{} {}", "Starting Lavalink:".cyan().bold(), command);
    }

    pub fn spawn_failed(&self, reason: &str) {
        println!(
            "{} could not start Lavalink ({}), starting the bot anyway",
            "warning:".yellow().bold(),
            reason
        );
    }

    pub fn waiting(&mut self, target: &ProbeTarget, total: u32) {
        println!("Waiting for Lavalink on {} (up to {} attempts)...", target, total);

        if self.spinner {
            let bar = ProgressBar::new(u64::from(total));
            let style = ProgressStyle::with_template("{spinner:.cyan} {msg} [{pos}/{len}] {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.set_message(format!("waiting for {}", target));
            bar.enable_steady_tick(Duration::from_millis(120));
            self.bar = Some(bar);
        }
    }

    pub fn attempt_failed(&self, attempt: u32, total: u32) {
        match &self.bar {
            Some(bar) => bar.set_position(u64::from(attempt)),
            None => println!("Lavalink not ready yet ({}/{})", attempt, total),
        }
    }

    pub fn probe_finished(&mut self, outcome: &ProbeOutcome) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }

        match outcome {
            ProbeOutcome::Ready { attempts, elapsed_ms } => println!(
                "{} after {} attempt(s) ({:.1}s)",
                "Lavalink is ready".green().bold(),
                attempts,
                *elapsed_ms as f64 / 1000.0
            ),
            ProbeOutcome::TimedOut { attempts, elapsed_ms } => println!(
                "{} after {} attempt(s) ({:.1}s), starting the bot anyway",
                "Lavalink did not become ready".yellow().bold(),
                attempts,
                *elapsed_ms as f64 / 1000.0
            ),
        }
    }

    pub fn handing_over(&self, command: &CommandSpec, dependency: &DependencyState) {
        let mode = match dependency {
            DependencyState::Started { probe, .. } if probe.is_ready() => "",
            DependencyState::Started { .. } => " (Lavalink not confirmed ready)",
            _ => " (degraded: no Lavalink)",
        };
        println!("{} {}{}", "Starting bot:".cyan().bold(), command, mode);
    }
}
