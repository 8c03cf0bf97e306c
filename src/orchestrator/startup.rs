//! The startup sequence: optional dependency, bounded readiness wait, hand-over.
//!
//! Nothing before the hand-over is fatal. A missing artifact, a failed spawn or
//! a dependency that never opens its port all degrade to "start the bot anyway".
//! The only error `run` can return is the main process failing to launch.

use crate::config::LauncherConfig;
use crate::error::Result;
use crate::models::{DependencyState, LaunchReport};
use crate::orchestrator::Progress;
use crate::probe::{wait_for_ready, ReadinessProbe};
use crate::process::ProcessLauncher;
use chrono::Utc;
use tracing::{error, info, warn};

/// Runs the launcher's startup sequence once.
pub struct Orchestrator<P, L> {
    config: LauncherConfig,
    probe: P,
    launcher: L,
    progress: Progress,
    print_report: bool,
}

impl<P, L> Orchestrator<P, L>
where
    P: ReadinessProbe,
    L: ProcessLauncher,
{
    pub fn new(config: LauncherConfig, probe: P, launcher: L) -> Self {
        Self {
            config,
            probe,
            launcher,
            progress: Progress::new(false),
            print_report: false,
        }
    }

    /// Show an animated spinner instead of one line per failed probe.
    pub fn with_spinner(mut self, spinner: bool) -> Self {
        self.progress = Progress::new(spinner);
        self
    }

    /// Print the `LaunchReport` as JSON right before the hand-over.
    pub fn with_report(mut self, print_report: bool) -> Self {
        self.print_report = print_report;
        self
    }

    /// Starts the dependency when its artifact exists and waits for its port.
    pub async fn start_dependency(&mut self) -> DependencyState {
        let artifact = &self.config.artifact;
        if !artifact.is_file() {
            warn!(
                "Dependency artifact {} not found; continuing without it",
                artifact.display()
            );
            self.progress.artifact_missing(artifact);
            return DependencyState::Skipped {
                artifact: artifact.clone(),
            };
        }

        if !self.config.lavalink_config.is_file() {
            warn!(
                "Dependency configuration {} not found",
                self.config.lavalink_config.display()
            );
            self.progress.config_missing(&self.config.lavalink_config);
        }

        let command = self.config.dependency_command();
        self.progress.dependency_starting(&command);

        let pid = match self.launcher.spawn_background(&command) {
            Ok(pid) => pid,
            Err(e) => {
                error!("Failed to start dependency '{}': {}", command, e);
                let reason = e.to_string();
                self.progress.spawn_failed(&reason);
                return DependencyState::SpawnFailed { reason };
            },
        };
        info!("Dependency started in the background (pid {})", pid);

        let target = &self.config.target;
        let policy = self.config.policy;
        self.progress.waiting(target, policy.attempts);

        let progress = &self.progress;
        let probe = wait_for_ready(&self.probe, target, policy, |attempt, total| {
            progress.attempt_failed(attempt, total)
        })
        .await;
        self.progress.probe_finished(&probe);

        DependencyState::Started { pid, probe }
    }

    /// Runs the dependency phase and summarizes it.
    pub async fn prepare(&mut self) -> LaunchReport {
        let started_at = Utc::now();
        let dependency = self.start_dependency().await;

        LaunchReport {
            started_at,
            dependency,
            main_command: self.config.main_command.to_string(),
        }
    }

    /// Runs the full sequence and hands over to the main process exactly once.
    ///
    /// Returns the exit code to terminate with; with an exec-based launcher this
    /// only returns when the main process could not be started.
    pub async fn run(mut self) -> Result<u8> {
        let report = self.prepare().await;

        if self.print_report {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Could not serialize launch report: {}", e),
            }
        }

        info!(
            "Handing over to main process after {} probe attempt(s): {}",
            report.dependency.probe_attempts(),
            self.config.main_command
        );
        self.progress
            .handing_over(&self.config.main_command, &report.dependency);
        self.launcher.hand_over(&self.config.main_command).await
    }
}
