//! Data structures for a single launcher run.
//!
//! Includes structs for:
//! - The TCP endpoint probed for readiness (`ProbeTarget`) and the result of polling it (`ProbeOutcome`).
//! - What happened to the background dependency (`DependencyState`) and the overall `LaunchReport`.
//! - The keepalive payload served by the bot (`KeepaliveStatus`).
//! - Preflight check rows (`PreflightItem`, `PreflightReport`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Host and port of the dependency's control endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, as accepted by `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}

/// Result of polling the control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// A connection was accepted on attempt number `attempts`.
    Ready { attempts: u32, elapsed_ms: u64 },
    /// Every one of the `attempts` probes failed.
    TimedOut { attempts: u32, elapsed_ms: u64 },
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProbeOutcome::Ready { .. })
    }

    /// Number of connection attempts that were made.
    pub fn attempts(&self) -> u32 {
        match self {
            ProbeOutcome::Ready { attempts, .. } | ProbeOutcome::TimedOut { attempts, .. } => {
                *attempts
            },
        }
    }
}

/// What the launcher did about the background dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DependencyState {
    /// The artifact was not found; the main process runs without it.
    Skipped { artifact: PathBuf },
    /// The artifact exists but the process could not be spawned.
    SpawnFailed { reason: String },
    /// The process was spawned and its port was polled.
    Started { pid: u32, probe: ProbeOutcome },
}

impl DependencyState {
    /// Total connection attempts made, zero when nothing was polled.
    pub fn probe_attempts(&self) -> u32 {
        match self {
            DependencyState::Started { probe, .. } => probe.attempts(),
            _ => 0,
        }
    }
}

/// Summary of the orchestration phase, produced right before hand-over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReport {
    pub started_at: DateTime<Utc>,
    pub dependency: DependencyState,
    /// Shell-like rendering of the main command that is about to run.
    pub main_command: String,
}

/// JSON body served by the bot's keepalive route, e.g. `{"status":"ok","bot_user":"starting"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepaliveStatus {
    pub status: String,
    #[serde(default)]
    pub bot_user: Option<String>,
}

impl KeepaliveStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// One row of the preflight report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightItem {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

/// All preflight rows, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreflightReport {
    pub items: Vec<PreflightItem>,
}

impl PreflightReport {
    pub fn push(&mut self, name: &str, ok: bool, detail: impl Into<String>) {
        self.items.push(PreflightItem {
            name: name.to_string(),
            ok,
            detail: detail.into(),
        });
    }

    pub fn all_ok(&self) -> bool {
        self.items.iter().all(|item| item.ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probe_target_address() {
        let target = ProbeTarget::new("127.0.0.1", 2333);
        assert_eq!(target.address(), "127.0.0.1:2333");
        assert_eq!(target.to_string(), "127.0.0.1:2333");
    }

    #[test]
    fn test_dependency_state_attempts() {
        let skipped = DependencyState::Skipped {
            artifact: PathBuf::from("Lavalink.jar"),
        };
        assert_eq!(skipped.probe_attempts(), 0);

        let started = DependencyState::Started {
            pid: 42,
            probe: ProbeOutcome::TimedOut {
                attempts: 60,
                elapsed_ms: 59_000,
            },
        };
        assert_eq!(started.probe_attempts(), 60);
    }

    #[test]
    fn test_launch_report_serializes_tagged_state() {
        let report = LaunchReport {
            started_at: Utc::now(),
            dependency: DependencyState::Started {
                pid: 7,
                probe: ProbeOutcome::Ready {
                    attempts: 3,
                    elapsed_ms: 2_004,
                },
            },
            main_command: "python3 bot.py".to_string(),
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["dependency"]["state"], "started");
        assert_eq!(value["dependency"]["pid"], 7);
        assert_eq!(value["dependency"]["probe"]["outcome"], "ready");
        assert_eq!(value["dependency"]["probe"]["attempts"], 3);
        assert_eq!(value["main_command"], "python3 bot.py");
    }

    #[test]
    fn test_keepalive_status_parsing() {
        let starting: KeepaliveStatus =
            serde_json::from_value(json!({"status": "ok", "bot_user": "starting"})).unwrap();
        assert!(starting.is_ok());
        assert_eq!(starting.bot_user.as_deref(), Some("starting"));

        // bot_user is optional
        let bare: KeepaliveStatus = serde_json::from_value(json!({"status": "degraded"})).unwrap();
        assert!(!bare.is_ok());
        assert!(bare.bot_user.is_none());

        let shouted: KeepaliveStatus = serde_json::from_value(json!({"status": "OK"})).unwrap();
        assert!(!shouted.is_ok());
    }

    #[test]
    fn test_preflight_report_all_ok() {
        let mut report = PreflightReport::default();
        report.push("artifact", true, "Lavalink.jar");
        assert!(report.all_ok());
        report.push("DISCORD_TOKEN", false, "not set");
        assert!(!report.all_ok());
        assert_eq!(report.items.len(), 2);
    }
}
