//! Polls a TCP endpoint until it accepts a connection or the attempt budget runs out.
//!
//! The probe is a one-shot reachability check: a successful connect is taken as
//! "ready" and the stream is dropped immediately. No bytes are exchanged.

use crate::models::{ProbeOutcome, ProbeTarget};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Default number of polling attempts before giving up.
pub const DEFAULT_ATTEMPTS: u32 = 60;
/// Default delay between two attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
/// Default per-attempt connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Something that can tell whether a target is accepting connections.
pub trait ReadinessProbe {
    fn check(&self, target: &ProbeTarget) -> impl Future<Output = bool> + Send;
}

/// Bounds of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Plain TCP connect probe.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl ReadinessProbe for TcpProbe {
    async fn check(&self, target: &ProbeTarget) -> bool {
        let addr = target.address();
        match timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => {
                debug!("TCP probe accepted by {}", addr);
                true
            },
            Ok(Err(e)) => {
                debug!("TCP probe to {} failed: {}", addr, e);
                false
            },
            Err(_) => {
                debug!("TCP probe to {} timed out after {:?}", addr, self.connect_timeout);
                false
            },
        }
    }
}

/// Probes `target` up to `policy.attempts` times, `policy.interval` apart.
///
/// Returns on the first successful attempt. There is no sleep after the final
/// attempt, so a full timeout takes `(attempts - 1) * interval` plus probe time.
/// `on_failed_attempt(attempt, total)` is invoked after every failed attempt.
pub async fn wait_for_ready<P, F>(
    probe: &P,
    target: &ProbeTarget,
    policy: PollPolicy,
    mut on_failed_attempt: F,
) -> ProbeOutcome
where
    P: ReadinessProbe,
    F: FnMut(u32, u32),
{
    let start = Instant::now();
    info!(
        "Waiting for {} to accept connections ({} attempts, {:?} apart)",
        target, policy.attempts, policy.interval
    );

    for attempt in 1..=policy.attempts {
        if probe.check(target).await {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            info!("{} is ready after {} attempt(s)", target, attempt);
            return ProbeOutcome::Ready {
                attempts: attempt,
                elapsed_ms,
            };
        }

        on_failed_attempt(attempt, policy.attempts);

        if attempt < policy.attempts {
            sleep(policy.interval).await;
        }
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    warn!(
        "{} did not become ready after {} attempt(s); continuing anyway",
        target, policy.attempts
    );
    ProbeOutcome::TimedOut {
        attempts: policy.attempts,
        elapsed_ms,
    }
}
