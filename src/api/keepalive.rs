//! Provides a client for the bot's keepalive HTTP route.
//!
//! The bot serves `GET /` on its web port and answers with
//! `{"status": "ok", "bot_user": "<name>"}` (or `"starting"` before login).
//! Anything else counts as unhealthy.

use crate::error::{AppError, Result};
use crate::models::KeepaliveStatus;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// An asynchronous client for the keepalive endpoint.
pub struct KeepaliveClient {
    client: Client,
}

impl KeepaliveClient {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetches `url` and returns the parsed status when the bot reports itself healthy.
    pub async fn check(&self, url: &str) -> Result<KeepaliveStatus> {
        debug!("Checking keepalive endpoint {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!("Keepalive request to {} failed: {}", url, e);
            AppError::from(e)
        })?;

        let status_code = response.status();
        if !status_code.is_success() {
            return Err(AppError::Health(format!(
                "{} answered with HTTP {}",
                url, status_code
            )));
        }

        let status: KeepaliveStatus = response.json().await.map_err(|e| {
            error!("Error parsing keepalive response from {}: {}", url, e);
            AppError::from(e)
        })?;

        if !status.is_ok() {
            return Err(AppError::Health(format!(
                "{} reported status '{}'",
                url, status.status
            )));
        }

        debug!("Keepalive healthy, bot_user: {:?}", status.bot_user);
        Ok(status)
    }
}
