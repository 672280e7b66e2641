//! HTTP readiness probing for a freshly started server.
//!
//! The control binary's `start`/`restart` return before the daemon accepts
//! HTTP connections, so a successful subcommand is not "ready". The probe
//! issues bare GETs against the server's base URL until one of them gets
//! any HTTP response back; only connection-level failures count as "not
//! attached yet". The attempt budget is bounded so a server that never
//! comes up surfaces as a terminal error instead of an infinite loop.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::supervisor::Endpoint;

/// Delay between attempts (the first attempt is immediate).
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);
/// Attempt budget before giving up (about a minute at the default delay).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;
/// Per-request timeout; a hung accept queue counts as "not attached yet".
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Polls a server endpoint until it accepts HTTP connections.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    client: reqwest::Client,
    delay: Duration,
    max_attempts: u32,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS)
    }
}

impl ReadinessProbe {
    /// Create a probe with an explicit polling policy.
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create readiness probe client");

        Self {
            client,
            delay,
            max_attempts,
        }
    }

    /// Wait until the endpoint's base URL answers an HTTP request.
    ///
    /// Any response counts as attached, including error statuses; the
    /// server is up even when it dislikes the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachTimeout`] when the attempt budget runs out.
    pub async fn wait(&self, endpoint: &Endpoint) -> Result<()> {
        let url = format!("{}/", endpoint.server);

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.delay).await;
            }

            match self.client.get(&url).send().await {
                Ok(response) => {
                    debug!(url = %url, status = %response.status(), attempt, "Server attached");
                    return Ok(());
                }
                Err(err) => {
                    debug!(url = %url, error = %err, attempt, "Server not attached yet");
                }
            }
        }

        warn!(url = %url, attempts = self.max_attempts, "Server never attached");
        Err(Error::AttachTimeout {
            url,
            attempts: self.max_attempts,
        })
    }
}
