use std::time::Duration;

use reqwest::StatusCode;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::config::KeepAliveConfig;

const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Periodic self-request that keeps an idle-suspending host awake.
#[derive(Debug, Clone)]
pub struct KeepAlive {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl KeepAlive {
    pub fn new(client: reqwest::Client, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            interval,
        }
    }

    /// `None` when the task is switched off or has nowhere to ping.
    pub fn from_config(client: reqwest::Client, config: &KeepAliveConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let url = config.url.as_deref().filter(|url| !url.is_empty())?;
        Some(Self::new(client, url, config.interval()))
    }

    pub async fn ping(&self) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .get(&self.url)
            .timeout(PING_TIMEOUT)
            .send()
            .await?;
        Ok(response.status())
    }

    /// Runs on its own task; the first ping fires one interval after start.
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(url = %self.url, interval_secs = self.interval.as_secs(), "Keep-alive enabled");

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.ping().await {
                    Ok(status) => tracing::info!(url = %self.url, %status, "Keep-alive ping sent"),
                    Err(e) => tracing::warn!(url = %self.url, "Keep-alive ping failed: {}", e),
                }
            }
        })
    }
}
