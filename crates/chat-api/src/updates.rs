//! Long-poll update stream with reconnect backoff.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::ChatClient;
use crate::types::Update;

/// Polling and backoff configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Server-side long-poll hold time in seconds.
    pub poll_timeout_secs: u64,
    /// Initial delay before retrying a failed poll.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for consecutive failures.
    pub backoff_multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 30,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl PollConfig {
    /// Delay before the given retry attempt (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

/// A pull-based stream of updates.
///
/// Wraps `getUpdates` long polling: maintains the offset cursor, buffers
/// batches, and backs off on transport errors instead of surfacing them -
/// the ingress loop should never die because the platform hiccuped.
pub struct UpdateStream {
    client: ChatClient,
    config: PollConfig,
    offset: i64,
    buffer: VecDeque<Update>,
    consecutive_failures: u32,
}

impl UpdateStream {
    pub fn new(client: ChatClient) -> Self {
        Self::with_config(client, PollConfig::default())
    }

    pub fn with_config(client: ChatClient, config: PollConfig) -> Self {
        Self {
            client,
            config,
            offset: 0,
            buffer: VecDeque::new(),
            consecutive_failures: 0,
        }
    }

    /// Next update, waiting as long as necessary.
    pub async fn next(&mut self) -> Update {
        loop {
            if let Some(update) = self.buffer.pop_front() {
                return update;
            }
            match self
                .client
                .get_updates(self.offset, self.config.poll_timeout_secs)
                .await
            {
                Ok(batch) => {
                    self.consecutive_failures = 0;
                    if let Some(last) = batch.last() {
                        self.offset = last.update_id + 1;
                    }
                    debug!("received {} updates", batch.len());
                    self.buffer.extend(batch);
                }
                Err(e) => {
                    let delay = self.config.delay_for_attempt(self.consecutive_failures);
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    warn!("update poll failed ({}), retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Convenience constructor mirroring the client entry point.
pub fn subscribe(client: &ChatClient) -> UpdateStream {
    UpdateStream::new(client.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = PollConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(30));
    }
}
