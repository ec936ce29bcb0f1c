use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Fixed wait between a close and the next attempt.
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u32, delay: Duration },
    GiveUp { attempts: u32 },
}

/// Counts consecutive failed channel attempts.
///
/// The counter only goes back to zero on a successful open or an explicit
/// reset, so a flapping relay still runs into the ceiling.
#[derive(Debug, Clone)]
pub struct ReconnectionPolicy {
    config: ReconnectConfig,
    attempts: u32,
}

impl ReconnectionPolicy {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_channel_opened(&mut self) {
        if self.attempts > 0 {
            info!("Relay channel back after {} attempt(s)", self.attempts);
        }
        self.attempts = 0;
    }

    pub fn on_channel_closed(&mut self, reason: &str) -> RetryDecision {
        if self.attempts >= self.config.max_attempts {
            warn!(
                "Relay channel closed ({}), giving up after {} attempts",
                reason, self.attempts
            );
            return RetryDecision::GiveUp {
                attempts: self.attempts,
            };
        }

        self.attempts += 1;
        info!(
            "Relay channel closed ({}), retry {}/{} in {:?}",
            reason, self.attempts, self.config.max_attempts, self.config.delay
        );
        RetryDecision::Retry {
            attempt: self.attempts,
            delay: self.config.delay,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}
