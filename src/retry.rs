use std::time::Duration;
use tokio::time::sleep;

use crate::config::RpcConfig;
use crate::error::{ForwarderError, RpcError};
use crate::logging::{ErrorLogger, LogContext};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to the delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn from_rpc(config: &RpcConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
            ..Self::default()
        }
    }

    /// Single attempt, no waiting
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Retries idempotent operations with exponential backoff and jitter
pub struct RetryManager {
    config: RetryConfig,
    operation_name: String,
}

impl RetryManager {
    pub fn new(operation_name: &str, config: RetryConfig) -> Self {
        Self {
            config,
            operation_name: operation_name.to_string(),
        }
    }

    /// Execute an operation, retrying only errors that report themselves recoverable
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, ForwarderError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, ForwarderError>>,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        LogContext::new("retry", &self.operation_name)
                            .with_retry_count(attempt)
                            .info("Operation recovered");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_recoverable() || attempt >= self.config.max_attempts {
                        if attempt > 1 {
                            ErrorLogger::log_recovery_attempt(&error, attempt, self.config.max_attempts);
                        }
                        return Err(error);
                    }

                    ErrorLogger::log_recovery_attempt(&error, attempt, self.config.max_attempts);
                    let delay = match &error {
                        ForwarderError::Rpc(RpcError::RateLimit { seconds }) => {
                            Duration::from_secs(*seconds).max(self.calculate_delay(attempt))
                        }
                        _ => self.calculate_delay(attempt),
                    };
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Calculate delay for the given attempt number
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.config.initial_delay.as_secs_f64();
        let exponential_delay = base_delay * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let capped_delay = exponential_delay.min(self.config.max_delay.as_secs_f64());

        let final_delay = if self.config.jitter {
            let jitter = capped_delay * 0.1 * (rand::random::<f64>() - 0.5);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}
