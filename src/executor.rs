use crate::error::AppError;
use crate::progress::Progress;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one fails transiently.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt + 1` (0-based): 100ms, 200ms, 400ms, ...
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(31)))
    }
}

/// Runs remote operations with retry on transient failures. Throttled
/// operations additionally share one pool of permits.
pub struct RequestExecutor {
    permits: Arc<Semaphore>,
    max_concurrency: usize,
    policy: RetryPolicy,
    progress: Arc<dyn Progress>,
}

impl RequestExecutor {
    /// Fails when `max_concurrency` is zero, since no throttled call could
    /// ever acquire a permit.
    pub fn new(
        max_concurrency: usize,
        policy: RetryPolicy,
        progress: Arc<dyn Progress>,
    ) -> Result<Self, AppError> {
        if max_concurrency == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "max_concurrency must be at least 1".into(),
            )));
        }
        log::debug!(
            "Request executor with {} permits, {} retries, base delay {:?}",
            max_concurrency,
            policy.max_retries,
            policy.base_delay
        );
        Ok(Self {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            policy,
            progress,
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a permit, then runs `operation` under the retry policy.
    /// The permit is held across retries and dropped on every exit path.
    pub async fn execute_throttled<T, F, Fut>(&self, label: &str, operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::Generic("request throttle closed".into()))?;
        log::trace!("Permit acquired for {}", label);
        self.execute_with(self.policy, label, operation).await
    }

    /// Runs `operation` under the retry policy without taking a permit.
    pub async fn execute<T, F, Fut>(&self, label: &str, operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        self.execute_with(self.policy, label, operation).await
    }

    pub async fn execute_with<T, F, Fut>(
        &self,
        policy: RetryPolicy,
        label: &str,
        mut operation: F,
    ) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.progress.tick();
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < policy.max_retries => {
                    let delay = policy.delay_for_attempt(attempt);
                    log::warn!("{} failed (attempt {}): {}", label, attempt + 1, e);
                    self.progress.line(&format!(
                        "Request failed: {}. Retrying in {}ms...",
                        e,
                        delay.as_millis()
                    ));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        log::error!("{} failed after {} attempts: {}", label, attempt + 1, e);
                    } else {
                        log::debug!("{} failed permanently: {}", label, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}
