use std::time::Duration;

/// Fixed-delay retry. The remote rate window is fixed, so the delay never grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// None retries forever
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self { delay, max_attempts }
    }

    pub fn unbounded(delay: Duration) -> Self {
        Self::new(delay, None)
    }

    /// True once `attempts` submissions have used up the cap
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempts >= max)
    }

    pub async fn wait(&self) {
        tokio::time::sleep(self.delay).await;
    }
}
