use std::future::Future;

/// Bounded re-run policy for scenarios: an attempt that fails is repeated up
/// to `max_retries` more times, whatever the failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2 }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Run `op` until it succeeds or the retries are used up. Returns the last
    /// result together with the number of attempts made.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> (u32, Result<T, E>)
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => return (attempt, Ok(v)),
                Err(e) => {
                    if attempt > self.max_retries {
                        log::error!("{} failed after {} attempts: {}", label, attempt, e);
                        return (attempt, Err(e));
                    }
                    log::warn!("{} attempt {} failed: {}. Retrying...", label, attempt, e);
                }
            }
        }
    }
}
