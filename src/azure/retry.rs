//! Growing-delay retry for Azure calls.
//!
//! Throttled graph queries are retried after a delay that starts at 10s and
//! grows by 1.5x per failure. Once the total time spent waiting would pass
//! 600s the run is aborted instead of skipping the failing call.

use std::error::Error;
use std::time::Duration;

/// Retry policy for a single Azure call.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub multiplier: f64,
    /// Cap on the cumulative delay before giving up.
    pub max_total: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            initial: Duration::from_secs(10),
            multiplier: 1.5,
            max_total: Duration::from_secs(600),
        }
    }
}

impl Backoff {
    /// Run `op` until it succeeds or the cumulative delay budget is spent.
    ///
    /// # Returns
    /// * `Ok(T)` - The first successful result
    /// * `Err` - Fatal error once waiting longer would exceed `max_total`
    pub fn retry<T, F>(&self, what: &str, mut op: F) -> Result<T, Box<dyn Error>>
    where
        F: FnMut() -> Result<T, Box<dyn Error>>,
    {
        let mut delay = self.initial;
        let mut waited = Duration::ZERO;
        let mut attempt: u32 = 1;

        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("{what} succeeded on attempt {attempt}");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if waited + delay > self.max_total {
                        log::error!(
                            "{what} failed {attempt} time(s), waited {:.1}s, giving up: {e}",
                            waited.as_secs_f64()
                        );
                        return Err(format!(
                            "Giving up on {what} after {attempt} attempt(s) and {:.1}s of retries: {e}",
                            waited.as_secs_f64()
                        )
                        .into());
                    }
                    log::warn!(
                        "{what} failed (attempt {attempt}), retry in {:.1}s: {e}",
                        delay.as_secs_f64()
                    );
                    std::thread::sleep(delay);
                    waited += delay;
                    delay = delay.mul_f64(self.multiplier);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> Backoff {
        Backoff {
            initial: Duration::from_millis(1),
            multiplier: 1.5,
            max_total: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_default_policy() {
        let b = Backoff::default();
        assert_eq!(b.initial, Duration::from_secs(10));
        assert_eq!(b.max_total, Duration::from_secs(600));
        assert!((b.multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retry_succeeds_after_failures() {
        let mut calls = 0;
        let result = quick().retry("flaky", || {
            calls += 1;
            if calls < 3 {
                Err("throttled".into())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let mut calls = 0;
        let result: Result<(), _> = quick().retry("always failing", || {
            calls += 1;
            Err("throttled".into())
        });
        let err = result.unwrap_err().to_string();
        assert!(err.starts_with("Giving up on always failing"), "{err}");
        // delays 1, 1.5, 2.25, 3.375 => 8.125ms, next 5.06ms would pass 10ms
        assert_eq!(calls, 5);
    }
}
