use crate::domain_port::Sleeper;
use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff used to wait for a write to become visible to reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// One extra wait and read after the attempts run out, if set.
    pub final_grace: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            final_grace: Some(Duration::from_millis(2000)),
        }
    }
}

impl RetryPolicy {
    /// Delay slept before the `attempt`-th probe (1-based): `base_delay * 2^(attempt - 1)`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Satisfied { attempts: u32, value: T },
    Exhausted { attempts: u32, last: Option<T> },
}

/// Sleeps, probes, and repeats until `done` accepts a probe result or `max_attempts` probes ran.
pub async fn poll_until<T, F, Fut, P>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut probe: F,
    done: P,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let mut last = None;
    for attempt in 1..=policy.max_attempts {
        let delay = policy.delay_before(attempt);
        tracing::debug!(attempt, ?delay, "waiting before probe");
        sleeper.sleep(delay).await;

        let value = probe().await;
        if done(&value) {
            return PollOutcome::Satisfied {
                attempts: attempt,
                value,
            };
        }
        last = Some(value);
    }

    PollOutcome::Exhausted {
        attempts: policy.max_attempts,
        last,
    }
}
