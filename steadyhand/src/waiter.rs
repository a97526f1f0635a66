//! Bounded polling wait.
//!
//! [`wait`] evaluates a [`Condition`] at a fixed interval until it holds, the
//! deadline passes, or the caller cancels. The waiter keeps no state between
//! calls and does not log; callers decide how to present its outcome.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::condition::{Condition, ProbeResult};
use crate::errors::AutomationError;

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Timeout and poll interval for one wait.
///
/// `poll_interval` must be non-zero and no longer than `timeout`. A zero
/// `timeout` means "probe exactly once"; the interval is never slept then, so
/// any non-zero interval is accepted with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    timeout: Duration,
    poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Result<Self, AutomationError> {
        if poll_interval.is_zero() {
            return Err(AutomationError::InvalidArgument(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if !timeout.is_zero() && poll_interval > timeout {
            return Err(AutomationError::InvalidArgument(format!(
                "poll interval {poll_interval:?} exceeds timeout {timeout:?}"
            )));
        }
        Ok(Self {
            timeout,
            poll_interval,
        })
    }

    /// Config with the default poll interval, shortened to fit `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let poll_interval = if timeout.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            DEFAULT_POLL_INTERVAL.min(timeout)
        };
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// How a wait ended. Timing out and being cancelled are ordinary outcomes;
/// only probe failures come back as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    Success {
        value: T,
        elapsed: Duration,
        probes: u32,
    },
    TimedOut {
        elapsed: Duration,
        /// The last non-satisfying state a probe reported, if any.
        last_state: Option<String>,
        probes: u32,
    },
    Cancelled {
        elapsed: Duration,
        probes: u32,
    },
}

impl<T> WaitOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Success { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            WaitOutcome::Success { elapsed, .. }
            | WaitOutcome::TimedOut { elapsed, .. }
            | WaitOutcome::Cancelled { elapsed, .. } => *elapsed,
        }
    }

    pub fn probes(&self) -> u32 {
        match self {
            WaitOutcome::Success { probes, .. }
            | WaitOutcome::TimedOut { probes, .. }
            | WaitOutcome::Cancelled { probes, .. } => *probes,
        }
    }

    /// Treat anything but success as an error, for call sites where a missed
    /// wait is fatal.
    pub fn into_result(self, waiting_for: &str) -> Result<T, AutomationError> {
        match self {
            WaitOutcome::Success { value, .. } => Ok(value),
            WaitOutcome::TimedOut {
                elapsed,
                last_state,
                ..
            } => Err(AutomationError::Timeout(match last_state {
                Some(state) => {
                    format!("Timed out after {elapsed:?} waiting for {waiting_for} (last seen: {state})")
                }
                None => format!("Timed out after {elapsed:?} waiting for {waiting_for}"),
            })),
            WaitOutcome::Cancelled { elapsed, .. } => Err(AutomationError::Cancelled(format!(
                "cancelled after {elapsed:?} waiting for {waiting_for}"
            ))),
        }
    }
}

/// Poll `condition` until it holds, `config.timeout()` elapses, or `cancel`
/// fires.
///
/// The condition is probed at least once, even with a zero timeout. Between
/// probes the task sleeps for the poll interval (never past the deadline), so
/// the whole call takes at most about `timeout + poll_interval`. Cancellation
/// is checked before every probe and interrupts the sleep.
pub async fn wait<C>(
    condition: &C,
    config: WaitConfig,
    cancel: &CancellationToken,
) -> Result<WaitOutcome<C::Output>, AutomationError>
where
    C: Condition + ?Sized,
{
    let start = Instant::now();
    let mut probes = 0u32;
    let mut last_state = None;

    loop {
        if cancel.is_cancelled() {
            return Ok(WaitOutcome::Cancelled {
                elapsed: start.elapsed(),
                probes,
            });
        }

        probes += 1;
        match condition.probe().await {
            Ok(ProbeResult::Satisfied(value)) => {
                return Ok(WaitOutcome::Success {
                    value,
                    elapsed: start.elapsed(),
                    probes,
                });
            }
            Ok(ProbeResult::NotYet { state }) => last_state = state,
            Err(e) if e.is_transient() => last_state = Some(e.to_string()),
            Err(e) => return Err(e),
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Ok(WaitOutcome::TimedOut {
                elapsed,
                last_state,
                probes,
            });
        }

        let nap = config.poll_interval.min(config.timeout - elapsed);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(WaitOutcome::Cancelled {
                    elapsed: start.elapsed(),
                    probes,
                });
            }
            _ = tokio::time::sleep(nap) => {}
        }
    }
}

/// [`wait`], with timeouts and cancellation turned into errors.
pub async fn wait_until<C>(
    condition: &C,
    config: WaitConfig,
    cancel: &CancellationToken,
) -> Result<C::Output, AutomationError>
where
    C: Condition + ?Sized,
{
    wait(condition, config, cancel)
        .await?
        .into_result(&condition.describe())
}
