// Bctl
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Retry and polling helpers.
//!
//! `retry_with_backoff` is for callers that want tolerance of transient
//! external-command failures, e.g. a cluster tool racing with control-plane
//! startup. Nothing in the upgrade path uses it: downgrade detection, bad
//! version strings and failed validations are permanent.
//!
//! `poll_until` backs the node/pod readiness waits.

use crate::error::{BctlError, Result};
use std::fmt::Display;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Backoff settings for [`retry_with_backoff`]
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sleep after the `attempt`-th failure (1-based): `min(2^attempt * initial, max)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // 2^31 seconds is already far past any sane cap
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Run `task` until it succeeds or `config.max_attempts` consecutive failures
/// have been seen. Blocks the calling thread while sleeping.
pub fn retry_with_backoff<T, E, F>(config: &RetryConfig, operation_name: &str, mut task: F) -> Result<T>
where
    F: FnMut() -> std::result::Result<T, E>,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match task() {
            Ok(value) => return Ok(value),
            Err(e) => {
                info!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    "task failed, retrying"
                );
                if attempt >= max_attempts {
                    warn!(operation = %operation_name, attempts = max_attempts, "giving up");
                    return Err(BctlError::RetryExhausted {
                        attempts: max_attempts,
                        last: e.to_string(),
                    });
                }
                thread::sleep(config.delay_for_attempt(attempt));
            }
        }
    }
}

/// Retry with the default 1s..1min exponential schedule.
pub fn retry_with_exponential_backoff<T, E, F>(max_attempts: u32, task: F) -> Result<T>
where
    F: FnMut() -> std::result::Result<T, E>,
    E: Display,
{
    retry_with_backoff(&RetryConfig::new(max_attempts), "task", task)
}

/// Poll `check` every `interval` until it reports `true` or `timeout` elapses.
///
/// Errors from `check` are logged and treated as "not yet", the cluster is
/// expected to be unreachable for part of the wait.
pub fn poll_until<F>(timeout: Duration, interval: Duration, what: &str, mut check: F) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match check() {
            Ok(true) => {
                debug!(what = %what, attempts, elapsed_secs = start.elapsed().as_secs(), "condition met");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => debug!(what = %what, error = %e, "check failed, will retry"),
        }

        if start.elapsed() >= timeout {
            return Err(BctlError::Timeout(format!(
                "waiting for {} after {}s ({} attempts)",
                what,
                timeout.as_secs(),
                attempts
            )));
        }
        thread::sleep(interval);
    }
}
