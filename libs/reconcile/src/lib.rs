//! Convergence primitives.
//!
//! Neither remote service confirms a mutation synchronously: an instrument
//! created in the device service shows up in the management service some
//! time later, a deleted one goes offline some time later. This library
//! provides the two helpers everything else is built from:
//!
//! - [`poll_until`]: re-run a remote check on a fixed interval until it is
//!   satisfied or a time budget runs out.
//! - [`best_effort`]: issue independent remote calls as one batch, collecting
//!   per-item failures instead of failing the batch.
//!
//! # Invariants
//!
//! - A poll never runs past its budget, even when a single check hangs
//! - A failing check counts as an unsatisfied attempt; it never aborts a poll
//! - A batch always runs every item

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Reconciliation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Timeout waiting for convergence.
    #[error(
        "timed out after {elapsed:?} ({attempts} attempts) waiting for {resource}{}",
        last_error_suffix(.last_error)
    )]
    Timeout {
        resource: String,
        elapsed: Duration,
        attempts: u32,
        /// The most recent check failure, if the last attempts were failing.
        last_error: Option<String>,
    },
}

impl ReconcileError {
    /// Number of checks made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. } => *attempts,
        }
    }
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!("; last check failed: {e}"))
        .unwrap_or_default()
}

/// Default delay between checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default budget for a poll.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between checks while an instrument starts up.
pub const DEFAULT_PROVISION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default budget for instrument startup; simulated instruments boot slowly.
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(180);

const HUNG_CHECK: &str = "check did not finish before the deadline";

/// Interval and budget for a [`poll_until`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between the end of one check and the start of the next.
    pub interval: Duration,

    /// Total time allowed before the poll fails.
    pub timeout: Duration,
}

impl PollPolicy {
    /// Create a policy.
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// The longer policy used while waiting for instruments to start.
    pub const fn provisioning() -> Self {
        Self::new(DEFAULT_PROVISION_POLL_INTERVAL, DEFAULT_PROVISION_TIMEOUT)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT)
    }
}

/// Poll a remote check until it yields a value.
///
/// `check` returns `Ok(Some(value))` when satisfied, `Ok(None)` when not yet,
/// and `Err` when the remote call itself failed. Failures are logged and
/// retried like an unsatisfied attempt.
///
/// Returns [`ReconcileError::Timeout`] once `policy.timeout` has elapsed.
pub async fn poll_until<T, E, F, Fut>(
    resource: &str,
    policy: PollPolicy,
    mut check: F,
) -> Result<T, ReconcileError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: fmt::Display,
{
    let start = Instant::now();
    let deadline = start + policy.timeout;
    let mut attempts: u32 = 0;
    let mut last_error: Option<String> = None;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());

        match tokio::time::timeout(remaining, check()).await {
            Ok(Ok(Some(value))) => {
                debug!(resource, attempts, elapsed = ?start.elapsed(), "Converged");
                return Ok(value);
            }
            Ok(Ok(None)) => {
                trace!(resource, attempts, "Not converged yet");
                last_error = None;
            }
            Ok(Err(e)) => {
                debug!(resource, attempts, error = %e, "Check failed; will retry");
                last_error = Some(e.to_string());
            }
            Err(_) => {
                debug!(resource, attempts, "Check outlived the poll budget");
                last_error = Some(HUNG_CHECK.to_string());
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ReconcileError::Timeout {
                resource: resource.to_string(),
                elapsed: now.duration_since(start),
                attempts,
                last_error,
            });
        }

        tokio::time::sleep(policy.interval.min(deadline - now)).await;
    }
}

/// Outcome of a [`best_effort`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome<K, T> {
    /// Values returned by the calls that succeeded, in input order.
    pub succeeded: Vec<T>,

    /// Items whose call failed, with the rendered error.
    pub failed: Vec<(K, String)>,
}

impl<K, T> BatchOutcome<K, T> {
    /// Total number of items in the batch.
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Returns true if the batch had no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> Default for BatchOutcome<K, T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Run one call per item concurrently and wait for all of them.
///
/// A failing call is logged and recorded in [`BatchOutcome::failed`]; it never
/// fails the batch or cancels the other calls.
pub async fn best_effort<K, I, T, E, F, Fut>(operation: &str, items: I, op: F) -> BatchOutcome<K, T>
where
    I: IntoIterator<Item = K>,
    K: Clone + fmt::Debug,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let calls = items.into_iter().map(|item| {
        let key = item.clone();
        let call = op(item);
        async move { (key, call.await) }
    });

    let mut outcome = BatchOutcome::default();
    for (key, result) in join_all(calls).await {
        match result {
            Ok(value) => outcome.succeeded.push(value),
            Err(e) => {
                warn!(operation, item = ?key, error = %e, "Best-effort call failed; continuing");
                outcome.failed.push((key, e.to_string()));
            }
        }
    }

    debug!(
        operation,
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "Batch finished"
    );
    outcome
}
