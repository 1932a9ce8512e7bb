//! Retry of bucket writes.
//!
//! Only used when the caller opts into `RetryPolicy::Exponential`; the default
//! policy runs the write once and returns whatever it produced.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

use crate::config::RetryPolicy;
use crate::error_handling::{is_retriable_store_error, StoreError};

/// Backoff delays for the retries (not the first attempt) of `policy`.
pub(crate) fn retry_strategy(
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
) -> impl Iterator<Item = Duration> {
    // from_millis(2).factor(f) yields 2f, 4f, 8f, ...
    let factor = u64::try_from(base_delay.as_millis() / 2)
        .unwrap_or(u64::MAX)
        .max(1);
    ExponentialBackoff::from_millis(2)
        .factor(factor)
        .max_delay(max_delay)
        .take(max_attempts.saturating_sub(1))
}

/// Runs `action` under `policy`, retrying transient database errors.
pub(crate) async fn with_retry<T, A, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut action: A,
) -> Result<T, StoreError>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let RetryPolicy::Exponential {
        max_attempts,
        base_delay,
        max_delay,
    } = policy
    else {
        return action().await;
    };

    let strategy = retry_strategy(*max_attempts, *base_delay, *max_delay);
    RetryIf::spawn(strategy, action, |e: &StoreError| {
        let retriable = is_retriable_store_error(e);
        if retriable {
            log::warn!("Retrying write of {label} after transient error: {e}");
        }
        retriable
    })
    .await
}
