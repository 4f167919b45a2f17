// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry with exponential backoff for page fetches.
//!
//! One page fetch moves through
//! `Attempting -> { Success,
//!                  TransientFailure -> Attempting (budget remains),
//!                  TransientFailure -> Exhausted,
//!                  PermanentFailure -> Failed }`.
//! A page that was fetched successfully is never re-fetched out of
//! suspicion about its content: against an eventually consistent
//! upstream, re-issuing the same filter can change the result under the
//! cursor. Content checks are the driver's job.

use crate::config::RetryConfig;
use crate::error::{SyncError, SyncResult};
use crate::metrics::SyncerMetrics;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use tracing::debug;

/// Run one page fetch with bounded retry on transient failures.
///
/// Permanent failures (rejected queries, normalization errors) return
/// immediately. Transient ones retry up to `config.max_retries` times
/// with exponential backoff and jitter, then fail with
/// [`SyncError::Exhausted`].
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    metrics: Option<&SyncerMetrics>,
    label: &str,
    mut attempt_fn: F,
) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: config.initial_interval,
        randomization_factor: config.randomization_factor,
        multiplier: config.multiplier,
        max_interval: config.max_interval,
        max_elapsed_time: None,
        ..Default::default()
    };
    let mut failed_attempts: u32 = 0;

    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                failed_attempts += 1;
                if failed_attempts > config.max_retries {
                    return Err(SyncError::Exhausted {
                        attempts: failed_attempts,
                        last_error: err.to_string(),
                    });
                }
                if let Some(m) = metrics {
                    m.fetch_retries.with_label_values(&[label]).inc();
                }
                let delay = backoff.next_backoff().unwrap_or(config.max_interval);
                debug!(
                    "[{}] transient failure ({}/{} retries used), retrying in {:?}: {}",
                    label, failed_attempts, config.max_retries, delay, err
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
