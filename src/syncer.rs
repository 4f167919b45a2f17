// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pagination driver: accumulates every page of one event stream.
//!
//! Each page's request depends on the previous page's last identifier,
//! so a single stream is inherently sequential. Across independent
//! streams the driver is freely concurrent: `fetch_all` takes `&self`,
//! owns its cursor and accumulator per call, and holds no lock across a
//! suspension point.
//!
//! ```text
//! SubgraphSyncer::fetch_all
//!     └─ loop: retry(with jitter) ─ PageFetcher ─ QueryTransport
//!              │                        └─ normalize ─ typed entities
//!              ├─ verify ascending ids, advance cursor
//!              └─ stop on short page / ceiling / cancellation
//! ```

use crate::canonical::{CanonicalId, Canonicalizer};
use crate::config::SyncerConfig;
use crate::entities::SubgraphEntity;
use crate::error::SyncError;
use crate::fetcher::PageFetcher;
use crate::metrics::SyncerMetrics;
use crate::retry;
use crate::transport::{QueryTransport, StreamSelector};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Terminal failure of one `fetch_all` call, carrying enough context
/// for the caller to resume from its own persisted cursor.
#[derive(Debug)]
pub struct SyncFailure<E> {
    pub stream: StreamSelector,
    /// Cursor of the last successfully committed page.
    pub cursor: CanonicalId,
    /// Pages committed before the failure.
    pub pages: u32,
    /// Populated only for [`SyncError::Cancelled`]: the entities
    /// accumulated before cancellation was observed. Discarded (empty)
    /// for every other error, because a partial result set must never
    /// be mistaken for a complete one.
    pub partial: Vec<E>,
    pub error: SyncError,
}

impl<E> SyncFailure<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, SyncError::Cancelled { .. })
    }
}

impl<E> fmt::Display for SyncFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sync of `{}` failed after {} pages at cursor {}: {}",
            self.stream, self.pages, self.cursor, self.error
        )
    }
}

impl<E: fmt::Debug> std::error::Error for SyncFailure<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Drives pagination over one subgraph collection at a time.
pub struct SubgraphSyncer<T> {
    transport: Arc<T>,
    config: SyncerConfig,
    metrics: Option<Arc<SyncerMetrics>>,
}

impl<T: QueryTransport> SubgraphSyncer<T> {
    pub fn new(transport: Arc<T>, config: SyncerConfig) -> Self {
        Self {
            transport,
            config,
            metrics: None,
        }
    }

    /// Attach metrics for monitoring
    pub fn with_metrics(mut self, metrics: Arc<SyncerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &SyncerConfig {
        &self.config
    }

    /// Fetch the complete, ordered result set for one stream.
    ///
    /// Starts from `start_cursor` (the canonical zero id when `None`)
    /// and pages forward until the upstream returns a page shorter than
    /// the page size, the only legitimate termination signal. A page
    /// exactly equal to the page size that happens to be the true end
    /// of data simply costs one extra round trip: the next fetch
    /// returns an empty page and terminates normally.
    ///
    /// Cancellation is honored at per-page granularity: an in-flight
    /// fetch may be aborted, no new fetch starts after cancellation is
    /// observed, and the partial result set accumulated so far is
    /// returned inside the [`SyncFailure`].
    pub async fn fetch_all<E: SubgraphEntity>(
        &self,
        stream: &StreamSelector,
        start_cursor: Option<CanonicalId>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>, SyncFailure<E>> {
        let canonicalizer = Canonicalizer::new(self.config.id_width_bytes);
        let fetcher = PageFetcher::new(
            self.transport.clone(),
            canonicalizer,
            self.config.page_size,
        );
        let mut cursor = start_cursor.unwrap_or_else(|| canonicalizer.zero());
        let mut entities: Vec<E> = Vec::new();
        let mut pages: u32 = 0;

        debug!(
            "[{}] syncing `{}` from cursor {}",
            stream,
            E::COLLECTION,
            cursor
        );

        loop {
            if cancel.is_cancelled() {
                let error = SyncError::Cancelled { pages };
                return Err(self.failure(stream, cursor, pages, entities, error));
            }
            if pages >= self.config.max_pages {
                let error = SyncError::PageLimitExceeded {
                    limit: self.config.max_pages,
                };
                return Err(self.failure(stream, cursor, pages, Vec::new(), error));
            }

            // Biased toward the fetch: a page that completed in the same
            // instant as cancellation is still committed, cancellation is
            // then observed at the top of the next iteration. A hung
            // fetch is aborted by the cancel branch.
            let started = Instant::now();
            let fetched = tokio::select! {
                biased;
                result = retry::with_retry(
                    &self.config.retry,
                    self.metrics.as_deref(),
                    E::COLLECTION,
                    || fetcher.fetch_page::<E>(stream, &cursor),
                ) => result,
                _ = cancel.cancelled() => {
                    let error = SyncError::Cancelled { pages };
                    return Err(self.failure(stream, cursor, pages, entities, error));
                }
            };
            let page = match fetched {
                Ok(page) => page,
                Err(error) => {
                    return Err(self.failure(stream, cursor, pages, Vec::new(), error))
                }
            };
            pages += 1;

            if let Some(m) = &self.metrics {
                m.pages_fetched.with_label_values(&[E::COLLECTION]).inc();
                m.records_fetched
                    .with_label_values(&[E::COLLECTION])
                    .inc_by(page.len() as u64);
                m.page_fetch_latency
                    .with_label_values(&[E::COLLECTION])
                    .observe(started.elapsed().as_secs_f64());
                m.last_page_records
                    .with_label_values(&[E::COLLECTION])
                    .set(page.len() as i64);
            }

            debug!(
                "[{}] page {}: {} records in {:?} (cursor {})",
                stream,
                pages,
                page.len(),
                started.elapsed(),
                cursor
            );

            // Ascending-by-id across the whole result set, strictly past
            // the cursor. A full page that fails to advance would loop
            // forever, and out-of-order ids mean upstream corruption
            // either way; re-sorting would only mask it.
            let mut previous = cursor.clone();
            for entity in &page {
                if *entity.id() <= previous {
                    let error = SyncError::OrderingViolation {
                        cursor: previous.into_string(),
                    };
                    return Err(self.failure(stream, cursor, pages, Vec::new(), error));
                }
                previous = entity.id().clone();
            }

            let full_page = page.len() as u32 == self.config.page_size;
            entities.extend(page);

            if !full_page {
                info!(
                    "[{}] `{}` caught up: {} records over {} pages",
                    stream,
                    E::COLLECTION,
                    entities.len(),
                    pages
                );
                return Ok(entities);
            }
            cursor = previous;
        }
    }

    fn failure<E: SubgraphEntity>(
        &self,
        stream: &StreamSelector,
        cursor: CanonicalId,
        pages: u32,
        partial: Vec<E>,
        error: SyncError,
    ) -> SyncFailure<E> {
        if let Some(m) = &self.metrics {
            m.sync_errors
                .with_label_values(&[error.error_type()])
                .inc();
        }
        warn!(
            "[{}] sync of `{}` failed after {} pages at cursor {}: {}",
            stream,
            E::COLLECTION,
            pages,
            cursor,
            error
        );
        SyncFailure {
            stream: stream.clone(),
            cursor,
            pages,
            partial,
            error,
        }
    }
}
