// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the sync engine.
//!
//! A single bad record fails the whole page fetch: downstream consumers
//! assume completeness, and a partial or inconsistent result set is
//! worse for them than a loud failure.

/// Error type for sync operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// A hex identifier could not be canonicalized.
    #[error("invalid identifier: {0}")]
    InvalidFormat(String),

    /// A raw record field violates its declared type.
    #[error("failed to normalize field `{field}`: {reason}")]
    Normalization { field: String, reason: String },

    /// Transport-level failure (timeout, connect, 5xx). Transient.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream rejected the query itself. Permanent.
    #[error("query rejected by upstream: {0}")]
    QueryRejected(String),

    /// The response body could not be interpreted. Transient.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No endpoint is configured for the requested chain. Permanent.
    #[error("no endpoint configured for chain `{0}`")]
    MissingEndpoint(String),

    /// The retry budget ran out on transient failures.
    #[error("retry budget exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// The upstream returned a full page whose identifiers do not
    /// strictly advance past the cursor. Looping on it would never
    /// terminate, so the call fails instead.
    #[error("upstream did not advance past cursor {cursor}")]
    OrderingViolation { cursor: String },

    /// Safety ceiling on pages per call was hit.
    #[error("page ceiling of {limit} pages exceeded")]
    PageLimitExceeded { limit: u32 },

    /// The caller's cancellation signal was observed between pages.
    #[error("cancelled after {pages} pages")]
    Cancelled { pages: u32 },
}

impl SyncError {
    /// Whether a retry of the same request can help.
    ///
    /// Only transport hiccups and garbled bodies qualify. Rejected
    /// queries and normalization failures reproduce on every attempt,
    /// and `OrderingViolation` must never be retried: re-issuing the
    /// same filter against an eventually consistent upstream can change
    /// the result under the cursor.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::MalformedResponse(_)
        )
    }

    /// Returns a short string identifying the error type for metrics labels
    pub fn error_type(&self) -> &'static str {
        match self {
            SyncError::InvalidFormat(_) => "invalid_format",
            SyncError::Normalization { .. } => "normalization",
            SyncError::Transport(_) => "transport",
            SyncError::QueryRejected(_) => "query_rejected",
            SyncError::MalformedResponse(_) => "malformed_response",
            SyncError::MissingEndpoint(_) => "missing_endpoint",
            SyncError::Exhausted { .. } => "retry_exhausted",
            SyncError::OrderingViolation { .. } => "ordering_violation",
            SyncError::PageLimitExceeded { .. } => "page_limit_exceeded",
            SyncError::Cancelled { .. } => "cancelled",
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
