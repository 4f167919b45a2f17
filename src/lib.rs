// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exhaustive, paginated retrieval of bridge events from subgraph
//! endpoints.
//!
//! Bridge subgraphs expose append-only, id-ordered event collections
//! behind a bounded, filterable query interface. This crate assembles a
//! complete, correctly ordered, de-duplicated result set out of them:
//!
//! ```text
//!  SubgraphSyncer (driver)
//!      │ per page, with bounded retry + jitter
//!      ▼
//!  PageFetcher ──► QueryTransport (HTTP GraphQL, opaque, unreliable)
//!      │ raw records
//!      ▼
//!  normalize (field-map driven) ──► typed entities, canonical ids
//! ```
//!
//! The upstream cursor is a string-typed identifier whose *string*
//! ordering only matches numeric ordering at fixed width, so every id
//! passes through the canonicalizer before it is compared or sent back
//! as an `id_gt` bound. The driver holds no state between calls, is
//! safe to invoke concurrently across independent streams, and honors
//! cancellation at per-page granularity.

pub mod canonical;
pub mod config;
pub mod entities;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod normalize;
pub mod retry;
pub mod syncer;
pub mod transport;

#[cfg(test)]
pub mod test_utils;
