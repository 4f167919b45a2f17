// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the pagination driver and retry policy.
//!
//! Everything the engine tunes is an explicit input carried here; there
//! are no implicit global defaults baked into the fetch path.

use crate::canonical::DEFAULT_ID_WIDTH_BYTES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one pagination driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncerConfig {
    /// Number of records requested per page. A page shorter than this is
    /// the termination signal.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Ceiling on pages fetched in a single call. Guards against a
    /// pathological dataset or a cursor bug looping forever.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Byte width identifiers are padded to before comparison.
    #[serde(default = "default_id_width_bytes")]
    pub id_width_bytes: usize,

    /// Retry behavior for each page fetch.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SyncerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            id_width_bytes: default_id_width_bytes(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_page_size() -> u32 {
    1000
}

fn default_max_pages() -> u32 {
    10_000
}

fn default_id_width_bytes() -> usize {
    DEFAULT_ID_WIDTH_BYTES
}

/// Retry behavior for one page fetch.
///
/// The delay sequence is exponential with jitter, starting at
/// `initial_interval` and capped at `max_interval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry.
    #[serde(default = "default_initial_interval")]
    pub initial_interval: Duration,

    /// Jitter applied to each delay, as a fraction of the interval.
    #[serde(default = "default_randomization_factor")]
    pub randomization_factor: f64,

    /// Growth factor between consecutive delays.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound on a single delay.
    #[serde(default = "default_max_interval")]
    pub max_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_interval: default_initial_interval(),
            randomization_factor: default_randomization_factor(),
            multiplier: default_multiplier(),
            max_interval: default_max_interval(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_interval() -> Duration {
    Duration::from_millis(400)
}

fn default_randomization_factor() -> f64 {
    0.1
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_interval() -> Duration {
    Duration::from_secs(120)
}
