// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry, HistogramVec, IntCounterVec, IntGaugeVec, Registry,
};

const PAGE_LATENCY_SEC_BUCKETS: &[f64] = &[
    0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
];

#[derive(Clone, Debug)]
pub struct SyncerMetrics {
    pub(crate) pages_fetched: IntCounterVec,
    pub(crate) records_fetched: IntCounterVec,
    pub(crate) fetch_retries: IntCounterVec,
    pub(crate) sync_errors: IntCounterVec,
    pub(crate) page_fetch_latency: HistogramVec,
    pub(crate) last_page_records: IntGaugeVec,
}

impl SyncerMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            pages_fetched: register_int_counter_vec_with_registry!(
                "subgraph_pages_fetched",
                "Total pages fetched, by collection",
                &["collection"],
                registry,
            )
            .unwrap(),
            records_fetched: register_int_counter_vec_with_registry!(
                "subgraph_records_fetched",
                "Total records normalized, by collection",
                &["collection"],
                registry,
            )
            .unwrap(),
            fetch_retries: register_int_counter_vec_with_registry!(
                "subgraph_fetch_retries",
                "Transient page-fetch failures that were retried, by collection",
                &["collection"],
                registry,
            )
            .unwrap(),
            sync_errors: register_int_counter_vec_with_registry!(
                "subgraph_sync_errors",
                "Terminal sync failures, by error type",
                &["error_type"],
                registry,
            )
            .unwrap(),
            page_fetch_latency: register_histogram_vec_with_registry!(
                "subgraph_page_fetch_latency",
                "Latency of one page fetch including retries, by collection",
                &["collection"],
                PAGE_LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            last_page_records: register_int_gauge_vec_with_registry!(
                "subgraph_last_page_records",
                "Record count of the most recent page, by collection",
                &["collection"],
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        Self::new(&Registry::new())
    }
}
