// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scripted and synthetic transports used in test environments.

use crate::transport::{QueryTransport, StreamSelector, TransportError};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// The canonical 32-byte hex form of a small integer.
pub fn canonical_hex(n: u64) -> String {
    format!("0x{:064x}", n)
}

/// One raw `transfersCommitteds` record with canonical identifiers.
pub fn committed_record(n: u64) -> Value {
    json!({
        "id": canonical_hex(n),
        "rootHash": canonical_hex(n * 1000),
        "destinationChainId": "42161",
        "totalAmount": (n * 1_000_000).to_string(),
        "rootCommittedAt": "1690000000",
        "transactionHash": canonical_hex(n * 7),
        "transactionIndex": 1,
        "timestamp": 1_690_000_000u64 + n,
        "blockNumber": 17_000_000u64 + n,
        "contractAddress": "0xb8901acb165ed027e32754e0ffe830802919727f",
        "token": "USDC",
    })
}

/// Wrap records into the `transfersCommitteds` response envelope.
pub fn page_of(records: Vec<Value>) -> Value {
    json!({ "transfersCommitteds": records })
}

/// Transport that replays a scripted queue of responses and errors.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<Value>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            cancel_after: Mutex::new(None),
        }
    }

    pub fn push_response(&self, data: Value) {
        self.responses.lock().unwrap().push_back(Ok(data));
    }

    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Cancel `token` once `calls` requests have been served.
    pub fn cancel_after_calls(&self, calls: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((calls, token));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded_variables(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryTransport for MockTransport {
    async fn execute(
        &self,
        _stream: &StreamSelector,
        _query: &str,
        variables: Value,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(variables);
        let served = self.call_count();
        if let Some((after, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if served >= *after {
                token.cancel();
            }
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for call {}", served))
    }
}

/// An in-memory upstream holding id-ordered records and serving them
/// with `id_gt` filtering and a page bound, like a healthy subgraph.
pub struct SyntheticUpstream {
    collection: &'static str,
    records: Vec<Value>,
    calls: Mutex<Vec<Value>>,
}

impl SyntheticUpstream {
    pub fn new(collection: &'static str, mut records: Vec<Value>) -> Self {
        records.sort_by_key(|r| r["id"].as_str().unwrap_or_default().to_string());
        Self {
            collection,
            records,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The `id_gt` bound of every request, in call order.
    pub fn recorded_cursors(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|v| v["lastId"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl QueryTransport for SyntheticUpstream {
    async fn execute(
        &self,
        _stream: &StreamSelector,
        _query: &str,
        variables: Value,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(variables.clone());

        let last_id = variables["lastId"].as_str().unwrap_or_default();
        let page_size = variables["pageSize"].as_u64().unwrap_or(0) as usize;

        let page: Vec<Value> = self
            .records
            .iter()
            .filter(|r| r["id"].as_str().unwrap_or_default() > last_id)
            .take(page_size)
            .cloned()
            .collect();

        let mut data = Map::new();
        data.insert(self.collection.to_string(), Value::Array(page));
        Ok(Value::Object(data))
    }
}
