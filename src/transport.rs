// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport seam to the upstream query service.
//!
//! The engine treats the transport as opaque and unreliable: it hands
//! over a query document plus variables and gets back a parsed JSON
//! body or a tagged error. Retrying is never done here; the retry
//! policy owns that decision.

use crate::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Identifies one logical event stream: the chain whose subgraph is
/// queried and the token the records are filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamSelector {
    pub chain: String,
    pub token: String,
}

impl StreamSelector {
    pub fn new(chain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            token: token.into(),
        }
    }
}

impl fmt::Display for StreamSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chain, self.token)
    }
}

/// Transport-level failure, tagged by whether a retry can help.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("no endpoint configured for chain `{0}`")]
    MissingEndpoint(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_)
                | TransportError::Connect(_)
                | TransportError::Server { .. }
                | TransportError::InvalidJson(_)
        )
    }
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_)
            | TransportError::Connect(_)
            | TransportError::Server { .. } => SyncError::Transport(err.to_string()),
            TransportError::InvalidJson(message) => SyncError::MalformedResponse(message),
            TransportError::Rejected { .. } | TransportError::Query(_) => {
                SyncError::QueryRejected(err.to_string())
            }
            TransportError::MissingEndpoint(chain) => SyncError::MissingEndpoint(chain),
        }
    }
}

/// Executes one query document against the upstream service.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Run `query` with `variables` against the endpoint serving
    /// `stream` and return the parsed `data` body.
    async fn execute(
        &self,
        stream: &StreamSelector,
        query: &str,
        variables: Value,
    ) -> Result<Value, TransportError>;
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

/// GraphQL-over-HTTP transport with one endpoint per chain.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoints: HashMap<String, String>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        fn shared_http_client() -> reqwest::Client {
            static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
            CLIENT
                .get_or_init(|| {
                    reqwest::Client::builder()
                        .pool_max_idle_per_host(64)
                        .tcp_keepalive(Some(Duration::from_secs(30)))
                        .connect_timeout(Duration::from_secs(2))
                        .timeout(Duration::from_secs(30))
                        .build()
                        .expect("Failed to build reqwest client")
                })
                .clone()
        }

        Self {
            http_client: shared_http_client(),
            endpoints: HashMap::new(),
        }
    }

    /// Register the subgraph endpoint serving a chain.
    pub fn with_endpoint(mut self, chain: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(chain.into(), url.into());
        self
    }

    fn endpoint(&self, chain: &str) -> Result<&str, TransportError> {
        self.endpoints
            .get(chain)
            .map(String::as_str)
            .ok_or_else(|| TransportError::MissingEndpoint(chain.to_string()))
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn execute(
        &self,
        stream: &StreamSelector,
        query: &str,
        variables: Value,
    ) -> Result<Value, TransportError> {
        let url = self.endpoint(&stream.chain)?;

        let response = self
            .http_client
            .post(url)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    TransportError::Timeout(err.to_string())
                } else {
                    TransportError::Connect(err.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::InvalidJson(err.to_string()))?;

        if status.is_server_error() {
            return Err(TransportError::Server {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphqlResponse = serde_json::from_str(&body)
            .map_err(|err| TransportError::InvalidJson(err.to_string()))?;

        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                let messages: Vec<String> =
                    errors.into_iter().map(|e| e.message).collect();
                return Err(TransportError::Query(messages.join("; ")));
            }
        }

        envelope
            .data
            .ok_or_else(|| TransportError::InvalidJson("envelope has no data".to_string()))
    }
}
