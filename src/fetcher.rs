// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Single-page fetch: one bounded, filtered, id-ordered query.
//!
//! The filter is "identifier strictly greater than the cursor",
//! ordered ascending by identifier and limited to the page size, so
//! each page picks up exactly where the previous one ended. Transport
//! failures surface untouched; retrying is the driver's concern.

use crate::canonical::{CanonicalId, Canonicalizer};
use crate::entities::SubgraphEntity;
use crate::error::{SyncError, SyncResult};
use crate::normalize::normalize_record;
use crate::transport::{QueryTransport, StreamSelector};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct PageFetcher<T> {
    transport: Arc<T>,
    canonicalizer: Canonicalizer,
    page_size: u32,
}

impl<T: QueryTransport> PageFetcher<T> {
    pub fn new(transport: Arc<T>, canonicalizer: Canonicalizer, page_size: u32) -> Self {
        Self {
            transport,
            canonicalizer,
            page_size,
        }
    }

    /// The query document for one entity stream, with the selection set
    /// generated from the entity's field map.
    pub fn query_document<E: SubgraphEntity>() -> String {
        let mut doc = String::new();
        doc.push_str("query Page($filterValue: String, $lastId: ID, $pageSize: Int) {\n");
        doc.push_str(&format!("  {}(\n", E::COLLECTION));
        doc.push_str(&format!(
            "    where: {{ {}: $filterValue, id_gt: $lastId }},\n",
            E::GROUP_KEY
        ));
        doc.push_str("    orderBy: id,\n");
        doc.push_str("    orderDirection: asc,\n");
        doc.push_str("    first: $pageSize\n");
        doc.push_str("  ) {\n");
        doc.push_str(&E::field_map().selection_set());
        doc.push_str("  }\n");
        doc.push_str("}\n");
        doc
    }

    /// Fetch and normalize one page after `cursor`, preserving
    /// server-returned order. A single malformed record fails the page.
    pub async fn fetch_page<E: SubgraphEntity>(
        &self,
        stream: &StreamSelector,
        cursor: &CanonicalId,
    ) -> SyncResult<Vec<E>> {
        let query = Self::query_document::<E>();
        let variables = json!({
            "filterValue": stream.token,
            "lastId": cursor.as_str(),
            "pageSize": self.page_size,
        });

        let data = self.transport.execute(stream, &query, variables).await?;

        let records = data
            .get(E::COLLECTION)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SyncError::MalformedResponse(format!(
                    "response has no `{}` collection",
                    E::COLLECTION
                ))
            })?;

        if records.len() as u64 > u64::from(self.page_size) {
            return Err(SyncError::MalformedResponse(format!(
                "asked for {} records, got {}",
                self.page_size,
                records.len()
            )));
        }

        let mut page = Vec::with_capacity(records.len());
        for raw in records {
            let object = raw.as_object().ok_or_else(|| {
                SyncError::MalformedResponse("record is not an object".to_string())
            })?;
            let normalized = normalize_record(object, E::field_map(), &self.canonicalizer)?;
            page.push(E::from_record(&normalized)?);
        }
        Ok(page)
    }
}
