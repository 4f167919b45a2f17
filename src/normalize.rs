// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Field-map-driven normalization of raw subgraph records.
//!
//! The upstream service returns loosely-typed JSON objects: numbers as
//! decimal strings, hex of varying width, fields appearing and
//! disappearing as the schema evolves. Each entity declares a
//! [`FieldMap`] describing how every field it cares about is
//! interpreted; [`normalize_record`] applies the map and produces a
//! [`NormalizedRecord`] with canonical values. Normalization is pure and
//! deterministic: the same raw record always yields the same result,
//! and records that are already canonical come back unchanged.

use crate::canonical::{CanonicalId, Canonicalizer};
use crate::error::{SyncError, SyncResult};
use ethers::types::U256;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// How a raw field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The record identifier. Canonicalized hex, used as the cursor.
    Id,
    /// Hash or address payload, canonicalized to fixed width.
    Hex,
    /// Decimal string parsed into a 256-bit integer. Token amounts can
    /// exceed the 53-bit safe range, so these never touch a float.
    BigInt,
    /// Non-negative integer: block number, timestamp, index.
    Integer,
    /// Kept as-is.
    Text,
}

/// One declared field of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Required fields fail normalization when absent. Optional ones
    /// default: empty string for hex/text, zero for numeric kinds.
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Declarative description of an entity's raw shape.
#[derive(Debug, Clone)]
pub struct FieldMap {
    fields: Vec<FieldSpec>,
}

impl FieldMap {
    /// Build a field map. Exactly one field must be declared as
    /// [`FieldKind::Id`], and it must be required.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let ids = fields
            .iter()
            .filter(|f| f.kind == FieldKind::Id)
            .collect::<Vec<_>>();
        assert!(
            ids.len() == 1 && ids[0].required,
            "a field map declares exactly one required identifier field"
        );
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// GraphQL selection set listing every declared field.
    pub fn selection_set(&self) -> String {
        let mut out = String::new();
        for field in &self.fields {
            out.push_str("    ");
            out.push_str(field.name);
            out.push('\n');
        }
        out
    }
}

/// A normalized field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Id(CanonicalId),
    Hex(String),
    BigInt(U256),
    Integer(u64),
    Text(String),
}

/// Normalized form of one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    values: BTreeMap<&'static str, FieldValue>,
}

impl NormalizedRecord {
    /// The record's canonical identifier.
    pub fn id(&self) -> SyncResult<CanonicalId> {
        self.values
            .values()
            .find_map(|value| match value {
                FieldValue::Id(id) => Some(id.clone()),
                _ => None,
            })
            .ok_or_else(|| SyncError::Normalization {
                field: "id".to_string(),
                reason: "record has no identifier field".to_string(),
            })
    }

    pub fn hex(&self, name: &str) -> SyncResult<String> {
        match self.get(name)? {
            FieldValue::Hex(value) => Ok(value.clone()),
            other => Err(Self::kind_mismatch(name, "hex", other)),
        }
    }

    pub fn bigint(&self, name: &str) -> SyncResult<U256> {
        match self.get(name)? {
            FieldValue::BigInt(value) => Ok(*value),
            other => Err(Self::kind_mismatch(name, "bigint", other)),
        }
    }

    pub fn integer(&self, name: &str) -> SyncResult<u64> {
        match self.get(name)? {
            FieldValue::Integer(value) => Ok(*value),
            other => Err(Self::kind_mismatch(name, "integer", other)),
        }
    }

    pub fn text(&self, name: &str) -> SyncResult<String> {
        match self.get(name)? {
            FieldValue::Text(value) => Ok(value.clone()),
            other => Err(Self::kind_mismatch(name, "text", other)),
        }
    }

    fn get(&self, name: &str) -> SyncResult<&FieldValue> {
        self.values
            .get(name)
            .ok_or_else(|| SyncError::Normalization {
                field: name.to_string(),
                reason: "field is not declared in the field map".to_string(),
            })
    }

    fn kind_mismatch(name: &str, expected: &str, got: &FieldValue) -> SyncError {
        SyncError::Normalization {
            field: name.to_string(),
            reason: format!("declared as {}, stored as {:?}", expected, got),
        }
    }
}

/// Normalize one raw record against a field map.
///
/// Declared fields absent from the record (or explicitly `null`) fail
/// when required and default otherwise; undeclared raw fields are
/// ignored so an upstream schema addition does not break the engine. A
/// malformed value in a declared field fails the record.
pub fn normalize_record(
    raw: &Map<String, Value>,
    map: &FieldMap,
    canonicalizer: &Canonicalizer,
) -> SyncResult<NormalizedRecord> {
    let mut values = BTreeMap::new();
    for spec in map.fields() {
        let raw_value = raw.get(spec.name).filter(|v| !v.is_null());
        let value = match raw_value {
            Some(v) => normalize_value(v, spec, canonicalizer)?,
            None if spec.required => {
                return Err(SyncError::Normalization {
                    field: spec.name.to_string(),
                    reason: "required field is absent".to_string(),
                })
            }
            None => default_value(spec.kind),
        };
        values.insert(spec.name, value);
    }
    Ok(NormalizedRecord { values })
}

fn default_value(kind: FieldKind) -> FieldValue {
    match kind {
        // FieldMap::new guarantees the identifier is required
        FieldKind::Id => unreachable!("identifier fields are always required"),
        FieldKind::Hex => FieldValue::Hex(String::new()),
        FieldKind::BigInt => FieldValue::BigInt(U256::zero()),
        FieldKind::Integer => FieldValue::Integer(0),
        FieldKind::Text => FieldValue::Text(String::new()),
    }
}

fn normalize_value(
    value: &Value,
    spec: &FieldSpec,
    canonicalizer: &Canonicalizer,
) -> SyncResult<FieldValue> {
    let fail = |reason: String| SyncError::Normalization {
        field: spec.name.to_string(),
        reason,
    };

    match spec.kind {
        FieldKind::Id => {
            let s = value
                .as_str()
                .ok_or_else(|| fail("expected a hex string".to_string()))?;
            let id = canonicalizer
                .canonicalize(s)
                .map_err(|e| fail(e.to_string()))?;
            Ok(FieldValue::Id(id))
        }
        FieldKind::Hex => {
            let s = value
                .as_str()
                .ok_or_else(|| fail("expected a hex string".to_string()))?;
            let id = canonicalizer
                .canonicalize(s)
                .map_err(|e| fail(e.to_string()))?;
            Ok(FieldValue::Hex(id.into_string()))
        }
        FieldKind::BigInt => {
            if let Some(s) = value.as_str() {
                let parsed = U256::from_dec_str(s.trim())
                    .map_err(|e| fail(format!("not a decimal string: {:?}", e)))?;
                Ok(FieldValue::BigInt(parsed))
            } else if let Some(n) = value.as_u64() {
                Ok(FieldValue::BigInt(U256::from(n)))
            } else {
                Err(fail(format!("expected a decimal string, got {}", value)))
            }
        }
        FieldKind::Integer => {
            if let Some(n) = value.as_u64() {
                Ok(FieldValue::Integer(n))
            } else if let Some(s) = value.as_str() {
                let parsed = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| fail(format!("not an integer: {}", e)))?;
                Ok(FieldValue::Integer(parsed))
            } else {
                Err(fail(format!(
                    "expected a non-negative integer, got {}",
                    value
                )))
            }
        }
        FieldKind::Text => {
            if let Some(s) = value.as_str() {
                Ok(FieldValue::Text(s.to_string()))
            } else if value.is_number() {
                Ok(FieldValue::Text(value.to_string()))
            } else {
                Err(fail(format!("expected a scalar, got {}", value)))
            }
        }
    }
}
