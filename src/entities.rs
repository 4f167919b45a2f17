// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed entity streams served by the bridge subgraphs.
//!
//! Every collection shares the same pagination contract; an entity type
//! declares where its records live, how they are filtered, and how each
//! raw field is interpreted. Adding a stream is one new type here: the
//! query document is generated from the field map, so there is no
//! per-call-site query string to keep in sync.

use crate::canonical::CanonicalId;
use crate::error::SyncResult;
use crate::normalize::{FieldKind, FieldMap, FieldSpec, NormalizedRecord};
use ethers::types::U256;
use std::fmt;
use std::sync::OnceLock;

/// A typed, normalized record from one subgraph collection.
///
/// The pagination driver is generic over this trait: it fetches pages
/// of `Self`, advances its cursor with [`SubgraphEntity::id`], and
/// accumulates the stream in ascending id order.
pub trait SubgraphEntity: Sized + Send + Sync + fmt::Debug + 'static {
    /// Collection name in the response envelope, e.g. `transfersCommitteds`.
    const COLLECTION: &'static str;

    /// Filter key selecting the stream within a chain, e.g. `token`.
    const GROUP_KEY: &'static str;

    /// Declarative raw shape of one record.
    fn field_map() -> &'static FieldMap;

    /// Build the typed entity from a normalized record.
    fn from_record(record: &NormalizedRecord) -> SyncResult<Self>;

    /// Canonical identifier, used for cursor advancement and ordering.
    fn id(&self) -> &CanonicalId;
}

/// A batch of transfers committed to a Merkle root on the origin rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRootCommitted {
    pub id: CanonicalId,
    pub root_hash: String,
    pub destination_chain_id: u64,
    pub total_amount: U256,
    pub root_committed_at: u64,
    pub transaction_hash: String,
    pub transaction_index: u64,
    pub timestamp: u64,
    pub block_number: u64,
    pub contract_address: String,
    pub token: String,
}

impl SubgraphEntity for TransferRootCommitted {
    const COLLECTION: &'static str = "transfersCommitteds";
    const GROUP_KEY: &'static str = "token";

    fn field_map() -> &'static FieldMap {
        static MAP: OnceLock<FieldMap> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new(vec![
                FieldSpec::required("id", FieldKind::Id),
                FieldSpec::required("rootHash", FieldKind::Hex),
                FieldSpec::required("destinationChainId", FieldKind::Integer),
                FieldSpec::required("totalAmount", FieldKind::BigInt),
                FieldSpec::optional("rootCommittedAt", FieldKind::Integer),
                FieldSpec::required("transactionHash", FieldKind::Hex),
                FieldSpec::optional("transactionIndex", FieldKind::Integer),
                FieldSpec::required("timestamp", FieldKind::Integer),
                FieldSpec::required("blockNumber", FieldKind::Integer),
                FieldSpec::optional("contractAddress", FieldKind::Text),
                FieldSpec::required("token", FieldKind::Text),
            ])
        })
    }

    fn from_record(record: &NormalizedRecord) -> SyncResult<Self> {
        Ok(Self {
            id: record.id()?,
            root_hash: record.hex("rootHash")?,
            destination_chain_id: record.integer("destinationChainId")?,
            total_amount: record.bigint("totalAmount")?,
            root_committed_at: record.integer("rootCommittedAt")?,
            transaction_hash: record.hex("transactionHash")?,
            transaction_index: record.integer("transactionIndex")?,
            timestamp: record.integer("timestamp")?,
            block_number: record.integer("blockNumber")?,
            contract_address: record.text("contractAddress")?,
            token: record.text("token")?,
        })
    }

    fn id(&self) -> &CanonicalId {
        &self.id
    }
}

/// A single transfer sent from the origin rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSent {
    pub id: CanonicalId,
    pub transfer_id: String,
    pub destination_chain_id: u64,
    pub recipient: String,
    pub amount: U256,
    pub bonder_fee: U256,
    pub index: u64,
    pub transaction_hash: String,
    pub timestamp: u64,
    pub block_number: u64,
    pub token: String,
}

impl SubgraphEntity for TransferSent {
    const COLLECTION: &'static str = "transferSents";
    const GROUP_KEY: &'static str = "token";

    fn field_map() -> &'static FieldMap {
        static MAP: OnceLock<FieldMap> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new(vec![
                FieldSpec::required("id", FieldKind::Id),
                FieldSpec::required("transferId", FieldKind::Hex),
                FieldSpec::required("destinationChainId", FieldKind::Integer),
                FieldSpec::optional("recipient", FieldKind::Text),
                FieldSpec::required("amount", FieldKind::BigInt),
                FieldSpec::optional("bonderFee", FieldKind::BigInt),
                FieldSpec::optional("index", FieldKind::Integer),
                FieldSpec::required("transactionHash", FieldKind::Hex),
                FieldSpec::required("timestamp", FieldKind::Integer),
                FieldSpec::required("blockNumber", FieldKind::Integer),
                FieldSpec::required("token", FieldKind::Text),
            ])
        })
    }

    fn from_record(record: &NormalizedRecord) -> SyncResult<Self> {
        Ok(Self {
            id: record.id()?,
            transfer_id: record.hex("transferId")?,
            destination_chain_id: record.integer("destinationChainId")?,
            recipient: record.text("recipient")?,
            amount: record.bigint("amount")?,
            bonder_fee: record.bigint("bonderFee")?,
            index: record.integer("index")?,
            transaction_hash: record.hex("transactionHash")?,
            timestamp: record.integer("timestamp")?,
            block_number: record.integer("blockNumber")?,
            token: record.text("token")?,
        })
    }

    fn id(&self) -> &CanonicalId {
        &self.id
    }
}

/// A transfer whose withdrawal was fronted by a bonder on the
/// destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalBonded {
    pub id: CanonicalId,
    pub transfer_id: String,
    pub amount: U256,
    pub transaction_hash: String,
    pub timestamp: u64,
    pub block_number: u64,
    pub token: String,
}

impl SubgraphEntity for WithdrawalBonded {
    const COLLECTION: &'static str = "withdrawalBondeds";
    const GROUP_KEY: &'static str = "token";

    fn field_map() -> &'static FieldMap {
        static MAP: OnceLock<FieldMap> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new(vec![
                FieldSpec::required("id", FieldKind::Id),
                FieldSpec::required("transferId", FieldKind::Hex),
                FieldSpec::required("amount", FieldKind::BigInt),
                FieldSpec::required("transactionHash", FieldKind::Hex),
                FieldSpec::required("timestamp", FieldKind::Integer),
                FieldSpec::required("blockNumber", FieldKind::Integer),
                FieldSpec::required("token", FieldKind::Text),
            ])
        })
    }

    fn from_record(record: &NormalizedRecord) -> SyncResult<Self> {
        Ok(Self {
            id: record.id()?,
            transfer_id: record.hex("transferId")?,
            amount: record.bigint("amount")?,
            transaction_hash: record.hex("transactionHash")?,
            timestamp: record.integer("timestamp")?,
            block_number: record.integer("blockNumber")?,
            token: record.text("token")?,
        })
    }

    fn id(&self) -> &CanonicalId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::Canonicalizer;
    use crate::normalize::normalize_record;
    use serde_json::json;

    #[test]
    fn test_transfer_root_committed_from_record() {
        let canonicalizer = Canonicalizer::default();
        let raw = json!({
            "id": "0x3",
            "rootHash": "0xABCD",
            "destinationChainId": "42161",
            "totalAmount": "123456789000000000000",
            "rootCommittedAt": "1690000100",
            "transactionHash": "0xFE",
            "transactionIndex": 12,
            "timestamp": 1690000000u64,
            "blockNumber": 17000000u64,
            "contractAddress": "0x0123",
            "token": "USDC",
        });
        let record = normalize_record(
            raw.as_object().unwrap(),
            TransferRootCommitted::field_map(),
            &canonicalizer,
        )
        .unwrap();
        let entity = TransferRootCommitted::from_record(&record).unwrap();

        assert!(entity.id.as_str().ends_with('3'));
        assert_eq!(entity.id.as_str().len(), 2 + 64);
        assert_eq!(entity.destination_chain_id, 42161);
        assert_eq!(
            entity.total_amount,
            U256::from_dec_str("123456789000000000000").unwrap()
        );
        assert_eq!(entity.token, "USDC");
        assert_eq!(entity.block_number, 17_000_000);
    }

    #[test]
    fn test_same_logical_record_normalizes_identically() {
        let canonicalizer = Canonicalizer::default();
        // the same on-chain event, once with mixed case and no padding,
        // once already canonical
        let loose = json!({
            "id": "0xA",
            "transferId": "0xBEEF",
            "destinationChainId": 10,
            "amount": "5",
            "transactionHash": "0xCC",
            "timestamp": 1,
            "blockNumber": 2,
            "token": "ETH",
        });
        let record = normalize_record(
            loose.as_object().unwrap(),
            TransferSent::field_map(),
            &canonicalizer,
        )
        .unwrap();
        let first = TransferSent::from_record(&record).unwrap();

        let canonical = json!({
            "id": first.id.as_str(),
            "transferId": first.transfer_id,
            "destinationChainId": "10",
            "amount": "5",
            "transactionHash": first.transaction_hash,
            "timestamp": "1",
            "blockNumber": "2",
            "token": "ETH",
        });
        let record = normalize_record(
            canonical.as_object().unwrap(),
            TransferSent::field_map(),
            &canonicalizer,
        )
        .unwrap();
        let second = TransferSent::from_record(&record).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_collections_are_distinct() {
        assert_ne!(
            TransferRootCommitted::COLLECTION,
            TransferSent::COLLECTION
        );
        assert_ne!(TransferSent::COLLECTION, WithdrawalBonded::COLLECTION);
    }
}
