use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::utils::DummyFrom;

/// One decoded field of an event log.
///
/// `is_topic` and `index` locate the field inside its log: when `is_topic` is true the value is
/// `topics[index]`, otherwise it is the 32-byte chunk `data[32 * index..32 * index + 32]`.
/// They are only meaningful relative to the known layout of the event identified by `event_id`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogField {
    /// Address of the contract that emitted the log.
    pub contract: Address,
    pub is_topic: bool,
    pub index: u32,
    /// `topics[0]` of the log, i.e. the hash of the event signature.
    pub event_id: H256,
    /// Raw 32-byte value. May hold an address, a number or opaque bytes depending on the event.
    pub value: H256,
    /// Position of the log within the transaction receipt.
    pub log_pos: u32,
}

/// Decoded fields of a single transaction receipt. All fields share the block number of the
/// transaction.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub block_num: u64,
    pub fields: Vec<LogField>,
}

impl Receipt {
    pub fn new(block_num: u64, fields: Vec<LogField>) -> Self {
        Self { block_num, fields }
    }
}

/// Zero-valued receipt with `num_fields` zero-valued field slots.
impl DummyFrom<usize> for Receipt {
    fn dummy_from(num_fields: usize) -> Self {
        Self { block_num: 0, fields: vec![LogField::default(); num_fields] }
    }
}

/// A single storage slot read at a given block.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageRead {
    pub block_num: u64,
    pub address: Address,
    pub slot: H256,
    pub value: H256,
}

/// A transaction included at a given block.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub block_num: u64,
    pub hash: H256,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Which field of which log to extract from a receipt.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogFieldSelector {
    pub log_pos: u32,
    pub is_topic: bool,
    pub field_index: u32,
}

impl LogFieldSelector {
    pub fn topic(log_pos: u32, field_index: u32) -> Self {
        Self { log_pos, is_topic: true, field_index }
    }

    pub fn data(log_pos: u32, field_index: u32) -> Self {
        Self { log_pos, is_topic: false, field_index }
    }
}

/// Request handed to the ingestion layer: a transaction and the fields to decode from its logs.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub tx_hash: H256,
    pub fields: Vec<LogFieldSelector>,
}
