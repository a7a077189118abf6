//! Error types for batch allocation, witness checking and ingestion.

use ethers_core::types::{Address, H256, U256};
use thiserror::Error;

use crate::config::FieldRef;

/// Raised before any constraint is evaluated. Fatal to circuit construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{actual} receipts supplied but the circuit allocates {max}")]
    TooManyReceipts { actual: usize, max: usize },

    #[error("receipt {receipt} has {actual} fields but the circuit allocates {max} per receipt")]
    TooManyFields { receipt: usize, actual: usize, max: usize },

    #[error("{actual} storage reads supplied but the circuit allocates {max}")]
    TooManyStorageReads { actual: usize, max: usize },

    #[error("{actual} transactions supplied but the circuit allocates {max}")]
    TooManyTransactions { actual: usize, max: usize },

    #[error("{slot} is outside the allocated batch")]
    SlotOutOfBounds { slot: FieldRef },

    #[error("{slot} is referenced but has no field role pinning its location")]
    UnpinnedSlot { slot: FieldRef },

    #[error("{slot} is referenced but no field selector supplied it")]
    MissingField { slot: FieldRef },

    #[error("batch was allocated for a different circuit shape")]
    AllocationMismatch,

    #[error("unsupported configuration version {version}, expected {supported}")]
    UnsupportedVersion { version: u32, supported: u32 },

    #[error("prover stage requires pinned circuit params and break points")]
    MissingPinning,
}

/// A single correlation predicate that does not hold for the supplied witness.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssertionFailure {
    #[error("{slot}: emitted by {actual:?}, expected {expected:?}")]
    ContractMismatch { slot: FieldRef, expected: Address, actual: Address },

    #[error(
        "{slot}: located at (is_topic: {actual_is_topic}, index: {actual_index}), expected (is_topic: {expected_is_topic}, index: {expected_index})"
    )]
    LocationMismatch {
        slot: FieldRef,
        expected_is_topic: bool,
        expected_index: u32,
        actual_is_topic: bool,
        actual_index: u32,
    },

    #[error("{slot}: event {actual:?}, expected {expected:?}")]
    EventMismatch { slot: FieldRef, expected: H256, actual: H256 },

    #[error("{slot}: value {actual} is below the minimum {minimum}")]
    BelowThreshold { slot: FieldRef, minimum: U256, actual: U256 },

    #[error("{a} and {b} come from different logs ({a_pos} != {b_pos})")]
    LogPosMismatch { a: FieldRef, b: FieldRef, a_pos: u32, b_pos: u32 },

    #[error("{a} and {b} carry different values")]
    ValueMismatch { a: FieldRef, b: FieldRef },

    #[error("{slot}: value {value:?} does not hold an address")]
    NotAnAddress { slot: FieldRef, value: H256 },
}

/// Malformed or unresolvable chain data from the ingestion layer.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("no receipt found for transaction {0:?}")]
    MissingReceipt(H256),

    #[error("receipt for {requested:?} is for transaction {actual:?}")]
    HashMismatch { requested: H256, actual: H256 },

    #[error("receipt for {0:?} is not included in a block")]
    MissingBlockNumber(H256),

    #[error("log {log_pos} requested but the receipt has {num_logs} logs")]
    LogOutOfRange { log_pos: u32, num_logs: usize },

    #[error("log {log_pos} has no topics so it has no event id")]
    MissingEventId { log_pos: u32 },

    #[error("topic {index} of log {log_pos} requested but the log has {num_topics} topics")]
    TopicOutOfRange { log_pos: u32, index: u32, num_topics: usize },

    #[error("data word {index} of log {log_pos} requested but the log has {data_len} data bytes")]
    DataOutOfRange { log_pos: u32, index: u32, data_len: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The only failure signal of the circuit pipeline: no output is produced.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid circuit configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("witness invalid: {} assertion(s) failed", .0.len())]
    WitnessInvalid(Vec<AssertionFailure>),

    #[error("ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),
}

impl LinkError {
    /// Failed assertions, if the witness was rejected by the correlation predicates.
    pub fn assertion_failures(&self) -> &[AssertionFailure] {
        match self {
            LinkError::WitnessInvalid(failures) => failures,
            _ => &[],
        }
    }
}
