//! Boundary with the chain-data layer.
//!
//! Fetching receipts is someone else's job: a [ReceiptSource] hands over full transaction
//! receipts and this module decodes the requested log fields into the native types the
//! allocator consumes. Errors are propagated as-is and never retried here.
use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use ethers_core::types::{TransactionReceipt, H256};
use eventlink_codec::types::native::{LogField, LogFieldSelector, Receipt, ReceiptRequest};

use crate::{
    allocator::{AllocationParams, CircuitBatch},
    error::{IngestionError, LinkError},
};

pub trait ReceiptSource {
    fn receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, IngestionError>;
}

/// Reads receipts from `<dir>/<tx_hash>.json`, in the JSON-RPC `eth_getTransactionReceipt` format.
#[derive(Clone, Debug)]
pub struct JsonReceiptSource {
    dir: PathBuf,
}

impl JsonReceiptSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self, tx_hash: H256) -> PathBuf {
        self.dir.join(format!("{tx_hash:?}.json"))
    }
}

impl ReceiptSource for JsonReceiptSource {
    fn receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, IngestionError> {
        let path = self.path(tx_hash);
        if !path.is_file() {
            return Err(IngestionError::MissingReceipt(tx_hash));
        }
        let receipt: TransactionReceipt = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        if receipt.transaction_hash != tx_hash {
            return Err(IngestionError::HashMismatch {
                requested: tx_hash,
                actual: receipt.transaction_hash,
            });
        }
        Ok(receipt)
    }
}

impl ReceiptSource for HashMap<H256, TransactionReceipt> {
    fn receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, IngestionError> {
        self.get(&tx_hash).cloned().ok_or(IngestionError::MissingReceipt(tx_hash))
    }
}

/// Extracts one field: `topics[field_index]` or data word `field_index` of log `log_pos`.
pub fn decode_field(
    receipt: &TransactionReceipt,
    selector: LogFieldSelector,
) -> Result<LogField, IngestionError> {
    let LogFieldSelector { log_pos, is_topic, field_index } = selector;
    let log = receipt
        .logs
        .get(log_pos as usize)
        .ok_or(IngestionError::LogOutOfRange { log_pos, num_logs: receipt.logs.len() })?;
    let event_id = *log.topics.first().ok_or(IngestionError::MissingEventId { log_pos })?;
    let value = if is_topic {
        *log.topics.get(field_index as usize).ok_or(IngestionError::TopicOutOfRange {
            log_pos,
            index: field_index,
            num_topics: log.topics.len(),
        })?
    } else {
        let start = 32 * field_index as usize;
        let word = log.data.get(start..start + 32).ok_or(IngestionError::DataOutOfRange {
            log_pos,
            index: field_index,
            data_len: log.data.len(),
        })?;
        H256::from_slice(word)
    };
    Ok(LogField { contract: log.address, is_topic, index: field_index, event_id, value, log_pos })
}

pub fn decode_receipt(
    receipt: &TransactionReceipt,
    request: &ReceiptRequest,
) -> Result<Receipt, IngestionError> {
    let block_num = receipt
        .block_number
        .ok_or(IngestionError::MissingBlockNumber(receipt.transaction_hash))?
        .as_u64();
    let fields = request
        .fields
        .iter()
        .map(|&selector| decode_field(receipt, selector))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Receipt::new(block_num, fields))
}

/// Fetches and decodes one receipt per request, in order, then allocates the batch.
pub fn fetch_batch(
    source: &impl ReceiptSource,
    requests: &[ReceiptRequest],
    params: AllocationParams,
) -> Result<CircuitBatch, LinkError> {
    let receipts = requests
        .iter()
        .map(|request| {
            let receipt = source.receipt(request.tx_hash)?;
            decode_receipt(&receipt, request)
        })
        .collect::<Result<Vec<_>, IngestionError>>()?;
    log::debug!("decoded {} receipts", receipts.len());
    Ok(CircuitBatch::from_receipts(params, receipts)?)
}
