use itertools::Itertools;

use crate::{
    types::{field_elements::*, native::*},
    utils::native::{encode_addr_to_field, encode_h256_to_hilo, encode_u256_to_hilo},
    Field,
};

impl<F: Field> From<LogField> for FieldLogField<F> {
    fn from(field: LogField) -> Self {
        Self {
            contract: encode_addr_to_field(&field.contract),
            is_topic: F::from(field.is_topic),
            index: F::from(field.index as u64),
            event_id: encode_h256_to_hilo(&field.event_id),
            value: encode_h256_to_hilo(&field.value),
            log_pos: F::from(field.log_pos as u64),
        }
    }
}

impl<F: Field> From<&Receipt> for FieldReceipt<F> {
    fn from(receipt: &Receipt) -> Self {
        Self {
            block_num: F::from(receipt.block_num),
            fields: receipt.fields.iter().map(|&field| field.into()).collect_vec(),
        }
    }
}

impl<F: Field> From<StorageRead> for FieldStorageRead<F> {
    fn from(read: StorageRead) -> Self {
        Self {
            block_num: F::from(read.block_num),
            address: encode_addr_to_field(&read.address),
            slot: encode_h256_to_hilo(&read.slot),
            value: encode_h256_to_hilo(&read.value),
        }
    }
}

impl<F: Field> From<TransactionRecord> for FieldTransactionRecord<F> {
    fn from(tx: TransactionRecord) -> Self {
        Self {
            block_num: F::from(tx.block_num),
            hash: encode_h256_to_hilo(&tx.hash),
            from: encode_addr_to_field(&tx.from),
            to: encode_addr_to_field(&tx.to),
            value: encode_u256_to_hilo(&tx.value),
        }
    }
}
