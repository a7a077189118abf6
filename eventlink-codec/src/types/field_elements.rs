use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        ADDRESS_BITS, BLOCK_NUM_BITS, FIELD_IDX_BITS, HILO_LIMB_BITS, IS_TOPIC_BITS, LOG_POS_BITS,
    },
    HiLo,
};

pub const NUM_FE_LOG_FIELD: usize = 8;
pub const NUM_FE_STORAGE_READ: usize = 6;
pub const NUM_FE_TRANSACTION_RECORD: usize = 7;

// The following constants describe the bit width of each field element in the flattened
// encoding, in the order produced by `flatten`. Every witness is range checked against these.
pub const BITS_PER_FE_LOG_FIELD: [usize; NUM_FE_LOG_FIELD] = [
    ADDRESS_BITS,
    IS_TOPIC_BITS,
    FIELD_IDX_BITS,
    HILO_LIMB_BITS,
    HILO_LIMB_BITS,
    HILO_LIMB_BITS,
    HILO_LIMB_BITS,
    LOG_POS_BITS,
];
pub const BITS_PER_FE_STORAGE_READ: [usize; NUM_FE_STORAGE_READ] =
    [BLOCK_NUM_BITS, ADDRESS_BITS, HILO_LIMB_BITS, HILO_LIMB_BITS, HILO_LIMB_BITS, HILO_LIMB_BITS];
pub const BITS_PER_FE_TRANSACTION_RECORD: [usize; NUM_FE_TRANSACTION_RECORD] = [
    BLOCK_NUM_BITS,
    HILO_LIMB_BITS,
    HILO_LIMB_BITS,
    ADDRESS_BITS,
    ADDRESS_BITS,
    HILO_LIMB_BITS,
    HILO_LIMB_BITS,
];

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLogField<T> {
    pub contract: T, // F::CAPACITY >= 160
    pub is_topic: T,
    pub index: T,
    pub event_id: HiLo<T>,
    pub value: HiLo<T>,
    pub log_pos: T,
}

impl<T: Copy> FieldLogField<T> {
    pub fn flatten(&self) -> [T; NUM_FE_LOG_FIELD] {
        let [event_hi, event_lo] = self.event_id.hi_lo();
        let [value_hi, value_lo] = self.value.hi_lo();
        [self.contract, self.is_topic, self.index, event_hi, event_lo, value_hi, value_lo, self.log_pos]
    }

    pub fn unflatten(
        [contract, is_topic, index, event_hi, event_lo, value_hi, value_lo, log_pos]: [T;
            NUM_FE_LOG_FIELD],
    ) -> Self {
        Self {
            contract,
            is_topic,
            index,
            event_id: HiLo::from_hi_lo([event_hi, event_lo]),
            value: HiLo::from_hi_lo([value_hi, value_lo]),
            log_pos,
        }
    }
}

/// Receipt resized to a fixed number of field slots. For ZK use.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReceipt<T> {
    pub block_num: T,
    pub fields: Vec<FieldLogField<T>>,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStorageRead<T> {
    pub block_num: T,
    pub address: T, // F::CAPACITY >= 160
    pub slot: HiLo<T>,
    pub value: HiLo<T>,
}

impl<T: Copy> FieldStorageRead<T> {
    pub fn flatten(&self) -> [T; NUM_FE_STORAGE_READ] {
        let [slot_hi, slot_lo] = self.slot.hi_lo();
        let [value_hi, value_lo] = self.value.hi_lo();
        [self.block_num, self.address, slot_hi, slot_lo, value_hi, value_lo]
    }

    pub fn unflatten(
        [block_num, address, slot_hi, slot_lo, value_hi, value_lo]: [T; NUM_FE_STORAGE_READ],
    ) -> Self {
        Self {
            block_num,
            address,
            slot: HiLo::from_hi_lo([slot_hi, slot_lo]),
            value: HiLo::from_hi_lo([value_hi, value_lo]),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTransactionRecord<T> {
    pub block_num: T,
    pub hash: HiLo<T>,
    pub from: T,
    pub to: T,
    pub value: HiLo<T>,
}

impl<T: Copy> FieldTransactionRecord<T> {
    pub fn flatten(&self) -> [T; NUM_FE_TRANSACTION_RECORD] {
        let [hash_hi, hash_lo] = self.hash.hi_lo();
        let [value_hi, value_lo] = self.value.hi_lo();
        [self.block_num, hash_hi, hash_lo, self.from, self.to, value_hi, value_lo]
    }

    pub fn unflatten(
        [block_num, hash_hi, hash_lo, from, to, value_hi, value_lo]: [T;
            NUM_FE_TRANSACTION_RECORD],
    ) -> Self {
        Self {
            block_num,
            hash: HiLo::from_hi_lo([hash_hi, hash_lo]),
            from,
            to,
            value: HiLo::from_hi_lo([value_hi, value_lo]),
        }
    }
}
