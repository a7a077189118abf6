//! Fixed-shape witness allocation.
//!
//! The circuit always allocates `max_receipts` receipts of `max_fields_per_receipt` fields, plus
//! `max_storage` storage reads and `max_transactions` transactions, so the number of constraints
//! does not depend on how many real records are supplied. Unused slots are zero-valued padding
//! and are never referenced by a predicate.
use std::iter;

use eventlink_codec::{
    constants::BLOCK_NUM_BITS,
    halo2_base::{
        gates::{GateInstructions, RangeChip, RangeInstructions},
        AssignedValue, Context,
    },
    types::{
        field_elements::{
            FieldLogField, FieldReceipt, FieldStorageRead, FieldTransactionRecord,
            BITS_PER_FE_LOG_FIELD, BITS_PER_FE_STORAGE_READ, BITS_PER_FE_TRANSACTION_RECORD,
        },
        native::{LogField, Receipt, StorageRead, TransactionRecord},
    },
    utils::DummyFrom,
    Field,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{config::FieldRef, error::ConfigError};

/// Maximum number of records of each kind the circuit accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationParams {
    pub max_receipts: usize,
    pub max_fields_per_receipt: usize,
    pub max_storage: usize,
    pub max_transactions: usize,
}

impl AllocationParams {
    /// The liquidity/transfer app only ever reads receipts.
    pub const LIQUIDITY_TRANSFER: Self =
        Self { max_receipts: 64, max_fields_per_receipt: 4, max_storage: 0, max_transactions: 0 };

    pub fn covers(&self, slot: FieldRef) -> bool {
        slot.receipt < self.max_receipts && slot.field < self.max_fields_per_receipt
    }
}

/// The full witness presented to the correlation predicates. Read-only once allocated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBatch {
    params: AllocationParams,
    receipts: Vec<Receipt>,
    storage: Vec<StorageRead>,
    transactions: Vec<TransactionRecord>,
    /// Number of fields actually supplied for each real receipt. Receipts past the end are padding.
    real_fields: Vec<usize>,
}

impl CircuitBatch {
    /// Pads every record array to its maximum.
    pub fn allocate(
        params: AllocationParams,
        receipts: Vec<Receipt>,
        storage: Vec<StorageRead>,
        transactions: Vec<TransactionRecord>,
    ) -> Result<Self, ConfigError> {
        if receipts.len() > params.max_receipts {
            return Err(ConfigError::TooManyReceipts {
                actual: receipts.len(),
                max: params.max_receipts,
            });
        }
        if storage.len() > params.max_storage {
            return Err(ConfigError::TooManyStorageReads {
                actual: storage.len(),
                max: params.max_storage,
            });
        }
        if transactions.len() > params.max_transactions {
            return Err(ConfigError::TooManyTransactions {
                actual: transactions.len(),
                max: params.max_transactions,
            });
        }
        let real_fields = receipts.iter().map(|receipt| receipt.fields.len()).collect_vec();
        if let Some((receipt, &actual)) =
            real_fields.iter().find_position(|&&len| len > params.max_fields_per_receipt)
        {
            return Err(ConfigError::TooManyFields {
                receipt,
                actual,
                max: params.max_fields_per_receipt,
            });
        }

        let mut receipts = receipts;
        for receipt in receipts.iter_mut() {
            receipt.fields.resize(params.max_fields_per_receipt, LogField::default());
        }
        receipts.resize(params.max_receipts, Receipt::dummy_from(params.max_fields_per_receipt));
        let mut storage = storage;
        storage.resize(params.max_storage, StorageRead::default());
        let mut transactions = transactions;
        transactions.resize(params.max_transactions, TransactionRecord::default());

        Ok(Self { params, receipts, storage, transactions, real_fields })
    }

    pub fn from_receipts(
        params: AllocationParams,
        receipts: Vec<Receipt>,
    ) -> Result<Self, ConfigError> {
        Self::allocate(params, receipts, vec![], vec![])
    }

    pub fn params(&self) -> &AllocationParams {
        &self.params
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn storage(&self) -> &[StorageRead] {
        &self.storage
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn num_real_receipts(&self) -> usize {
        self.real_fields.len()
    }

    /// # Assumptions
    /// * `slot` is covered by the allocation
    pub fn field(&self, slot: FieldRef) -> &LogField {
        &self.receipts[slot.receipt].fields[slot.field]
    }

    pub fn block_num(&self, receipt: usize) -> u64 {
        self.receipts[receipt].block_num
    }

    /// Whether `slot` was supplied by the ingestion layer rather than padded.
    pub fn is_supplied(&self, slot: FieldRef) -> bool {
        self.real_fields.get(slot.receipt).is_some_and(|&len| slot.field < len)
    }

    /// Loads the whole batch as private witnesses, range checking every value to its width.
    /// The number of cells only depends on [AllocationParams].
    pub fn assign<F: Field>(&self, ctx: &mut Context<F>, range: &RangeChip<F>) -> AssignedBatch<F> {
        let receipts = self
            .receipts
            .iter()
            .map(|receipt| {
                let receipt = FieldReceipt::<F>::from(receipt);
                let [block_num] = load_checked(ctx, range, [receipt.block_num], [BLOCK_NUM_BITS]);
                let fields = receipt
                    .fields
                    .iter()
                    .map(|field| {
                        let cells = load_checked(ctx, range, field.flatten(), BITS_PER_FE_LOG_FIELD);
                        FieldLogField::unflatten(cells)
                    })
                    .collect_vec();
                FieldReceipt { block_num, fields }
            })
            .collect_vec();
        let storage = self
            .storage
            .iter()
            .map(|&read| {
                let read = FieldStorageRead::<F>::from(read);
                FieldStorageRead::unflatten(load_checked(
                    ctx,
                    range,
                    read.flatten(),
                    BITS_PER_FE_STORAGE_READ,
                ))
            })
            .collect_vec();
        let transactions = self
            .transactions
            .iter()
            .map(|&tx| {
                let tx = FieldTransactionRecord::<F>::from(tx);
                FieldTransactionRecord::unflatten(load_checked(
                    ctx,
                    range,
                    tx.flatten(),
                    BITS_PER_FE_TRANSACTION_RECORD,
                ))
            })
            .collect_vec();
        AssignedBatch { receipts, storage, transactions }
    }
}

/// A batch consisting only of padding, used when the witness is unknown (keygen).
impl DummyFrom<AllocationParams> for CircuitBatch {
    fn dummy_from(params: AllocationParams) -> Self {
        Self {
            params,
            receipts: vec![Receipt::dummy_from(params.max_fields_per_receipt); params.max_receipts],
            storage: vec![StorageRead::default(); params.max_storage],
            transactions: vec![TransactionRecord::default(); params.max_transactions],
            real_fields: vec![],
        }
    }
}

/// [CircuitBatch] loaded into virtual cells.
#[derive(Clone, Debug)]
pub struct AssignedBatch<F: Field> {
    pub receipts: Vec<FieldReceipt<AssignedValue<F>>>,
    pub storage: Vec<FieldStorageRead<AssignedValue<F>>>,
    pub transactions: Vec<FieldTransactionRecord<AssignedValue<F>>>,
}

impl<F: Field> AssignedBatch<F> {
    pub fn field(&self, slot: FieldRef) -> &FieldLogField<AssignedValue<F>> {
        &self.receipts[slot.receipt].fields[slot.field]
    }

    pub fn block_num(&self, receipt: usize) -> AssignedValue<F> {
        self.receipts[receipt].block_num
    }
}

/// Assigns `values` as private witnesses and constrains each to `bits[i]` bits.
fn load_checked<F: Field, const N: usize>(
    ctx: &mut Context<F>,
    range: &RangeChip<F>,
    values: [F; N],
    bits: [usize; N],
) -> [AssignedValue<F>; N] {
    let cells: [AssignedValue<F>; N] = std::array::from_fn(|i| ctx.load_witness(values[i]));
    for (&cell, num_bits) in iter::zip(&cells, bits) {
        if num_bits == 1 {
            range.gate().assert_bit(ctx, cell);
        } else {
            range.range_check(ctx, cell, num_bits);
        }
    }
    cells
}
