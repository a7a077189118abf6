//! The public outputs of a correlation circuit.
//!
//! Exactly one [OutputRecord] is produced per accepted batch, and only after every predicate
//! holds. It is exposed as [NUM_OUTPUT_INSTANCES] public instances in the order
//! `[block_num, address, amount_hi, amount_lo]`.
use anyhow::bail;
use ethers_core::{
    types::{Address, H256},
    utils::keccak256,
};
use eventlink_codec::{
    constants::HILO_LIMB_BITS,
    halo2_base::{
        gates::{GateInstructions, RangeChip, RangeInstructions},
        AssignedValue, Context,
        QuantumCell::Constant,
    },
    utils::native::{
        decode_field_to_addr, decode_hilo_to_h256, encode_addr_to_field, encode_h256_to_hilo,
        h256_to_address,
    },
    Field, HiLo,
};
use serde::{Deserialize, Serialize};

use crate::{
    allocator::{AssignedBatch, CircuitBatch},
    config::OutputLayout,
};

pub const NUM_OUTPUT_INSTANCES: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub block_num: u64,
    pub address: Address,
    /// Revealed as raw bytes, not reinterpreted.
    pub amount: H256,
}

impl OutputRecord {
    /// Reads the output slots from an accepted batch.
    pub fn from_batch(batch: &CircuitBatch, layout: &OutputLayout) -> Self {
        Self {
            block_num: batch.block_num(layout.block_num),
            address: h256_to_address(&batch.field(layout.address).value),
            amount: batch.field(layout.amount).value,
        }
    }

    pub fn to_instances<F: Field>(&self) -> [F; NUM_OUTPUT_INSTANCES] {
        let [amount_hi, amount_lo] = encode_h256_to_hilo::<F>(&self.amount).hi_lo();
        [F::from(self.block_num), encode_addr_to_field(&self.address), amount_hi, amount_lo]
    }

    pub fn from_instances<F: Field>(instances: &[F]) -> anyhow::Result<Self> {
        let &[block_num, address, amount_hi, amount_lo] = instances else {
            bail!("expected {NUM_OUTPUT_INSTANCES} instances, got {}", instances.len());
        };
        let block_num = block_num.get_lower_64();
        if F::from(block_num) != instances[0] {
            bail!("block number instance does not fit in 64 bits");
        }
        Ok(Self {
            block_num,
            address: decode_field_to_addr(&address),
            amount: decode_hilo_to_h256(&HiLo::from_hi_lo([amount_hi, amount_lo])),
        })
    }

    /// `block_num (8 bytes BE) || address (20 bytes) || amount (32 bytes)`
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        [&self.block_num.to_be_bytes()[..], self.address.as_bytes(), self.amount.as_bytes()].concat()
    }

    /// Keccak256 of [Self::to_packed_bytes], for consumers that take a single commitment.
    pub fn commitment(&self) -> H256 {
        H256(keccak256(self.to_packed_bytes()))
    }
}

/// Produces the assigned public outputs. The address slot must already be constrained to hold
/// an address, so that recombining its limbs stays below `2^160`.
pub fn emit_outputs<F: Field>(
    ctx: &mut Context<F>,
    range: &RangeChip<F>,
    batch: &AssignedBatch<F>,
    layout: &OutputLayout,
) -> [AssignedValue<F>; NUM_OUTPUT_INSTANCES] {
    let gate = range.gate();
    let block_num = batch.block_num(layout.block_num);
    let address = batch.field(layout.address).value;
    let address = gate.mul_add(
        ctx,
        address.hi(),
        Constant(gate.pow_of_two()[HILO_LIMB_BITS]),
        address.lo(),
    );
    let [amount_hi, amount_lo] = batch.field(layout.amount).value.hi_lo();
    [block_num, address, amount_hi, amount_lo]
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use eventlink_codec::halo2_base::halo2_proofs::halo2curves::bn256::Fr;

    use super::*;

    fn record() -> OutputRecord {
        OutputRecord {
            block_num: 5_621_487,
            address: Address::from_str("0x9d5c7d40a6f4dd9e2e4c36f8d9a2c0b1e7f3a8b2").unwrap(),
            amount: H256::from_low_u64_be(7_500_000_000),
        }
    }

    #[test]
    fn test_packed_bytes_layout() {
        let bytes = record().to_packed_bytes();
        assert_eq!(bytes.len(), 60);
        assert_eq!(bytes[..8], 5_621_487u64.to_be_bytes());
        assert_eq!(hex::encode(&bytes[8..28]), "9d5c7d40a6f4dd9e2e4c36f8d9a2c0b1e7f3a8b2");
        assert_eq!(bytes[28..], *record().amount.as_bytes());
        assert_eq!(record().commitment(), H256(keccak256(&bytes)));
    }

    #[test]
    fn test_instances() {
        let record = record();
        let instances = record.to_instances::<Fr>();
        assert_eq!(instances[0], Fr::from(5_621_487));
        assert_eq!(instances[2], Fr::from(0));
        assert_eq!(instances[3], Fr::from(7_500_000_000));
        assert_eq!(OutputRecord::from_instances(&instances).unwrap(), record);
        assert!(OutputRecord::from_instances(&instances[..3]).is_err());
    }
}
