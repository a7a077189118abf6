//! Correlation predicates over a [CircuitBatch].
//!
//! Every predicate has two forms that must agree: [Predicate::check] on the native batch and
//! [Predicate::constrain] over the assigned batch.
use ethers_core::types::{Address, H256, U256};
use eventlink_codec::{
    constants::{ADDRESS_WORD_PADDING_BYTES, HILO_LIMB_BITS},
    halo2_base::{
        gates::{GateInstructions, RangeChip, RangeInstructions},
        AssignedValue, Context,
        QuantumCell::Constant,
    },
    utils::native::{encode_addr_to_field, encode_h256_to_hilo, encode_u256_to_hilo, h256_to_u256},
    Field, HiLo,
};
use itertools::Itertools;

use crate::{
    allocator::{AssignedBatch, CircuitBatch},
    config::{CorrelationConfig, FieldRef},
    error::AssertionFailure,
};

/// Bits of the high limb still occupied by an address once the 12 zero padding bytes are removed.
pub const ADDRESS_HI_BITS: usize = HILO_LIMB_BITS - 8 * ADDRESS_WORD_PADDING_BYTES;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// The log containing `slot` was emitted by `contract`.
    ContractIs { slot: FieldRef, contract: Address },
    /// `slot` was read from `topics[index]` or from data word `index`.
    LocationIs { slot: FieldRef, is_topic: bool, index: u32 },
    /// The log containing `slot` has `topics[0] == event_id`.
    EventIs { slot: FieldRef, event_id: H256 },
    /// `slot` read as a big-endian `uint256` is at least `minimum`.
    AtLeast { slot: FieldRef, minimum: U256 },
    /// `a` and `b` were read from the same log of the receipt.
    SameLog { a: FieldRef, b: FieldRef },
    /// `a` and `b` carry identical 32-byte values.
    SameValue { a: FieldRef, b: FieldRef },
    /// The top 12 bytes of `slot` are zero, so its value is an address.
    AddressWord { slot: FieldRef },
}

impl Predicate {
    pub fn slots(&self) -> Vec<FieldRef> {
        match *self {
            Predicate::ContractIs { slot, .. }
            | Predicate::LocationIs { slot, .. }
            | Predicate::EventIs { slot, .. }
            | Predicate::AtLeast { slot, .. }
            | Predicate::AddressWord { slot } => vec![slot],
            Predicate::SameLog { a, b } | Predicate::SameValue { a, b } => vec![a, b],
        }
    }

    pub fn check(&self, batch: &CircuitBatch) -> Result<(), AssertionFailure> {
        match *self {
            Predicate::ContractIs { slot, contract } => {
                let actual = batch.field(slot).contract;
                if actual != contract {
                    return Err(AssertionFailure::ContractMismatch {
                        slot,
                        expected: contract,
                        actual,
                    });
                }
            }
            Predicate::LocationIs { slot, is_topic, index } => {
                let field = batch.field(slot);
                if field.is_topic != is_topic || field.index != index {
                    return Err(AssertionFailure::LocationMismatch {
                        slot,
                        expected_is_topic: is_topic,
                        expected_index: index,
                        actual_is_topic: field.is_topic,
                        actual_index: field.index,
                    });
                }
            }
            Predicate::EventIs { slot, event_id } => {
                let actual = batch.field(slot).event_id;
                if actual != event_id {
                    return Err(AssertionFailure::EventMismatch {
                        slot,
                        expected: event_id,
                        actual,
                    });
                }
            }
            Predicate::AtLeast { slot, minimum } => {
                let actual = h256_to_u256(&batch.field(slot).value);
                if actual < minimum {
                    return Err(AssertionFailure::BelowThreshold { slot, minimum, actual });
                }
            }
            Predicate::SameLog { a, b } => {
                let (a_pos, b_pos) = (batch.field(a).log_pos, batch.field(b).log_pos);
                if a_pos != b_pos {
                    return Err(AssertionFailure::LogPosMismatch { a, b, a_pos, b_pos });
                }
            }
            Predicate::SameValue { a, b } => {
                if batch.field(a).value != batch.field(b).value {
                    return Err(AssertionFailure::ValueMismatch { a, b });
                }
            }
            Predicate::AddressWord { slot } => {
                let value = batch.field(slot).value;
                if value[..ADDRESS_WORD_PADDING_BYTES].iter().any(|&byte| byte != 0) {
                    return Err(AssertionFailure::NotAnAddress { slot, value });
                }
            }
        }
        Ok(())
    }

    pub fn constrain<F: Field>(
        &self,
        ctx: &mut Context<F>,
        range: &RangeChip<F>,
        batch: &AssignedBatch<F>,
    ) {
        let gate = range.gate();
        match *self {
            Predicate::ContractIs { slot, contract } => {
                let contract = encode_addr_to_field::<F>(&contract);
                gate.assert_is_const(ctx, &batch.field(slot).contract, &contract);
            }
            Predicate::LocationIs { slot, is_topic, index } => {
                let field = batch.field(slot);
                gate.assert_is_const(ctx, &field.is_topic, &F::from(is_topic));
                gate.assert_is_const(ctx, &field.index, &F::from(index as u64));
            }
            Predicate::EventIs { slot, event_id } => {
                let expected = encode_h256_to_hilo::<F>(&event_id);
                for (cell, limb) in batch.field(slot).event_id.hi_lo().iter().zip(expected.hi_lo())
                {
                    gate.assert_is_const(ctx, cell, &limb);
                }
            }
            Predicate::AtLeast { slot, minimum } => {
                let minimum = encode_u256_to_hilo::<F>(&minimum);
                let is_at_least = hilo_is_at_least(ctx, range, batch.field(slot).value, minimum);
                gate.assert_is_const(ctx, &is_at_least, &F::ONE);
            }
            Predicate::SameLog { a, b } => {
                ctx.constrain_equal(&batch.field(a).log_pos, &batch.field(b).log_pos);
            }
            Predicate::SameValue { a, b } => {
                for (x, y) in batch.field(a).value.hi_lo().iter().zip(batch.field(b).value.hi_lo()) {
                    ctx.constrain_equal(x, &y);
                }
            }
            Predicate::AddressWord { slot } => {
                range.range_check(ctx, batch.field(slot).value.hi(), ADDRESS_HI_BITS);
            }
        }
    }
}

/// Returns a bit that is one iff `value >= minimum`, comparing the high limbs first.
/// Assumes both limbs of `value` are range checked to 128 bits.
fn hilo_is_at_least<F: Field>(
    ctx: &mut Context<F>,
    range: &RangeChip<F>,
    value: HiLo<AssignedValue<F>>,
    minimum: HiLo<F>,
) -> AssignedValue<F> {
    let gate = range.gate();
    let hi_greater = range.is_less_than(ctx, Constant(minimum.hi()), value.hi(), HILO_LIMB_BITS);
    let hi_equal = gate.is_equal(ctx, value.hi(), Constant(minimum.hi()));
    let lo_less = range.is_less_than(ctx, value.lo(), Constant(minimum.lo()), HILO_LIMB_BITS);
    let lo_at_least = gate.not(ctx, lo_less);
    let tie_at_least = gate.and(ctx, hi_equal, lo_at_least);
    gate.or(ctx, hi_greater, tie_at_least)
}

/// The full list of predicates a correlation circuit enforces. All of them must hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    predicates: Vec<Predicate>,
}

impl ConstraintSet {
    /// Expands a configuration into predicates. Each role yields at most three predicates, then
    /// colocation and linkage, then the threshold and the address output check.
    pub fn from_config(config: &CorrelationConfig) -> Self {
        let mut predicates = vec![];
        for role in &config.roles {
            let slot = role.slot;
            if let Some(contract) = role.contract {
                predicates.push(Predicate::ContractIs { slot, contract });
            }
            if let Some(event_id) = role.event_id {
                predicates.push(Predicate::EventIs { slot, event_id });
            }
            predicates.push(Predicate::LocationIs { slot, is_topic: role.is_topic, index: role.index });
        }
        predicates.extend(config.colocated.iter().map(|&[a, b]| Predicate::SameLog { a, b }));
        predicates.extend(config.linked.iter().map(|&[a, b]| Predicate::SameValue { a, b }));
        predicates.push(Predicate::AtLeast {
            slot: config.threshold.slot,
            minimum: config.threshold.minimum,
        });
        predicates.push(Predicate::AddressWord { slot: config.outputs.address });
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn slots(&self) -> Vec<FieldRef> {
        self.predicates.iter().flat_map(Predicate::slots).sorted().dedup().collect()
    }

    /// Evaluates every predicate on the native batch and collects all failures.
    pub fn evaluate(&self, batch: &CircuitBatch) -> Result<(), Vec<AssertionFailure>> {
        let failures = self
            .predicates
            .iter()
            .filter_map(|predicate| predicate.check(batch).err())
            .inspect(|failure| log::debug!("assertion failed: {failure}"))
            .collect_vec();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    pub fn constrain<F: Field>(
        &self,
        ctx: &mut Context<F>,
        range: &RangeChip<F>,
        batch: &AssignedBatch<F>,
    ) {
        for predicate in &self.predicates {
            predicate.constrain(ctx, range, batch);
        }
    }
}

impl From<Vec<Predicate>> for ConstraintSet {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }
}
