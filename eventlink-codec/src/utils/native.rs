use ethers_core::types::{Address, H256, U256};
use halo2_base::utils::ScalarField;

use crate::{constants::ADDRESS_BYTES, Field, HiLo};

/// Takes `hash` as `bytes32` and returns `(hash[..16], hash[16..])` represented as big endian numbers in the prime field
pub fn encode_h256_to_hilo<F: Field>(hash: &H256) -> HiLo<F> {
    let hash_lo = u128::from_be_bytes(hash[16..].try_into().unwrap());
    let hash_hi = u128::from_be_bytes(hash[..16].try_into().unwrap());
    HiLo::from_lo_hi([hash_lo, hash_hi].map(F::from_u128))
}

pub fn encode_u256_to_hilo<F: Field>(input: &U256) -> HiLo<F> {
    let mut bytes = [0u8; 32];
    input.to_big_endian(&mut bytes);
    encode_h256_to_hilo(&H256(bytes))
}

pub fn encode_addr_to_field<F: Field>(input: &Address) -> F {
    F::from_u64_digits(&U256::from_big_endian(input.as_bytes()).0)
}

/// Inverse of [encode_h256_to_hilo]. Assumes both halves are less than `2^128`.
pub fn decode_hilo_to_h256<F: Field>(hilo: &HiLo<F>) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(&lower_u128(&hilo.hi()).to_be_bytes());
    bytes[16..].copy_from_slice(&lower_u128(&hilo.lo()).to_be_bytes());
    H256(bytes)
}

/// Inverse of [encode_addr_to_field]. Assumes `fe` is less than `2^160`.
pub fn decode_field_to_addr<F: Field>(fe: &F) -> Address {
    let mut bytes = fe.to_bytes_le();
    bytes.truncate(ADDRESS_BYTES);
    bytes.reverse();
    Address::from_slice(&bytes)
}

pub fn h256_to_u256(word: &H256) -> U256 {
    U256::from_big_endian(word.as_bytes())
}

pub fn u256_to_h256(value: &U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256(bytes)
}

/// Reads an address from the low 20 bytes of a 32-byte word, the way ABI-encoded
/// topics and data words carry addresses.
pub fn h256_to_address(word: &H256) -> Address {
    Address::from_slice(&word[32 - ADDRESS_BYTES..])
}

pub fn address_to_h256(address: &Address) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[32 - ADDRESS_BYTES..].copy_from_slice(address.as_bytes());
    H256(bytes)
}

fn lower_u128<F: ScalarField>(fe: &F) -> u128 {
    let bytes = fe.to_bytes_le();
    u128::from_le_bytes(bytes[..16].try_into().unwrap())
}
