use std::str::FromStr;

use ethers_core::types::{Address, H256, U256};
use eventlink_codec::{
    halo2_base::{
        gates::circuit::{builder::BaseCircuitBuilder, CircuitBuilderStage},
        halo2_proofs::{dev::MockProver, halo2curves::bn256::Fr},
    },
    types::native::{LogFieldSelector, Receipt, ReceiptRequest},
    utils::native::u256_to_h256,
};
use lazy_static::lazy_static;

use crate::{
    allocator::{AllocationParams, CircuitBatch},
    ingestion::{decode_receipt, JsonReceiptSource, ReceiptSource},
    CorrelationConfig, LinkCircuit, LinkCircuitParams, OutputRecord,
};

/// Acceptance, idempotence, threshold boundary and padding invariance
pub mod properties;

lazy_static! {
    static ref GOLDEN_TX: H256 =
        H256::from_str("0xb1481048a3f3b09c234049c2653ed825444a5f628f9c087e518558478e398d92")
            .unwrap();
    static ref GOLDEN_SENDER: Address =
        Address::from_str("0x9d5c7d40a6f4dd9e2e4c36f8d9a2c0b1e7f3a8b2").unwrap();
}

const GOLDEN_BLOCK: u64 = 5_621_487;
const GOLDEN_AMOUNT: u64 = 7_500_000_000;

fn golden_output() -> OutputRecord {
    OutputRecord {
        block_num: GOLDEN_BLOCK,
        address: *GOLDEN_SENDER,
        amount: H256::from_low_u64_be(GOLDEN_AMOUNT),
    }
}

/// Liquidity amount from log 1, then sender and amount of the Transfer in log 2.
fn golden_requests() -> Vec<ReceiptRequest> {
    vec![
        ReceiptRequest { tx_hash: *GOLDEN_TX, fields: vec![LogFieldSelector::data(1, 2)] },
        ReceiptRequest {
            tx_hash: *GOLDEN_TX,
            fields: vec![LogFieldSelector::topic(2, 1), LogFieldSelector::data(2, 0)],
        },
    ]
}

fn golden_source() -> JsonReceiptSource {
    JsonReceiptSource::new("data/receipts")
}

fn golden_receipts() -> Vec<Receipt> {
    let source = golden_source();
    golden_requests()
        .iter()
        .map(|request| {
            let receipt = source.receipt(request.tx_hash).unwrap();
            decode_receipt(&receipt, request).unwrap()
        })
        .collect()
}

fn circuit_from(receipts: Vec<Receipt>) -> LinkCircuit {
    circuit_with_config(CorrelationConfig::liquidity_transfer(), receipts)
}

fn circuit_with_config(config: CorrelationConfig, receipts: Vec<Receipt>) -> LinkCircuit {
    let batch = CircuitBatch::from_receipts(AllocationParams::LIQUIDITY_TRANSFER, receipts).unwrap();
    LinkCircuit::new(config, batch).unwrap()
}

fn set_amount(receipts: &mut [Receipt], amount: u64) {
    set_amount_word(receipts, amount.into());
}

/// Writes the same word into both linked amount slots.
fn set_amount_word(receipts: &mut [Receipt], amount: U256) {
    let value = u256_to_h256(&amount);
    receipts[0].fields[0].value = value;
    receipts[1].fields[1].value = value;
}

fn circuit_params() -> LinkCircuitParams {
    LinkCircuitParams::from_path("configs/circuit_params.json").unwrap()
}

/// Synthesizes without the native witness check, so that the constraints alone decide.
fn unchecked_mock_builder(circuit: &LinkCircuit) -> BaseCircuitBuilder<Fr> {
    let params = circuit_params();
    let mut builder = BaseCircuitBuilder::from_stage(CircuitBuilderStage::Mock)
        .use_k(params.k)
        .use_lookup_bits(params.lookup_bits)
        .use_instance_columns(1);
    circuit.synthesize(&mut builder);
    builder.calculate_params(Some(params.minimum_rows));
    builder
}

fn mock_verifies(builder: &BaseCircuitBuilder<Fr>, instances: Vec<Vec<Fr>>) -> bool {
    let k = builder.params().k as u32;
    MockProver::run(k, builder, instances).unwrap().verify().is_ok()
}
