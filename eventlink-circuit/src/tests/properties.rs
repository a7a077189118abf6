use eventlink_codec::{
    halo2_base::halo2_proofs::{
        halo2curves::bn256::Bn256,
        plonk::{keygen_pk, keygen_vk},
        poly::kzg::commitment::ParamsKZG,
    },
    types::native::LogField,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use test_case::test_case;
use test_log::test;

use super::*;
use crate::{
    config::{FieldRef, MINIMUM_LIQUIDITY, TRANSFER_AMOUNT_SLOT},
    emitter::NUM_OUTPUT_INSTANCES,
    error::{AssertionFailure, ConfigError, IngestionError, LinkError},
    ingestion::fetch_batch,
    LinkCircuitPinning,
};

#[test]
fn test_golden_transaction() -> anyhow::Result<()> {
    let batch =
        fetch_batch(&golden_source(), &golden_requests(), AllocationParams::LIQUIDITY_TRANSFER)?;
    let circuit = LinkCircuit::new(CorrelationConfig::liquidity_transfer(), batch)?;
    let output = circuit.witness()?;
    assert_eq!(output, golden_output());

    let builder = circuit.create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None)?;
    let instances = LinkCircuit::instances(&builder);
    assert_eq!(instances, vec![output.to_instances::<Fr>().to_vec()]);
    assert_eq!(OutputRecord::from_instances(&instances[0])?, output);
    let k = builder.params().k as u32;
    MockProver::run(k, &builder, instances).unwrap().assert_satisfied();
    Ok(())
}

#[test]
fn test_outputs_are_constrained() {
    let circuit = circuit_from(golden_receipts());
    let builder = circuit
        .create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None)
        .unwrap();
    for i in 0..NUM_OUTPUT_INSTANCES {
        let mut instances = golden_output().to_instances::<Fr>().to_vec();
        instances[i] += Fr::from(1);
        assert!(!mock_verifies(&builder, vec![instances]), "output {i} is not constrained");
    }
}

#[test]
fn test_witness_is_idempotent() {
    let circuit = circuit_from(golden_receipts());
    let first = circuit.witness().unwrap();
    assert_eq!(circuit.witness().unwrap(), first);

    let a = circuit.create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None).unwrap();
    let b = circuit.create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None).unwrap();
    assert_eq!(LinkCircuit::instances(&a), LinkCircuit::instances(&b));
}

#[test]
fn test_threshold_boundary() {
    let mut receipts = golden_receipts();
    set_amount(&mut receipts, MINIMUM_LIQUIDITY);
    let output = circuit_from(receipts.clone()).witness().unwrap();
    assert_eq!(output.amount, H256::from_low_u64_be(MINIMUM_LIQUIDITY));
    let builder = circuit_from(receipts.clone())
        .create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None)
        .unwrap();
    assert!(mock_verifies(&builder, LinkCircuit::instances(&builder)));

    set_amount(&mut receipts, MINIMUM_LIQUIDITY - 1);
    let err = circuit_from(receipts).witness().unwrap_err();
    assert!(matches!(err.assertion_failures(), [AssertionFailure::BelowThreshold { .. }]));
}

fn word(hi: u128, lo: u128) -> U256 {
    (U256::from(hi) << 128) | U256::from(lo)
}

const MIN_LO: u128 = MINIMUM_LIQUIDITY as u128;

#[test_case(word(1, 1), word(0, MIN_LO), true; "high half outweighs a smaller low half")]
#[test_case(word(1, MIN_LO - 1), word(1, MIN_LO), false; "equal high halves compare low halves")]
#[test_case(word(1, MIN_LO), word(1, MIN_LO), true; "equal words")]
#[test_case(word(0, u128::MAX), word(1, 0), false; "low half cannot make up for the high half")]
#[test_case(word(2, 0), word(1, u128::MAX), true; "larger high half with zero low half")]
fn test_threshold_compares_both_halves(amount: U256, minimum: U256, accepted: bool) {
    let mut receipts = golden_receipts();
    set_amount_word(&mut receipts, amount);
    let mut config = CorrelationConfig::liquidity_transfer();
    config.threshold.minimum = minimum;
    let circuit = circuit_with_config(config, receipts);

    match circuit.witness() {
        Ok(output) => {
            assert!(accepted);
            assert_eq!(output.amount, u256_to_h256(&amount));
        }
        Err(err) => {
            assert!(!accepted);
            assert!(matches!(err.assertion_failures(), [AssertionFailure::BelowThreshold { .. }]));
        }
    }

    let builder = unchecked_mock_builder(&circuit);
    let instances = LinkCircuit::instances(&builder);
    assert_eq!(mock_verifies(&builder, instances), accepted);
}

fn random_receipt(rng: &mut impl Rng) -> Receipt {
    let fields = (0..rng.gen_range(0..=4))
        .map(|_| LogField {
            contract: Address::from(rng.gen::<[u8; 20]>()),
            is_topic: rng.gen(),
            index: rng.gen(),
            event_id: H256::from(rng.gen::<[u8; 32]>()),
            value: H256::from(rng.gen::<[u8; 32]>()),
            log_pos: rng.gen(),
        })
        .collect();
    Receipt::new(rng.gen(), fields)
}

#[test]
fn test_padding_does_not_change_outputs() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xe7e7);
    let baseline = circuit_from(golden_receipts());
    let baseline_params = baseline
        .create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None)
        .unwrap()
        .params();

    for _ in 0..3 {
        let mut receipts = golden_receipts();
        let extra = rng.gen_range(1..=62);
        receipts.extend((0..extra).map(|_| random_receipt(&mut rng)));
        let circuit = circuit_from(receipts);
        assert_eq!(circuit.witness().unwrap(), golden_output());

        let builder =
            circuit.create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None).unwrap();
        let params = builder.params();
        assert_eq!(params.num_advice_per_phase, baseline_params.num_advice_per_phase);
        assert_eq!(params.num_lookup_advice_per_phase, baseline_params.num_lookup_advice_per_phase);
        assert!(mock_verifies(&builder, vec![golden_output().to_instances::<Fr>().to_vec()]));
    }
}

#[test]
fn test_too_many_receipts() {
    let requests = golden_requests().into_iter().cycle().take(65).collect::<Vec<_>>();
    let err = fetch_batch(&golden_source(), &requests, AllocationParams::LIQUIDITY_TRANSFER)
        .unwrap_err();
    assert!(matches!(
        err,
        LinkError::Config(ConfigError::TooManyReceipts { actual: 65, max: 64 })
    ));
}

#[test]
fn test_unsupplied_slot_is_a_config_error() {
    let mut receipts = golden_receipts();
    receipts[1].fields.pop();
    let batch =
        CircuitBatch::from_receipts(AllocationParams::LIQUIDITY_TRANSFER, receipts).unwrap();
    let err = LinkCircuit::new(CorrelationConfig::liquidity_transfer(), batch).unwrap_err();
    assert!(matches!(
        err,
        LinkError::Config(ConfigError::MissingField { slot }) if slot == TRANSFER_AMOUNT_SLOT
    ));
    assert!(err.assertion_failures().is_empty());

    let small = AllocationParams { max_receipts: 2, ..AllocationParams::LIQUIDITY_TRANSFER };
    let batch = CircuitBatch::from_receipts(small, golden_receipts()).unwrap();
    assert!(matches!(
        LinkCircuit::new(CorrelationConfig::liquidity_transfer(), batch),
        Err(LinkError::Config(ConfigError::AllocationMismatch))
    ));
}

#[test]
fn test_malformed_selector_is_an_ingestion_error() {
    let mut requests = golden_requests();
    requests[0].fields[0] = LogFieldSelector::data(1, 3);
    let err = fetch_batch(&golden_source(), &requests, AllocationParams::LIQUIDITY_TRANSFER)
        .unwrap_err();
    assert!(matches!(
        err,
        LinkError::Ingestion(IngestionError::DataOutOfRange { log_pos: 1, index: 3, data_len: 96 })
    ));
}

#[test]
fn test_amount_from_transfer_slot() {
    let config = CorrelationConfig::liquidity_transfer().with_amount_slot(TRANSFER_AMOUNT_SLOT);
    let batch =
        CircuitBatch::from_receipts(AllocationParams::LIQUIDITY_TRANSFER, golden_receipts())
            .unwrap();
    let circuit = LinkCircuit::new(config, batch).unwrap();
    // linked slots reveal the same amount
    assert_eq!(circuit.witness().unwrap(), golden_output());
    assert_eq!(circuit.config().threshold.slot, FieldRef::new(1, 1));

    let builder = circuit
        .create_circuit::<Fr>(CircuitBuilderStage::Mock, circuit_params(), None)
        .unwrap();
    let instances = vec![golden_output().to_instances::<Fr>().to_vec()];
    assert_eq!(LinkCircuit::instances(&builder), instances);
    let k = builder.params().k as u32;
    MockProver::run(k, &builder, instances).unwrap().assert_satisfied();
}

#[test]
fn test_keygen_then_prover_with_pinning() -> anyhow::Result<()> {
    let params = circuit_params();
    let k = params.k as u32;
    let keygen = LinkCircuit::keygen(CorrelationConfig::liquidity_transfer())?;
    assert!(keygen.witness().is_err());
    let builder = keygen.create_circuit::<Fr>(CircuitBuilderStage::Keygen, params, None)?;

    let mut rng = StdRng::from_seed([0u8; 32]);
    let kzg_params = ParamsKZG::<Bn256>::setup(k, &mut rng);
    let vk = keygen_vk(&kzg_params, &builder)?;
    let _pk = keygen_pk(&kzg_params, vk, &builder)?;
    let pinning = LinkCircuit::pinning(&builder);
    let pinning: LinkCircuitPinning = serde_json::from_str(&serde_json::to_string(&pinning)?)?;
    assert!(!pinning.break_points.is_empty());

    let circuit = circuit_from(golden_receipts());
    assert!(matches!(
        circuit.create_circuit::<Fr>(CircuitBuilderStage::Prover, params, None),
        Err(LinkError::Config(ConfigError::MissingPinning))
    ));
    let prover = circuit.create_circuit::<Fr>(CircuitBuilderStage::Prover, params, Some(pinning))?;
    assert_eq!(
        LinkCircuit::instances(&prover),
        vec![golden_output().to_instances::<Fr>().to_vec()]
    );
    Ok(())
}
