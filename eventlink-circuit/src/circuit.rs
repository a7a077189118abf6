use std::{fs::File, path::Path};

#[cfg(feature = "display")]
use ark_std::{end_timer, start_timer};
use eventlink_codec::{
    halo2_base::{
        gates::{
            circuit::{builder::BaseCircuitBuilder, BaseCircuitParams, CircuitBuilderStage},
            flex_gate::MultiPhaseThreadBreakPoints,
        },
        AssignedValue,
    },
    utils::DummyFrom,
    Field,
};
use serde::{Deserialize, Serialize};

use crate::{
    allocator::CircuitBatch,
    config::CorrelationConfig,
    constraints::ConstraintSet,
    emitter::{emit_outputs, OutputRecord, NUM_OUTPUT_INSTANCES},
    error::{ConfigError, LinkError},
};

/// Parameters used to auto-configure the circuit when it is not pinned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCircuitParams {
    /// log2 of the number of rows
    pub k: usize,
    pub lookup_bits: usize,
    /// Rows reserved for blinding factors when calculating column counts.
    pub minimum_rows: usize,
}

impl Default for LinkCircuitParams {
    fn default() -> Self {
        Self { k: 14, lookup_bits: 8, minimum_rows: 20 }
    }
}

impl LinkCircuitParams {
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(File::open(path)?)?)
    }
}

/// Everything needed to rebuild the exact circuit shape a proving key was generated for.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkCircuitPinning {
    pub params: BaseCircuitParams,
    pub break_points: MultiPhaseThreadBreakPoints,
}

impl LinkCircuitPinning {
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(File::open(path)?)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(File::create(path)?, self)?;
        Ok(())
    }
}

/// A correlation configuration bound to one allocated batch.
#[derive(Clone, Debug)]
pub struct LinkCircuit {
    config: CorrelationConfig,
    constraints: ConstraintSet,
    batch: CircuitBatch,
}

impl LinkCircuit {
    /// Fails if the configuration is invalid, the batch was allocated with different maxima, or a
    /// slot the configuration references was not supplied by the ingestion layer.
    pub fn new(config: CorrelationConfig, batch: CircuitBatch) -> Result<Self, LinkError> {
        config.validate()?;
        if *batch.params() != config.allocation {
            return Err(ConfigError::AllocationMismatch.into());
        }
        if let Some(slot) = config.referenced_slots().into_iter().find(|&s| !batch.is_supplied(s)) {
            return Err(ConfigError::MissingField { slot }.into());
        }
        let constraints = ConstraintSet::from_config(&config);
        Ok(Self { config, constraints, batch })
    }

    /// Circuit with an all-padding batch, for key generation.
    pub fn keygen(config: CorrelationConfig) -> Result<Self, LinkError> {
        config.validate()?;
        let batch = CircuitBatch::dummy_from(config.allocation);
        let constraints = ConstraintSet::from_config(&config);
        Ok(Self { config, constraints, batch })
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn batch(&self) -> &CircuitBatch {
        &self.batch
    }

    /// Evaluates every predicate natively. The output record exists only if all of them hold.
    /// Pure: repeated calls on the same circuit return the same result.
    pub fn witness(&self) -> Result<OutputRecord, LinkError> {
        self.constraints.evaluate(&self.batch).map_err(LinkError::WitnessInvalid)?;
        let output = OutputRecord::from_batch(&self.batch, &self.config.outputs);
        log::info!(
            "witness accepted: block {} address {:?} commitment {:?}",
            output.block_num,
            output.address,
            output.commitment()
        );
        Ok(output)
    }

    /// Builds the constraint system with the outputs as public instances.
    ///
    /// Outside of keygen the witness is checked natively first and nothing is built if it is
    /// invalid. Without `pinning` the circuit is auto-configured from `params`; the prover stage
    /// requires `pinning`.
    pub fn create_circuit<F: Field>(
        &self,
        stage: CircuitBuilderStage,
        params: LinkCircuitParams,
        pinning: Option<LinkCircuitPinning>,
    ) -> Result<BaseCircuitBuilder<F>, LinkError> {
        #[cfg(feature = "display")]
        let timer = start_timer!(|| format!("create link circuit: {stage:?}"));
        if stage != CircuitBuilderStage::Keygen {
            self.witness()?;
        }
        let mut builder = BaseCircuitBuilder::from_stage(stage);
        let pinned = pinning.is_some();
        match pinning {
            Some(pinning) => {
                builder = builder.use_params(pinning.params).use_break_points(pinning.break_points);
            }
            None if stage == CircuitBuilderStage::Prover => {
                return Err(ConfigError::MissingPinning.into());
            }
            None => {
                builder = builder
                    .use_k(params.k)
                    .use_lookup_bits(params.lookup_bits)
                    .use_instance_columns(1);
            }
        }
        self.synthesize(&mut builder);
        if !pinned {
            let config = builder.calculate_params(Some(params.minimum_rows));
            log::debug!("auto-configured link circuit: {config:?}");
        }
        #[cfg(feature = "display")]
        end_timer!(timer);
        Ok(builder)
    }

    /// Assigns the batch, applies every predicate and exposes the outputs.
    pub(crate) fn synthesize<F: Field>(
        &self,
        builder: &mut BaseCircuitBuilder<F>,
    ) -> [AssignedValue<F>; NUM_OUTPUT_INSTANCES] {
        let range = builder.range_chip();
        let ctx = builder.main(0);
        let assigned = self.batch.assign(ctx, &range);
        self.constraints.constrain(ctx, &range, &assigned);
        let outputs = emit_outputs(ctx, &range, &assigned, &self.config.outputs);
        builder.assigned_instances[0].extend(outputs);
        outputs
    }

    /// Call after the circuit has been synthesized by keygen or the mock prover.
    pub fn pinning<F: Field>(builder: &BaseCircuitBuilder<F>) -> LinkCircuitPinning {
        LinkCircuitPinning { params: builder.params(), break_points: builder.break_points() }
    }

    pub fn instances<F: Field>(builder: &BaseCircuitBuilder<F>) -> Vec<Vec<F>> {
        builder
            .assigned_instances
            .iter()
            .map(|column| column.iter().map(|cell| *cell.value()).collect())
            .collect()
    }
}
