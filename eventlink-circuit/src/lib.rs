//! Circuit linking a liquidity-provision event and a USDC `Transfer` event.
//!
//! A batch of decoded receipt fields is allocated to a fixed shape ([allocator]), checked against
//! a flat list of correlation predicates ([constraints]) and, only if every predicate holds,
//! reveals `(block number, address, amount)` as public instances ([emitter]).
//! [circuit::LinkCircuit] ties these together on top of a halo2-base [BaseCircuitBuilder].
//!
//! [BaseCircuitBuilder]: eventlink_codec::halo2_base::gates::circuit::builder::BaseCircuitBuilder
pub use eventlink_codec;
pub use eventlink_codec::{halo2_base, Field};

pub mod allocator;
pub mod circuit;
pub mod config;
pub mod constraints;
pub mod emitter;
pub mod error;
pub mod ingestion;

pub use circuit::{LinkCircuit, LinkCircuitParams, LinkCircuitPinning};
pub use config::CorrelationConfig;
pub use emitter::OutputRecord;
pub use error::LinkError;

#[cfg(test)]
mod tests;
