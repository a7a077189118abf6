//! Rust types for decoded receipt log fields and their encodings as field elements.
//!
//! Types are separated into:
//! - Human readable _native_ types ([types::native]) as produced by the ingestion layer.
//! - The in-circuit formatted versions ([types::field_elements]), where every value is a fixed number
//!   of field elements of a known bit width.
//!
//! [encoder] converts from the former to the latter.
use halo2_base::utils::BigPrimeField;

pub use halo2_base;
pub use utils::hilo::HiLo;

/// Bit widths of every encoded value.
pub mod constants;
pub mod encoder;
pub mod types;
pub mod utils;

/// Field used for in-circuit encodings. Addresses (160 bits) must fit into a single element.
pub trait Field: BigPrimeField {}
impl<F: BigPrimeField> Field for F {}
