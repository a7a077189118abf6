/// 256-bit words as pairs of 128-bit halves
pub mod hilo;
pub mod native;

/// Generates a dummy of this type from a seed.
/// This is used to generate padding inputs for the circuit.
pub trait DummyFrom<S> {
    /// Dummy from a seed.
    fn dummy_from(seed: S) -> Self;
}
