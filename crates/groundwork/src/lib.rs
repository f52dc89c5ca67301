pub mod bounds;
pub mod geom;
pub mod math;

// Groundwork crate: small, well-tested primitives only.
pub use bounds::*;
