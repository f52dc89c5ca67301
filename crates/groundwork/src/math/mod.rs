pub mod angle;
pub mod geo;
pub mod mercator;
pub mod vec;

pub use angle::*;
pub use geo::*;
pub use mercator::*;
pub use vec::*;
