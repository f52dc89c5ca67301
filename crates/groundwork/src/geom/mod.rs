pub mod intersect;
pub mod polygon;
pub mod triangulate;

pub use intersect::*;
pub use polygon::*;
pub use triangulate::*;
