pub mod element;
pub mod invalidate;
pub mod raster;
pub mod ribbon;
pub mod style;
pub mod transform;
pub mod viewport;

// Overlay crate: geographic polylines/polygons into a tile-space pixel
// buffer or a ground-plane ribbon mesh.
pub use element::*;
pub use invalidate::*;
pub use style::*;
pub use viewport::*;
