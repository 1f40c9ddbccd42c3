//! Derivation of projection, extent and dimensions for a resolved layer.

pub mod dimension;
pub mod extent;
pub mod projection;

pub use dimension::resolve_dimensions;
pub use extent::{orient_extent, resolve_extent};
pub use projection::resolve_projection;
