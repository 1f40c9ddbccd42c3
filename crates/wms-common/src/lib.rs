//! Common types shared by the capability negotiation and layer derivation crates.

pub mod bbox;
pub mod crs;
pub mod dimension;
pub mod error;
pub mod merge;
pub mod tile;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::{AxisOrientation, ProjectionDescriptor, ProjectionKind, ProjectionRegistry, Units};
pub use dimension::{apply_defaults, Dimension};
pub use error::{WmsError, WmsResult};
pub use merge::{merge_json, Merge};
pub use tile::{TileGrid, TileMatrix, TileMatrixSet, TileSize};
