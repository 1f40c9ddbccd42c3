//! Coordinate transformations between the projection kinds the registry knows.
//!
//! Implements the spherical math directly; host-registered projections of
//! kind `Other` are only usable as identity targets.

pub mod mercator;
pub mod transform;

pub use transform::{transform_extent, transform_point, ProjectionError};
