//! Tile geometry: WMTS tile matrix sets and the tile grids derived from them.

use crate::crs::AxisOrientation;
use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Number of zoom levels in a synthesized grid.
pub const SYNTHESIZED_LEVELS: usize = 29;

/// Standardized rendering pixel size in meters (0.28 mm).
pub const STANDARD_PIXEL_SIZE: f64 = 0.00028;

/// Tile dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn to_array(&self) -> [u32; 2] {
        [self.width, self.height]
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
        }
    }
}

/// A single tile matrix (zoom level) definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrix {
    pub identifier: String,

    pub scale_denominator: f64,

    /// Top-left corner in the CRS's declared axis order
    pub top_left_corner: (f64, f64),

    pub tile_width: u32,

    pub tile_height: u32,

    /// Number of tile columns
    pub matrix_width: u32,

    /// Number of tile rows
    pub matrix_height: u32,
}

impl TileMatrix {
    /// Resolution in CRS units per pixel.
    pub fn resolution(&self, meters_per_unit: f64) -> f64 {
        self.scale_denominator * STANDARD_PIXEL_SIZE / meters_per_unit
    }

    /// Top-left corner in east-north order.
    pub fn origin(&self, axis: AxisOrientation) -> [f64; 2] {
        let (a, b) = self.top_left_corner;
        if axis.is_north_east() {
            [b, a]
        } else {
            [a, b]
        }
    }
}

/// A tile matrix set as advertised by a WMTS server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrixSet {
    pub identifier: String,

    /// Supported CRS, as written in the document
    pub crs: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_known_scale_set: Option<String>,

    pub tile_matrices: Vec<TileMatrix>,
}

impl TileMatrixSet {
    pub fn get_matrix(&self, identifier: &str) -> Option<&TileMatrix> {
        self.tile_matrices
            .iter()
            .find(|m| m.identifier == identifier)
    }
}

/// Tile pyramid handed to the map layer: origin(s), resolutions and tile
/// sizes per zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<[f64; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origins: Option<Vec<[f64; 2]>>,

    pub resolutions: Vec<f64>,

    pub tile_size: TileSize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_sizes: Option<Vec<TileSize>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_ids: Option<Vec<String>>,
}

impl TileGrid {
    /// Synthesize a grid for an untiled service.
    ///
    /// The coarsest level spans the extent's width with two tiles; each of
    /// the following levels halves the resolution. The origin is the
    /// extent's lower-left corner.
    pub fn synthesize(extent: &BoundingBox, tile_size: TileSize) -> Self {
        let max_resolution = extent.width() / (tile_size.width as f64 * 2.0);
        let resolutions = (0..SYNTHESIZED_LEVELS)
            .map(|z| max_resolution / 2f64.powi(z as i32))
            .collect();

        Self {
            origin: Some([extent.min_x, extent.min_y]),
            origins: None,
            resolutions,
            tile_size,
            tile_sizes: None,
            matrix_ids: None,
        }
    }

    /// Derive a grid from a WMTS tile matrix set.
    pub fn from_matrix_set(
        set: &TileMatrixSet,
        meters_per_unit: f64,
        axis: AxisOrientation,
    ) -> Self {
        let matrices = &set.tile_matrices;
        let tile_sizes: Vec<TileSize> = matrices
            .iter()
            .map(|m| TileSize::new(m.tile_width, m.tile_height))
            .collect();

        Self {
            origin: None,
            origins: Some(matrices.iter().map(|m| m.origin(axis)).collect()),
            resolutions: matrices
                .iter()
                .map(|m| m.resolution(meters_per_unit))
                .collect(),
            tile_size: tile_sizes.first().copied().unwrap_or_default(),
            tile_sizes: Some(tile_sizes),
            matrix_ids: Some(matrices.iter().map(|m| m.identifier.clone()).collect()),
        }
    }

    pub fn max_resolution(&self) -> Option<f64> {
        self.resolutions.first().copied()
    }

    /// Zoom level whose resolution is closest to `resolution`.
    pub fn zoom_for_resolution(&self, resolution: f64) -> Option<usize> {
        self.resolutions
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - resolution)
                    .abs()
                    .total_cmp(&(*b - resolution).abs())
            })
            .map(|(z, _)| z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(id: &str, scale: f64, corner: (f64, f64)) -> TileMatrix {
        TileMatrix {
            identifier: id.to_string(),
            scale_denominator: scale,
            top_left_corner: corner,
            tile_width: 256,
            tile_height: 256,
            matrix_width: 1,
            matrix_height: 1,
        }
    }

    #[test]
    fn test_synthesize_world_grid() {
        let grid = TileGrid::synthesize(
            &BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            TileSize::default(),
        );
        assert_eq!(grid.resolutions.len(), 29);
        assert_eq!(grid.resolutions[0], 0.703125);
        for pair in grid.resolutions.windows(2) {
            assert_eq!(pair[1], pair[0] / 2.0);
        }
        assert_eq!(grid.origin, Some([-180.0, -90.0]));
        assert_eq!(grid.zoom_for_resolution(0.35), Some(1));
    }

    #[test]
    fn test_from_matrix_set_web_mercator() {
        let set = TileMatrixSet {
            identifier: "GoogleMapsCompatible".to_string(),
            crs: "urn:ogc:def:crs:EPSG::3857".to_string(),
            bounding_box: None,
            well_known_scale_set: None,
            tile_matrices: vec![
                matrix("0", 559082264.0287178, (-20037508.3427892, 20037508.3427892)),
                matrix("1", 279541132.0143589, (-20037508.3427892, 20037508.3427892)),
            ],
        };
        let grid = TileGrid::from_matrix_set(&set, 1.0, AxisOrientation::EastNorth);

        assert!((grid.resolutions[0] - 156543.0339).abs() < 1e-3);
        assert!((grid.resolutions[1] - 78271.5170).abs() < 1e-3);
        assert_eq!(grid.matrix_ids, Some(vec!["0".to_string(), "1".to_string()]));
        assert_eq!(grid.origins.as_ref().map(|o| o[0]), Some([-20037508.3427892, 20037508.3427892]));
    }

    #[test]
    fn test_from_matrix_set_swaps_north_east_corner() {
        let set = TileMatrixSet {
            identifier: "EPSG:4326".to_string(),
            crs: "urn:ogc:def:crs:EPSG::4326".to_string(),
            bounding_box: None,
            well_known_scale_set: None,
            tile_matrices: vec![matrix("EPSG:4326:0", 279541132.0143589, (90.0, -180.0))],
        };
        let grid = TileGrid::from_matrix_set(&set, 1.0, AxisOrientation::NorthEast);
        assert_eq!(grid.origins, Some(vec![[-180.0, 90.0]]));
        assert_eq!(grid.tile_size, TileSize::default());
    }
}
