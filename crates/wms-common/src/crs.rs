//! Coordinate Reference System descriptors and the projection registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::BoundingBox;

/// Half the circumference of the Web Mercator sphere, in meters.
pub const WEB_MERCATOR_HALF_SIZE: f64 = 20037508.342789244;

/// Meters per degree on the sphere used for degree-based resolutions.
pub const METERS_PER_DEGREE: f64 = 2.0 * std::f64::consts::PI * 6370997.0 / 360.0;

/// Order in which a CRS declares its coordinate pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AxisOrientation {
    /// X (longitude/easting), Y (latitude/northing)
    #[default]
    EastNorth,
    /// Y (latitude/northing), X (longitude/easting)
    NorthEast,
}

impl AxisOrientation {
    /// Parse a proj4-style axis string such as "enu" or "neu".
    pub fn from_proj4_axis(axis: &str) -> Self {
        if axis.to_ascii_lowercase().starts_with("ne") {
            AxisOrientation::NorthEast
        } else {
            AxisOrientation::EastNorth
        }
    }

    pub fn is_north_east(&self) -> bool {
        matches!(self, AxisOrientation::NorthEast)
    }
}

/// Units of a projection's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Degrees,
    Meters,
}

impl Units {
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            Units::Degrees => METERS_PER_DEGREE,
            Units::Meters => 1.0,
        }
    }
}

/// Which coordinate math applies to a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Longitude/latitude on the WGS84 datum (or close enough for extents)
    Geographic,
    /// Spherical Mercator (EPSG:3857 and aliases)
    WebMercator,
    /// A host-registered projection without built-in transform support
    Other,
}

/// Everything the engine needs to know about one CRS code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDescriptor {
    pub code: String,
    pub kind: ProjectionKind,
    pub units: Units,
    /// Declared axis order, when the projection itself knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_orientation: Option<AxisOrientation>,
    /// Validity extent in projection units.
    pub extent: BoundingBox,
    /// Validity extent in longitude/latitude degrees.
    pub world_extent: BoundingBox,
}

impl ProjectionDescriptor {
    pub fn geographic(code: &str, axis: AxisOrientation) -> Self {
        let world = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
        Self {
            code: code.to_string(),
            kind: ProjectionKind::Geographic,
            units: Units::Degrees,
            axis_orientation: Some(axis),
            extent: world,
            world_extent: world,
        }
    }

    pub fn web_mercator(code: &str) -> Self {
        Self {
            code: code.to_string(),
            kind: ProjectionKind::WebMercator,
            units: Units::Meters,
            axis_orientation: Some(AxisOrientation::EastNorth),
            extent: BoundingBox::new(
                -WEB_MERCATOR_HALF_SIZE,
                -WEB_MERCATOR_HALF_SIZE,
                WEB_MERCATOR_HALF_SIZE,
                WEB_MERCATOR_HALF_SIZE,
            ),
            world_extent: BoundingBox::new(-180.0, -85.0, 180.0, 85.0),
        }
    }
}

impl fmt::Display for ProjectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Normalize the many spellings of a CRS identifier to the short form.
///
/// Accepts formats like:
/// - "EPSG:4326", "epsg:4326"
/// - "urn:ogc:def:crs:EPSG::3857", "urn:ogc:def:crs:EPSG:6.18:3:3857"
/// - "http://www.opengis.net/def/crs/EPSG/0/4326"
/// - "urn:ogc:def:crs:OGC:1.3:CRS84" (becomes "CRS:84")
pub fn normalize_crs_code(code: &str) -> String {
    let trimmed = code.trim();
    let upper = trimmed.to_ascii_uppercase();

    if upper.ends_with("CRS84") || upper == "CRS:84" || upper == "OGC:CRS84" {
        return "CRS:84".to_string();
    }

    if upper.starts_with("URN:OGC:DEF:CRS:") {
        let parts: Vec<&str> = upper.split(':').collect();
        if parts.len() >= 6 {
            let authority = parts[4];
            if let Some(number) = parts.last().filter(|p| !p.is_empty()) {
                return format!("{}:{}", authority, number);
            }
        }
    }

    if upper.starts_with("HTTP://WWW.OPENGIS.NET/DEF/CRS/")
        || upper.starts_with("HTTPS://WWW.OPENGIS.NET/DEF/CRS/")
    {
        let parts: Vec<&str> = upper.trim_end_matches('/').split('/').collect();
        if parts.len() >= 3 {
            let number = parts[parts.len() - 1];
            let authority = parts[parts.len() - 3];
            return format!("{}:{}", authority, number);
        }
    }

    upper
}

/// Lookup table from CRS code to [`ProjectionDescriptor`].
///
/// The host seeds it once at startup; the engine only reads from it.
/// Axis definitions are kept separately, mirroring a proj4 definition table
/// that may know the axis order of codes whose descriptor does not.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRegistry {
    projections: HashMap<String, ProjectionDescriptor>,
    axis_definitions: HashMap<String, AxisOrientation>,
}

impl ProjectionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the geographic and Web Mercator codes every
    /// deployment needs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ProjectionDescriptor::geographic(
            "EPSG:4326",
            AxisOrientation::NorthEast,
        ));
        registry.register(ProjectionDescriptor::geographic(
            "CRS:84",
            AxisOrientation::EastNorth,
        ));
        registry.register(ProjectionDescriptor::geographic(
            "EPSG:4269",
            AxisOrientation::NorthEast,
        ));
        registry.register(ProjectionDescriptor::web_mercator("EPSG:3857"));
        for alias in ["EPSG:900913", "EPSG:102100", "EPSG:102113", "EPSG:3785"] {
            registry.register(ProjectionDescriptor::web_mercator(alias));
        }
        registry
    }

    /// Add or replace a projection.
    pub fn register(&mut self, descriptor: ProjectionDescriptor) {
        let key = normalize_crs_code(&descriptor.code);
        self.projections.insert(key, descriptor);
    }

    /// Record the axis order of a code, independently of its descriptor.
    pub fn define_axis(&mut self, code: &str, orientation: AxisOrientation) {
        self.axis_definitions
            .insert(normalize_crs_code(code), orientation);
    }

    pub fn has(&self, code: &str) -> bool {
        self.projections.contains_key(&normalize_crs_code(code))
    }

    pub fn get(&self, code: &str) -> Option<&ProjectionDescriptor> {
        self.projections.get(&normalize_crs_code(code))
    }

    /// Axis order from the definition table, east-north when unknown.
    pub fn define_axis_order(&self, code: &str) -> AxisOrientation {
        self.axis_definitions
            .get(&normalize_crs_code(code))
            .copied()
            .unwrap_or_default()
    }

    /// Axis order of a descriptor: its own declaration first, then the
    /// definition table.
    pub fn axis_orientation_of(&self, projection: &ProjectionDescriptor) -> AxisOrientation {
        projection
            .axis_orientation
            .unwrap_or_else(|| self.define_axis_order(&projection.code))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.projections.values().map(|p| p.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_crs_code() {
        assert_eq!(normalize_crs_code("epsg:3857"), "EPSG:3857");
        assert_eq!(normalize_crs_code("urn:ogc:def:crs:EPSG::3857"), "EPSG:3857");
        assert_eq!(normalize_crs_code("urn:ogc:def:crs:EPSG:6.18:3:3857"), "EPSG:3857");
        assert_eq!(
            normalize_crs_code("http://www.opengis.net/def/crs/EPSG/0/4326"),
            "EPSG:4326"
        );
        assert_eq!(normalize_crs_code("urn:ogc:def:crs:OGC:1.3:CRS84"), "CRS:84");
    }

    #[test]
    fn test_default_registry() {
        let registry = ProjectionRegistry::with_defaults();
        assert!(registry.has("EPSG:4326"));
        assert!(registry.has("crs:84"));
        assert!(registry.has("EPSG:900913"));
        assert!(!registry.has("EPSG:99999"));

        let wgs84 = registry.get("EPSG:4326").unwrap();
        assert_eq!(registry.axis_orientation_of(wgs84), AxisOrientation::NorthEast);
        let mercator = registry.get("urn:ogc:def:crs:EPSG::3857").unwrap();
        assert_eq!(mercator.kind, ProjectionKind::WebMercator);
    }

    #[test]
    fn test_axis_definition_fallback() {
        let mut registry = ProjectionRegistry::new();
        let mut custom = ProjectionDescriptor::geographic("EPSG:4258", AxisOrientation::EastNorth);
        custom.axis_orientation = None;
        registry.register(custom);

        let descriptor = registry.get("EPSG:4258").unwrap().clone();
        assert_eq!(registry.axis_orientation_of(&descriptor), AxisOrientation::EastNorth);

        registry.define_axis("EPSG:4258", AxisOrientation::from_proj4_axis("neu"));
        assert_eq!(registry.axis_orientation_of(&descriptor), AxisOrientation::NorthEast);
    }
}
