//! Transforms between the projections of the default registry.

use projection::{mercator, transform_extent, transform_point, ProjectionError};
use test_utils::{assert_approx_eq, assert_coords_approx_eq};
use wms_common::crs::WEB_MERCATOR_HALF_SIZE;
use wms_common::{
    AxisOrientation, BoundingBox, ProjectionDescriptor, ProjectionKind, ProjectionRegistry, Units,
    WmsError,
};

fn registry() -> ProjectionRegistry {
    ProjectionRegistry::with_defaults()
}

#[test]
fn test_geographic_to_mercator_point() {
    let registry = registry();
    let (x, y) = transform_point(
        180.0,
        0.0,
        registry.get("CRS:84").unwrap(),
        registry.get("EPSG:3857").unwrap(),
    )
    .unwrap();
    assert_coords_approx_eq!((x, y), (WEB_MERCATOR_HALF_SIZE, 0.0), 1e-6);
}

#[test]
fn test_mercator_round_trip_of_a_city() {
    let registry = registry();
    let wgs84 = registry.get("EPSG:4326").unwrap();
    let google = registry.get("EPSG:900913").unwrap();

    let (x, y) = transform_point(2.3522, 48.8566, wgs84, google).unwrap();
    let (lon, lat) = transform_point(x, y, google, wgs84).unwrap();
    assert_coords_approx_eq!((lon, lat), (2.3522, 48.8566), 1e-9);
}

#[test]
fn test_aliases_are_identity() {
    let registry = registry();
    let (x, y) = transform_point(
        1000.0,
        2000.0,
        registry.get("EPSG:3857").unwrap(),
        registry.get("EPSG:102100").unwrap(),
    )
    .unwrap();
    assert_eq!((x, y), (1000.0, 2000.0));
}

#[test]
fn test_extent_uses_corners() {
    let registry = registry();
    let extent = transform_extent(
        &BoundingBox::new(-126.0, 24.0, -66.0, 50.0),
        registry.get("EPSG:4269").unwrap(),
        registry.get("EPSG:3857").unwrap(),
    )
    .unwrap();

    let (min_x, min_y) = mercator::forward(-126.0, 24.0);
    let (max_x, max_y) = mercator::forward(-66.0, 50.0);
    assert_approx_eq!(extent.min_x, min_x, 1e-6);
    assert_approx_eq!(extent.min_y, min_y, 1e-6);
    assert_approx_eq!(extent.max_x, max_x, 1e-6);
    assert_approx_eq!(extent.max_y, max_y, 1e-6);
}

#[test]
fn test_world_extent_clamps_to_mercator_square() {
    let registry = registry();
    let extent = transform_extent(
        &BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
        registry.get("CRS:84").unwrap(),
        registry.get("EPSG:3857").unwrap(),
    )
    .unwrap();
    assert_approx_eq!(extent.max_y, WEB_MERCATOR_HALF_SIZE, 1e-3);
    assert_approx_eq!(extent.min_x, -WEB_MERCATOR_HALF_SIZE, 1e-6);
}

#[test]
fn test_other_projections_are_rejected() {
    let mut registry = registry();
    registry.register(ProjectionDescriptor {
        code: "EPSG:2154".to_string(),
        kind: ProjectionKind::Other,
        units: Units::Meters,
        axis_orientation: Some(AxisOrientation::EastNorth),
        extent: BoundingBox::new(-378305.81, 6093283.21, 1212610.74, 7186901.68),
        world_extent: BoundingBox::new(-9.86, 41.15, 10.38, 51.56),
    });

    let lambert = registry.get("EPSG:2154").unwrap();
    let result = transform_extent(
        &BoundingBox::new(0.0, 45.0, 1.0, 46.0),
        registry.get("CRS:84").unwrap(),
        lambert,
    );
    assert!(matches!(result, Err(ProjectionError::Unsupported { .. })));

    let err: WmsError = result.unwrap_err().into();
    assert_eq!(err.kind(), "ProjectionError");

    // identity still works
    let same = transform_extent(&lambert.extent, lambert, lambert).unwrap();
    assert_eq!(same, lambert.extent);
}

#[test]
fn test_non_finite_input() {
    let registry = registry();
    let wgs84 = registry.get("EPSG:4326").unwrap();
    assert!(matches!(
        transform_point(f64::NAN, 0.0, wgs84, wgs84),
        Err(ProjectionError::NonFinite { .. })
    ));
}

#[test]
fn test_empty_extent_stays_empty() {
    let registry = registry();
    let extent = transform_extent(
        &BoundingBox::empty(),
        registry.get("EPSG:4326").unwrap(),
        registry.get("EPSG:3857").unwrap(),
    )
    .unwrap();
    assert!(extent.is_empty());
}
