//! Tests for BoundingBox extent operations.

use wms_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// from_wms_string tests
// ============================================================================

#[test]
fn test_parse_wms_bbox_integer() {
    let bbox = BoundingBox::from_wms_string("0,0,100,100").unwrap();
    assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn test_parse_wms_bbox_floating() {
    let bbox = BoundingBox::from_wms_string("-125.5,24.75,-66.25,50.125").unwrap();
    assert!((bbox.min_x - (-125.5)).abs() < 0.001);
    assert!((bbox.max_y - 50.125).abs() < 0.001);
}

#[test]
fn test_parse_wms_bbox_tolerates_spaces() {
    let bbox = BoundingBox::from_wms_string(" -10, -5, 10, 5 ").unwrap();
    assert_eq!(bbox, BoundingBox::new(-10.0, -5.0, 10.0, 5.0));
}

#[test]
fn test_parse_wms_bbox_invalid_format_too_few() {
    let result = BoundingBox::from_wms_string("0,0,100");
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_wms_bbox_invalid_number() {
    let result = BoundingBox::from_wms_string("abc,0,100,100");
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

#[test]
fn test_wms_string_round_trip_text() {
    let bbox = BoundingBox::new(-10.5, -5.0, 10.0, 5.25);
    assert_eq!(bbox.to_wms_string(), "-10.5,-5,10,5.25");
}

// ============================================================================
// Intersection tests
// ============================================================================

#[test]
fn test_bbox_intersects_adjacent_edge() {
    // Touching at an edge yields a zero-width intersection, not an empty one
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    let i = a.intersection(&b).unwrap();
    assert_eq!(i.width(), 0.0);
    assert!(!i.is_empty());
}

#[test]
fn test_bbox_intersection_contains() {
    let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
    let inner = BoundingBox::new(25.0, 25.0, 75.0, 75.0);
    assert_eq!(outer.intersection(&inner), Some(inner));
}

#[test]
fn test_bbox_intersection_none() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
    assert!(a.intersection(&b).is_none());
    assert!(a.intersect_or_empty(&b).is_empty());
}

#[test]
fn test_bbox_inverted_is_empty() {
    let bbox = BoundingBox::new(10.0, 10.0, 0.0, 0.0);
    assert!(bbox.is_empty());
}

// ============================================================================
// Axis order
// ============================================================================

#[test]
fn test_swap_axes_is_involution() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.swap_axes().swap_axes(), bbox);
    assert_eq!(bbox.swap_axes(), BoundingBox::new(-90.0, -180.0, 90.0, 180.0));
}

#[test]
fn test_array_conversions() {
    let bbox: BoundingBox = [1.0, 2.0, 3.0, 4.0].into();
    assert_eq!(bbox.to_array(), [1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_contains_point_on_edge() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 5.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(!bbox.contains_point(11.0, 5.0));
}
