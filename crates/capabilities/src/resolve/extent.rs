use tracing::debug;

use projection::transform_extent;
use wms_common::{BoundingBox, ProjectionDescriptor, ProjectionRegistry};
use wms_protocol::LayerBoundingBox;

/// Convert between an extent in a projection's declared axis order and
/// east-north order. The swap is its own inverse, so this works both ways.
///
/// Axis order is only honoured where the protocol version defines it
/// (WMS 1.3.0); otherwise extents are already east-north.
pub fn orient_extent(
    extent: &BoundingBox,
    projection: &ProjectionDescriptor,
    honor_axis_order: bool,
    registry: &ProjectionRegistry,
) -> BoundingBox {
    if honor_axis_order && registry.axis_orientation_of(projection).is_north_east() {
        extent.swap_axes()
    } else {
        *extent
    }
}

/// Maximal extent of a layer in `target`, east-north.
///
/// Starts from the projection's own extent, narrows it to `override_extent`
/// (given in the target's axis order) and then to the first advertised
/// bounding box whose CRS the registry knows. If that box cannot be
/// transformed, later boxes are not consulted.
pub fn resolve_extent(
    boxes: &[LayerBoundingBox],
    target: &ProjectionDescriptor,
    override_extent: Option<&BoundingBox>,
    honor_axis_order: bool,
    registry: &ProjectionRegistry,
) -> BoundingBox {
    let mut extent = target.extent;

    if let Some(wanted) = override_extent.filter(|e| !e.is_empty()) {
        let wanted = orient_extent(wanted, target, honor_axis_order, registry);
        extent = extent.intersect_or_empty(&wanted);
    }

    let first_known = boxes
        .iter()
        .find_map(|bbox| registry.get(&bbox.crs).map(|source| (bbox, source)));
    if let Some((bbox, source)) = first_known {
        let declared = orient_extent(&bbox.extent, source, honor_axis_order, registry);
        match transform_extent(&declared, source, target) {
            Ok(reprojected) => extent = extent.intersect_or_empty(&reprojected),
            Err(e) => {
                debug!(crs = %bbox.crs, target = %target.code, error = %e, "Ignoring untransformable bounding box");
            }
        }
    }

    extent
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;
    use wms_common::{ProjectionKind, Units};

    fn layer_box(crs: &str, extent: [f64; 4]) -> LayerBoundingBox {
        LayerBoundingBox {
            crs: crs.to_string(),
            extent: BoundingBox::from_array(extent),
            resx: None,
            resy: None,
        }
    }

    #[test]
    fn test_axis_corrected_bbox_in_wms_130() {
        let registry = ProjectionRegistry::with_defaults();
        let target = registry.get("CRS:84").unwrap();
        let boxes = [layer_box("EPSG:4326", [24.96, -124.73, 49.37, -66.97])];

        let extent = resolve_extent(&boxes, target, None, true, &registry);
        assert_eq!(extent, BoundingBox::new(-124.73, 24.96, -66.97, 49.37));
    }

    #[test]
    fn test_no_axis_correction_in_wms_111() {
        let registry = ProjectionRegistry::with_defaults();
        let target = registry.get("EPSG:4326").unwrap();
        let boxes = [layer_box("EPSG:4326", [-126.0, 24.0, -66.0, 50.0])];

        let extent = resolve_extent(&boxes, target, None, false, &registry);
        assert_eq!(extent, BoundingBox::new(-126.0, 24.0, -66.0, 50.0));
    }

    #[test]
    fn test_only_first_resolvable_box_counts() {
        let registry = ProjectionRegistry::with_defaults();
        let target = registry.get("CRS:84").unwrap();
        let boxes = [
            layer_box("EPSG:32633", [0.0, 0.0, 1.0, 1.0]),
            layer_box("CRS:84", [-10.0, -10.0, 10.0, 10.0]),
            layer_box("CRS:84", [0.0, 0.0, 1.0, 1.0]),
        ];

        let extent = resolve_extent(&boxes, target, None, true, &registry);
        assert_eq!(extent, BoundingBox::new(-10.0, -10.0, 10.0, 10.0));
    }

    #[test]
    fn test_untransformable_first_box_stops_the_search() {
        let mut registry = ProjectionRegistry::with_defaults();
        registry.register(ProjectionDescriptor {
            code: "EPSG:2154".to_string(),
            kind: ProjectionKind::Other,
            units: Units::Meters,
            axis_orientation: None,
            extent: BoundingBox::new(-378305.81, 6093283.21, 1212610.74, 7186901.68),
            world_extent: BoundingBox::new(-9.86, 41.15, 10.38, 51.56),
        });
        let target = registry.get("CRS:84").unwrap();
        let boxes = [
            layer_box("EPSG:2154", [100000.0, 6200000.0, 900000.0, 7000000.0]),
            layer_box("CRS:84", [-5.0, 42.0, 8.0, 51.0]),
        ];

        let extent = resolve_extent(&boxes, target, None, true, &registry);
        assert_eq!(extent, target.extent);

        let wanted = BoundingBox::new(0.0, 45.0, 2.0, 47.0);
        let extent = resolve_extent(&boxes, target, Some(&wanted), true, &registry);
        assert_eq!(extent, wanted);
    }

    #[test]
    fn test_override_in_declared_order_and_reprojection() {
        let registry = ProjectionRegistry::with_defaults();
        let target = registry.get("EPSG:4326").unwrap();
        // lat/lon order, as a WMS 1.3.0 client would send it
        let wanted = BoundingBox::new(40.0, -93.0, 50.0, -75.0);
        let boxes = [layer_box("EPSG:3857", [-13884991.0, 2870341.0, -7455066.0, 6338219.0])];

        let extent = resolve_extent(&boxes, target, Some(&wanted), true, &registry);
        assert_approx_eq!(extent.min_x, -93.0, 1e-9);
        assert_approx_eq!(extent.max_x, -75.0, 1e-9);
        assert_approx_eq!(extent.min_y, 40.0, 1e-9);
        assert_approx_eq!(extent.max_y, 49.37, 0.01);
    }

    #[test]
    fn test_disjoint_override_gives_empty_extent() {
        let registry = ProjectionRegistry::with_defaults();
        let target = registry.get("CRS:84").unwrap();
        let boxes = [layer_box("CRS:84", [0.0, 0.0, 10.0, 10.0])];
        let wanted = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        let extent = resolve_extent(&boxes, target, Some(&wanted), true, &registry);
        assert!(extent.is_empty());
    }
}
