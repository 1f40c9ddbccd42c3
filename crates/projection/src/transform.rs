//! Point and extent transforms between registered projections.

use thiserror::Error;
use wms_common::crs::normalize_crs_code;
use wms_common::{BoundingBox, ProjectionDescriptor, ProjectionKind, WmsError};

use crate::mercator;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("No transform from {from} to {to}")]
    Unsupported { from: String, to: String },

    #[error("Coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
}

impl From<ProjectionError> for WmsError {
    fn from(err: ProjectionError) -> Self {
        WmsError::ProjectionError(err.to_string())
    }
}

/// Transform one east-north coordinate pair.
pub fn transform_point(
    x: f64,
    y: f64,
    from: &ProjectionDescriptor,
    to: &ProjectionDescriptor,
) -> Result<(f64, f64), ProjectionError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(ProjectionError::NonFinite { x, y });
    }
    if is_same(from, to) {
        return Ok((x, y));
    }

    match (from.kind, to.kind) {
        (ProjectionKind::Geographic, ProjectionKind::Geographic)
        | (ProjectionKind::WebMercator, ProjectionKind::WebMercator) => Ok((x, y)),
        (ProjectionKind::Geographic, ProjectionKind::WebMercator) => Ok(mercator::forward(x, y)),
        (ProjectionKind::WebMercator, ProjectionKind::Geographic) => Ok(mercator::inverse(x, y)),
        _ => Err(ProjectionError::Unsupported {
            from: from.code.clone(),
            to: to.code.clone(),
        }),
    }
}

/// Transform an east-north extent by its corners.
///
/// An empty extent stays empty.
pub fn transform_extent(
    extent: &BoundingBox,
    from: &ProjectionDescriptor,
    to: &ProjectionDescriptor,
) -> Result<BoundingBox, ProjectionError> {
    if extent.is_empty() {
        return Ok(BoundingBox::empty());
    }

    let corners = [
        (extent.min_x, extent.min_y),
        (extent.min_x, extent.max_y),
        (extent.max_x, extent.min_y),
        (extent.max_x, extent.max_y),
    ];

    let mut result = BoundingBox::empty();
    for (x, y) in corners {
        let (tx, ty) = transform_point(x, y, from, to)?;
        result.min_x = result.min_x.min(tx);
        result.min_y = result.min_y.min(ty);
        result.max_x = result.max_x.max(tx);
        result.max_y = result.max_y.max(ty);
    }
    Ok(result)
}

fn is_same(a: &ProjectionDescriptor, b: &ProjectionDescriptor) -> bool {
    normalize_crs_code(&a.code) == normalize_crs_code(&b.code)
}
