use std::collections::BTreeMap;

use wms_common::Dimension;
use wms_protocol::DimensionDecl;

/// Expand declared dimensions, keyed by upper-cased name.
///
/// A later declaration with the same name replaces an earlier one.
pub fn resolve_dimensions(declarations: &[DimensionDecl]) -> BTreeMap<String, Dimension> {
    declarations
        .iter()
        .map(DimensionDecl::to_dimension)
        .map(|dimension| (dimension.name.clone(), dimension))
        .collect()
}
