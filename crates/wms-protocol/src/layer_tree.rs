//! Resolution of WMS layers against their inherited ancestors.

use serde::{Deserialize, Serialize};

use wms_common::merge::{override_if_some, replace_if_present, union_into, Merge};
use wms_common::ProjectionRegistry;

use crate::capabilities::{LayerAttributes, LayerIdentity, LayerNode};

impl Merge for LayerAttributes {
    fn merge_from(&mut self, other: &Self) {
        union_into(&mut self.crs, &other.crs);
        override_if_some(&mut self.geographic_bbox, &other.geographic_bbox);
        replace_if_present(&mut self.bounding_boxes, &other.bounding_boxes);
        replace_if_present(&mut self.dimensions, &other.dimensions);
        replace_if_present(&mut self.styles, &other.styles);
        override_if_some(&mut self.attribution, &other.attribution);
        override_if_some(&mut self.queryable, &other.queryable);
        override_if_some(&mut self.opaque, &other.opaque);
        override_if_some(&mut self.min_scale_denominator, &other.min_scale_denominator);
        override_if_some(&mut self.max_scale_denominator, &other.max_scale_denominator);
    }
}

/// A layer's own identity with the attributes merged down from every ancestor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLayer {
    #[serde(flatten)]
    pub identity: LayerIdentity,
    #[serde(flatten)]
    pub attributes: LayerAttributes,
}

impl ResolvedLayer {
    pub fn name(&self) -> Option<&str> {
        self.identity.name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.identity.title.as_deref()
    }
}

/// Find the layer called `name`, depth-first, and merge its ancestors'
/// inheritable attributes into it.
///
/// At every level the CRS list is reduced to codes the registry knows.
pub fn find_layer(
    root: &LayerNode,
    name: &str,
    registry: &ProjectionRegistry,
) -> Option<ResolvedLayer> {
    let attributes = filtered_attributes(&root.attributes, registry);

    if root.identity.name.as_deref() == Some(name) {
        return Some(ResolvedLayer {
            identity: root.identity.clone(),
            attributes,
        });
    }

    root.children
        .iter()
        .find_map(|child| find_layer(child, name, registry))
        .map(|found| {
            let mut merged = attributes;
            merged.merge_from(&found.attributes);
            ResolvedLayer {
                identity: found.identity,
                attributes: merged,
            }
        })
}

/// Every named layer of the tree in pre-order, each with inherited attributes.
pub fn list_layers(root: &LayerNode, registry: &ProjectionRegistry) -> Vec<ResolvedLayer> {
    let mut layers = Vec::new();
    collect_layers(root, &LayerAttributes::default(), registry, &mut layers);
    layers
}

fn collect_layers(
    node: &LayerNode,
    inherited: &LayerAttributes,
    registry: &ProjectionRegistry,
    out: &mut Vec<ResolvedLayer>,
) {
    let mut attributes = inherited.clone();
    attributes.merge_from(&node.attributes);
    let attributes = filtered_attributes(&attributes, registry);

    if node.identity.name.is_some() {
        out.push(ResolvedLayer {
            identity: node.identity.clone(),
            attributes: attributes.clone(),
        });
    }

    for child in &node.children {
        collect_layers(child, &attributes, registry, out);
    }
}

fn filtered_attributes(attributes: &LayerAttributes, registry: &ProjectionRegistry) -> LayerAttributes {
    let mut filtered = attributes.clone();
    filtered.crs.retain(|code| registry.has(code));
    filtered
}
