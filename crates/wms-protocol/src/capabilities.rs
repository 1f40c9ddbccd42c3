//! WMS GetCapabilities model and decoder (versions 1.1.1 and 1.3.0).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use wms_common::{BoundingBox, WmsError, WmsResult};

use crate::document::DimensionDecl;
use crate::xml::XmlElement;

/// Service-level metadata common to WMS and WMTS documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_resource: Option<String>,
}

/// One advertised request type: output formats and HTTP GET endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub formats: Vec<String>,
    pub get_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsRequests {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_capabilities: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_map: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_feature_info: Option<Operation>,
}

/// Fields describing a single layer that children never inherit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_list_urls: Vec<String>,
}

/// A bounding box in the axis order of its own CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerBoundingBox {
    pub crs: String,
    pub extent: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Layer fields that children inherit from their ancestors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerAttributes {
    /// CRS (1.3.0) or SRS (1.1.1) codes
    #[serde(default)]
    pub crs: Vec<String>,
    /// EX_GeographicBoundingBox or LatLonBoundingBox, in lon/lat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_bbox: Option<BoundingBox>,
    #[serde(default)]
    pub bounding_boxes: Vec<LayerBoundingBox>,
    #[serde(default)]
    pub dimensions: Vec<DimensionDecl>,
    #[serde(default)]
    pub styles: Vec<StyleDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queryable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale_denominator: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale_denominator: Option<f64>,
}

/// A node of the WMS layer tree as written in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerNode {
    pub identity: LayerIdentity,
    pub attributes: LayerAttributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayerNode>,
}

/// Decoded WMS capabilities document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsCapabilities {
    pub version: String,
    pub service: ServiceMetadata,
    pub request: WmsRequests,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_layer: Option<LayerNode>,
}

impl WmsCapabilities {
    pub fn from_xml(xml: &str) -> WmsResult<Self> {
        let root = XmlElement::parse(xml)?;
        Self::from_element(&root)
    }

    pub fn from_element(root: &XmlElement) -> WmsResult<Self> {
        let legacy = match root.name.as_str() {
            "WMT_MS_Capabilities" => true,
            "WMS_Capabilities" => false,
            other => {
                return Err(WmsError::MalformedDocument(format!(
                    "unexpected root element <{}> for a WMS document",
                    other
                )))
            }
        };

        let version = root
            .attr("version")
            .map(str::to_string)
            .unwrap_or_else(|| if legacy { "1.1.1" } else { "1.3.0" }.to_string());

        let service = root.child("Service").map(decode_service).unwrap_or_default();

        let capability = root.child("Capability");
        let request = capability
            .and_then(|c| c.child("Request"))
            .map(|r| WmsRequests {
                get_capabilities: r.child("GetCapabilities").map(decode_operation),
                get_map: r.child("GetMap").map(decode_operation),
                get_feature_info: r.child("GetFeatureInfo").map(decode_operation),
            })
            .unwrap_or_default();

        let root_layer = capability
            .and_then(|c| c.child("Layer"))
            .map(|l| decode_layer(l, legacy, &HashMap::new()));

        Ok(Self {
            version,
            service,
            request,
            root_layer,
        })
    }

    /// Formats advertised for GetMap, in document order.
    pub fn get_map_formats(&self) -> &[String] {
        self.request
            .get_map
            .as_ref()
            .map(|op| op.formats.as_slice())
            .unwrap_or_default()
    }
}

pub(crate) fn decode_service(el: &XmlElement) -> ServiceMetadata {
    ServiceMetadata {
        name: el.child_text("Name"),
        title: el.child_text("Title"),
        abstract_text: el.child_text("Abstract"),
        keywords: keywords(el),
        online_resource: online_resource(el),
    }
}

fn decode_operation(el: &XmlElement) -> Operation {
    Operation {
        formats: el
            .children_named("Format")
            .map(|f| f.text.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        get_urls: el
            .children_named("DCPType")
            .filter_map(|dcp| dcp.path(&["HTTP", "Get"]))
            .filter_map(online_resource)
            .collect(),
    }
}

fn decode_layer(el: &XmlElement, legacy: bool, inherited_units: &HashMap<String, String>) -> LayerNode {
    let identity = LayerIdentity {
        name: el.child_text("Name"),
        title: el.child_text("Title"),
        abstract_text: el.child_text("Abstract"),
        keywords: keywords(el),
        identifiers: el
            .children_named("Identifier")
            .map(|i| i.text.trim().to_string())
            .collect(),
        metadata_urls: nested_resources(el, "MetadataURL"),
        data_urls: nested_resources(el, "DataURL"),
        feature_list_urls: nested_resources(el, "FeatureListURL"),
    };

    let crs_tag = if legacy { "SRS" } else { "CRS" };
    let crs = el
        .children_named(crs_tag)
        .flat_map(|c| c.text.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect();

    let geographic_bbox = if legacy {
        el.child("LatLonBoundingBox").and_then(attribute_bbox)
    } else {
        el.child("EX_GeographicBoundingBox").and_then(|g| {
            let coord = |name: &str| g.child_text(name).and_then(|t| t.parse::<f64>().ok());
            Some(BoundingBox::new(
                coord("westBoundLongitude")?,
                coord("southBoundLatitude")?,
                coord("eastBoundLongitude")?,
                coord("northBoundLatitude")?,
            ))
        })
    };

    let bounding_boxes = el
        .children_named("BoundingBox")
        .filter_map(|b| {
            let crs = b.attr("CRS").or_else(|| b.attr("SRS"))?.to_string();
            Some(LayerBoundingBox {
                crs,
                extent: attribute_bbox(b)?,
                resx: b.attr_f64("resx"),
                resy: b.attr_f64("resy"),
            })
        })
        .collect();

    let (dimensions, units) = if legacy {
        legacy_dimensions(el, inherited_units)
    } else {
        (current_dimensions(el), HashMap::new())
    };

    let styles = el
        .children_named("Style")
        .filter_map(|s| {
            Some(StyleDecl {
                name: s.child_text("Name")?,
                title: s.child_text("Title"),
                abstract_text: s.child_text("Abstract"),
                legend_url: s.child("LegendURL").and_then(online_resource),
            })
        })
        .collect();

    let attribution = el.child("Attribution").map(|a| Attribution {
        title: a.child_text("Title"),
        online_resource: online_resource(a),
        logo_url: a.child("LogoURL").and_then(online_resource),
    });

    let attributes = LayerAttributes {
        crs,
        geographic_bbox,
        bounding_boxes,
        dimensions,
        styles,
        attribution,
        queryable: el.attr("queryable").map(parse_flag),
        opaque: el.attr("opaque").map(parse_flag),
        min_scale_denominator: el
            .child_text("MinScaleDenominator")
            .and_then(|t| t.parse().ok()),
        max_scale_denominator: el
            .child_text("MaxScaleDenominator")
            .and_then(|t| t.parse().ok()),
    };

    let children = el
        .children_named("Layer")
        .map(|child| decode_layer(child, legacy, &units))
        .collect();

    LayerNode {
        identity,
        attributes,
        children,
    }
}

/// WMS 1.3.0: each `Dimension` element carries its own values.
fn current_dimensions(el: &XmlElement) -> Vec<DimensionDecl> {
    el.children_named("Dimension")
        .filter_map(|d| {
            Some(DimensionDecl {
                name: d.attr("name")?.to_string(),
                units: d.attr("units").map(str::to_string),
                default: d.attr("default").map(str::to_string),
                values_raw: vec![d.text.trim().to_string()],
            })
        })
        .collect()
}

/// WMS 1.1.1: `Dimension` declares name and units, `Extent` carries values
/// and default, possibly on a descendant layer.
fn legacy_dimensions(
    el: &XmlElement,
    inherited_units: &HashMap<String, String>,
) -> (Vec<DimensionDecl>, HashMap<String, String>) {
    let mut units = inherited_units.clone();
    for d in el.children_named("Dimension") {
        if let (Some(name), Some(unit)) = (d.attr("name"), d.attr("units")) {
            units.insert(name.to_uppercase(), unit.to_string());
        }
    }

    let dimensions = el
        .children_named("Extent")
        .filter_map(|e| {
            let name = e.attr("name")?.to_string();
            Some(DimensionDecl {
                units: units.get(&name.to_uppercase()).cloned(),
                default: e.attr("default").map(str::to_string),
                values_raw: vec![e.text.trim().to_string()],
                name,
            })
        })
        .collect();

    (dimensions, units)
}

fn attribute_bbox(el: &XmlElement) -> Option<BoundingBox> {
    Some(BoundingBox::new(
        el.attr_f64("minx")?,
        el.attr_f64("miny")?,
        el.attr_f64("maxx")?,
        el.attr_f64("maxy")?,
    ))
}

fn keywords(el: &XmlElement) -> Vec<String> {
    el.child("KeywordList")
        .map(|list| {
            list.children_named("Keyword")
                .map(|k| k.text.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn online_resource(el: &XmlElement) -> Option<String> {
    el.child("OnlineResource")
        .and_then(|r| r.attr("href"))
        .map(str::to_string)
}

fn nested_resources(el: &XmlElement, tag: &str) -> Vec<String> {
    el.children_named(tag).filter_map(online_resource).collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True")
}
