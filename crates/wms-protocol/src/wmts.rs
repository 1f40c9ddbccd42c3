//! WMTS 1.0.0 GetCapabilities model and decoder.
//!
//! Covers the KVP and RESTful bindings: operations carry their allowed
//! `GetEncoding` values, layers carry `ResourceURL` templates.

use serde::{Deserialize, Serialize};

use wms_common::{BoundingBox, TileMatrix, TileMatrixSet, WmsError, WmsResult};

use crate::capabilities::ServiceMetadata;
use crate::document::DimensionDecl;
use crate::xml::XmlElement;

/// Request encodings a WMTS operation may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestEncoding {
    Kvp,
    Rest,
}

/// An HTTP GET endpoint of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcpGet {
    pub href: String,
    /// Values of the `GetEncoding` constraint, e.g. `KVP` or `RESTful`
    #[serde(default)]
    pub encodings: Vec<String>,
}

impl DcpGet {
    pub fn supports(&self, encoding: RequestEncoding) -> bool {
        let wanted = match encoding {
            RequestEncoding::Kvp => "KVP",
            RequestEncoding::Rest => "REST",
        };
        self.encodings
            .iter()
            .any(|e| e.to_uppercase().starts_with(wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub name: String,
    pub get: Vec<DcpGet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmtsStyle {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrixSetLink {
    pub tile_matrix_set: String,
}

/// A `ResourceURL` template for the RESTful binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUrl {
    pub format: String,
    pub resource_type: String,
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WmtsLayer {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Extent in CRS:84 (longitude first)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wgs84_bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub styles: Vec<WmtsStyle>,
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub info_formats: Vec<String>,
    #[serde(default)]
    pub dimensions: Vec<DimensionDecl>,
    #[serde(default)]
    pub tile_matrix_set_links: Vec<TileMatrixSetLink>,
    #[serde(default)]
    pub resource_urls: Vec<ResourceUrl>,
}

impl WmtsLayer {
    /// Style identifiers with the default-flagged style first.
    pub fn ordered_style_ids(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(self.styles.len());
        for style in &self.styles {
            if style.is_default {
                ids.insert(0, style.identifier.clone());
            } else {
                ids.push(style.identifier.clone());
            }
        }
        ids
    }

    /// Tile `ResourceURL` templates, preferring the given format.
    pub fn tile_template(&self, format: &str) -> Option<&ResourceUrl> {
        let tiles = || {
            self.resource_urls
                .iter()
                .filter(|r| r.resource_type.eq_ignore_ascii_case("tile"))
        };
        tiles().find(|r| r.format == format).or_else(|| tiles().next())
    }
}

/// Decoded WMTS capabilities document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmtsCapabilities {
    pub version: String,
    pub service: ServiceMetadata,
    pub operations: Vec<OperationMetadata>,
    pub layers: Vec<WmtsLayer>,
    pub tile_matrix_sets: Vec<TileMatrixSet>,
}

impl WmtsCapabilities {
    pub fn from_xml(xml: &str) -> WmsResult<Self> {
        let root = XmlElement::parse(xml)?;
        Self::from_element(&root)
    }

    pub fn from_element(root: &XmlElement) -> WmsResult<Self> {
        if root.name != "Capabilities" {
            return Err(WmsError::MalformedDocument(format!(
                "unexpected root element <{}> for a WMTS document",
                root.name
            )));
        }

        let service = root
            .child("ServiceIdentification")
            .map(|s| ServiceMetadata {
                name: s.child_text("ServiceType"),
                title: s.child_text("Title"),
                abstract_text: s.child_text("Abstract"),
                keywords: s
                    .child("Keywords")
                    .map(|k| {
                        k.children_named("Keyword")
                            .map(|w| w.text.trim().to_string())
                            .collect()
                    })
                    .unwrap_or_default(),
                online_resource: None,
            })
            .unwrap_or_default();

        let operations = root
            .child("OperationsMetadata")
            .map(|m| m.children_named("Operation").filter_map(decode_operation).collect())
            .unwrap_or_default();

        let contents = root.child("Contents");
        let layers = contents
            .map(|c| c.children_named("Layer").filter_map(decode_layer).collect())
            .unwrap_or_default();
        let tile_matrix_sets = contents
            .map(|c| {
                c.children_named("TileMatrixSet")
                    .filter_map(decode_tile_matrix_set)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            version: root.attr("version").unwrap_or("1.0.0").to_string(),
            service,
            operations,
            layers,
            tile_matrix_sets,
        })
    }

    pub fn operation(&self, name: &str) -> Option<&OperationMetadata> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn layer(&self, identifier: &str) -> Option<&WmtsLayer> {
        self.layers.iter().find(|l| l.identifier == identifier)
    }

    pub fn tile_matrix_set(&self, identifier: &str) -> Option<&TileMatrixSet> {
        self.tile_matrix_sets
            .iter()
            .find(|s| s.identifier == identifier)
    }
}

fn decode_operation(el: &XmlElement) -> Option<OperationMetadata> {
    let name = el.attr("name")?.to_string();
    let get = el
        .children_named("DCP")
        .filter_map(|dcp| dcp.child("HTTP"))
        .flat_map(|http| http.children_named("Get"))
        .filter_map(|g| {
            let href = g.attr("href")?.to_string();
            let encodings = g
                .children_named("Constraint")
                .filter(|c| c.attr("name") == Some("GetEncoding"))
                .filter_map(|c| c.child("AllowedValues"))
                .flat_map(|v| v.children_named("Value"))
                .map(|v| v.text.trim().to_string())
                .collect();
            Some(DcpGet { href, encodings })
        })
        .collect();
    Some(OperationMetadata { name, get })
}

fn decode_layer(el: &XmlElement) -> Option<WmtsLayer> {
    let identifier = el.child_text("Identifier")?;

    let styles = el
        .children_named("Style")
        .filter_map(|s| {
            Some(WmtsStyle {
                identifier: s.child_text("Identifier")?,
                title: s.child_text("Title"),
                is_default: s.attr("isDefault").map(|v| v.trim() == "true").unwrap_or(false),
                legend_url: s
                    .child("LegendURL")
                    .and_then(|l| l.attr("href"))
                    .map(str::to_string),
            })
        })
        .collect();

    let dimensions = el
        .children_named("Dimension")
        .filter_map(|d| {
            Some(DimensionDecl {
                name: d.child_text("Identifier")?,
                units: d.child_text("UOM"),
                default: d.child_text("Default"),
                values_raw: d
                    .children_named("Value")
                    .map(|v| v.text.trim().to_string())
                    .collect(),
            })
        })
        .collect();

    Some(WmtsLayer {
        identifier,
        title: el.child_text("Title"),
        abstract_text: el.child_text("Abstract"),
        wgs84_bounding_box: el.child("WGS84BoundingBox").and_then(corner_bbox),
        styles,
        formats: texts(el, "Format"),
        info_formats: texts(el, "InfoFormat"),
        dimensions,
        tile_matrix_set_links: el
            .children_named("TileMatrixSetLink")
            .filter_map(|l| l.child_text("TileMatrixSet"))
            .map(|tile_matrix_set| TileMatrixSetLink { tile_matrix_set })
            .collect(),
        resource_urls: el
            .children_named("ResourceURL")
            .filter_map(|r| {
                Some(ResourceUrl {
                    format: r.attr("format")?.to_string(),
                    resource_type: r.attr("resourceType")?.to_string(),
                    template: r.attr("template")?.to_string(),
                })
            })
            .collect(),
    })
}

fn decode_tile_matrix_set(el: &XmlElement) -> Option<TileMatrixSet> {
    let tile_matrices = el
        .children_named("TileMatrix")
        .filter_map(|m| {
            let corner = pair(&m.child_text("TopLeftCorner")?)?;
            Some(TileMatrix {
                identifier: m.child_text("Identifier")?,
                scale_denominator: m.child_text("ScaleDenominator")?.parse().ok()?,
                top_left_corner: corner,
                tile_width: m.child_text("TileWidth")?.parse().ok()?,
                tile_height: m.child_text("TileHeight")?.parse().ok()?,
                matrix_width: m.child_text("MatrixWidth")?.parse().ok()?,
                matrix_height: m.child_text("MatrixHeight")?.parse().ok()?,
            })
        })
        .collect();

    Some(TileMatrixSet {
        identifier: el.child_text("Identifier")?,
        crs: el.child_text("SupportedCRS")?,
        bounding_box: el.child("BoundingBox").and_then(corner_bbox),
        well_known_scale_set: el.child_text("WellKnownScaleSet"),
        tile_matrices,
    })
}

fn corner_bbox(el: &XmlElement) -> Option<BoundingBox> {
    let (min_x, min_y) = pair(&el.child_text("LowerCorner")?)?;
    let (max_x, max_y) = pair(&el.child_text("UpperCorner")?)?;
    Some(BoundingBox::new(min_x, min_y, max_x, max_y))
}

fn pair(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split_whitespace().map(|p| p.parse::<f64>());
    match (parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b))) => Some((a, b)),
        _ => None,
    }
}

fn texts(el: &XmlElement, tag: &str) -> Vec<String> {
    el.children_named(tag)
        .map(|f| f.text.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_order_puts_default_first() {
        let layer = WmtsLayer {
            identifier: "l".to_string(),
            styles: vec![
                WmtsStyle {
                    identifier: "night".to_string(),
                    title: None,
                    is_default: false,
                    legend_url: None,
                },
                WmtsStyle {
                    identifier: "day".to_string(),
                    title: None,
                    is_default: true,
                    legend_url: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(layer.ordered_style_ids(), vec!["day", "night"]);
    }

    #[test]
    fn test_encoding_support() {
        let get = DcpGet {
            href: "http://example.com/wmts?".to_string(),
            encodings: vec!["RESTful".to_string()],
        };
        assert!(get.supports(RequestEncoding::Rest));
        assert!(!get.supports(RequestEncoding::Kvp));
    }

    #[test]
    fn test_pair_parsing() {
        assert_eq!(pair("-180 90"), Some((-180.0, 90.0)));
        assert_eq!(pair("-180"), None);
    }
}
