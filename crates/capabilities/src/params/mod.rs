//! Derivation of ready-to-render layer configurations from a negotiated
//! capabilities document.

mod wms;
mod wmts;

pub use wms::{get_map_urls, overview_url, OverviewOptions};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use projection::transform_extent;
use wms_common::crs::normalize_crs_code;
use wms_common::{
    BoundingBox, Dimension, ProjectionDescriptor, ProjectionRegistry, TileGrid,
    TileSize, WmsError, WmsResult,
};
use wms_protocol::{
    list_layers, CapabilityContent, CapabilityDocument, RequestEncoding, ResolvedLayer,
    ServiceType, WmtsLayer,
};

use crate::negotiator::CapabilitiesOptions;

/// Projection of `LayerRequest::bbox` and of overview extents.
pub(crate) const LON_LAT: &str = "CRS:84";

const DEFAULT_FORMAT: &str = "image/png";

/// What the caller wants displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerRequest {
    /// Service endpoint, optionally carrying `SERVICE`/`VERSION` params
    pub url: String,
    pub service: Option<ServiceType>,
    /// Version tried first during negotiation
    pub version: Option<String>,
    /// WMS layer name or WMTS layer identifier
    pub layer: String,
    /// Wanted projections in order of preference
    #[serde(alias = "projection", deserialize_with = "one_or_many")]
    pub projections: Vec<String>,
    pub strict_projection: bool,
    /// Wanted extent in lon/lat, as `minx,miny,maxx,maxy` or an array
    #[serde(deserialize_with = "bbox_input", serialize_with = "bbox_output")]
    pub bbox: Option<BoundingBox>,
    #[serde(alias = "style", deserialize_with = "one_or_many")]
    pub styles: Vec<String>,
    #[serde(alias = "format", deserialize_with = "one_or_many")]
    pub formats: Vec<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Wanted dimension values, e.g. `TIME`
    pub dimensions: BTreeMap<String, String>,
    /// Extra GetMap parameters passed through unchanged
    pub params: BTreeMap<String, String>,
    /// Extra options for the tile source, merged over the defaults
    pub source: Value,
    /// Preferred WMTS tile matrix set
    pub matrix_set: Option<String>,
}

impl LayerRequest {
    pub fn new(url: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            layer: layer.into(),
            ..Default::default()
        }
    }

    /// Service named by the request, else by the URL, else WMS.
    pub fn service_type(&self) -> WmsResult<ServiceType> {
        if let Some(service) = self.service {
            return Ok(service);
        }
        match CapabilitiesOptions::from_url(&self.url)?.service {
            Some(service) => service.parse(),
            None => Ok(ServiceType::Wms),
        }
    }

    /// Negotiation chain for the request's endpoint: the preferred version
    /// first, then every other version known for the service.
    pub fn negotiation_attempts(&self) -> WmsResult<Vec<CapabilitiesOptions>> {
        let mut base = CapabilitiesOptions::from_url(&self.url)?.with_service(self.service_type()?);
        if let Some(version) = &self.version {
            base = base.with_version(version.clone());
        }
        Ok(base.version_chain())
    }

    /// Requested tile size, 256×256 unless overridden.
    pub fn tile_size(&self) -> TileSize {
        let default = TileSize::default();
        TileSize::new(
            self.width.unwrap_or(default.width),
            self.height.unwrap_or(default.height),
        )
    }
}

/// A style offered for the layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Only WMTS declares a default style; always false for WMS
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_url: Option<String>,
}

/// Where tiles are requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Endpoint {
    #[serde(rename = "url")]
    Single(String),
    #[serde(rename = "urls")]
    Multiple(Vec<String>),
}

impl Endpoint {
    pub(crate) fn from_urls(mut urls: Vec<String>) -> Option<Self> {
        match urls.len() {
            0 => None,
            1 => urls.pop().map(Endpoint::Single),
            _ => Some(Endpoint::Multiple(urls)),
        }
    }

    pub fn urls(&self) -> Vec<&str> {
        match self {
            Endpoint::Single(url) => vec![url.as_str()],
            Endpoint::Multiple(urls) => urls.iter().map(String::as_str).collect(),
        }
    }
}

/// Source parameters for the tile layer, per protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum SourceParams {
    Wms {
        /// GetMap parameters: `LAYERS`, `STYLES`, `FORMAT`, dimensions, extras
        params: BTreeMap<String, String>,
        version: String,
        tile_grid: TileGrid,
        options: Value,
    },
    Wmts {
        layer: String,
        style: String,
        format: String,
        matrix_set: String,
        request_encoding: RequestEncoding,
        dimensions: BTreeMap<String, String>,
        tile_grid: TileGrid,
        options: Value,
    },
}

/// The document's own description of the layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CapabilityLayer {
    Wms(ResolvedLayer),
    Wmts(WmtsLayer),
}

impl CapabilityLayer {
    pub fn name(&self) -> Option<&str> {
        match self {
            CapabilityLayer::Wms(layer) => layer.name(),
            CapabilityLayer::Wmts(layer) => Some(&layer.identifier),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            CapabilityLayer::Wms(layer) => layer.title(),
            CapabilityLayer::Wmts(layer) => layer.title.as_deref(),
        }
    }
}

/// Everything a map layer factory needs to display one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerConfiguration {
    pub title: Option<String>,
    /// Maximal extent in the projection, east-north
    pub extent: BoundingBox,
    pub projection: ProjectionDescriptor,
    pub capability_layer: CapabilityLayer,
    pub capability_url: String,
    pub dimensions: BTreeMap<String, Dimension>,
    pub styles: Vec<StyleDescriptor>,
    pub format: String,
    pub tile_size: TileSize,
    pub source: SourceParams,
    pub endpoint: Endpoint,
}

/// Derive the configuration of `request.layer` from `doc`.
pub fn build_layer_configuration(
    doc: &CapabilityDocument,
    request: &LayerRequest,
    registry: &ProjectionRegistry,
) -> WmsResult<LayerConfiguration> {
    match &doc.content {
        CapabilityContent::Wms(caps) => wms::build(doc, caps, request, registry),
        CapabilityContent::Wmts(caps) => wmts::build(doc, caps, request, registry),
    }
}

/// Every displayable layer of `doc`.
pub fn capability_layers(doc: &CapabilityDocument, registry: &ProjectionRegistry) -> Vec<CapabilityLayer> {
    match &doc.content {
        CapabilityContent::Wms(caps) => caps
            .root_layer
            .as_ref()
            .map(|root| {
                list_layers(root, registry)
                    .into_iter()
                    .map(CapabilityLayer::Wms)
                    .collect()
            })
            .unwrap_or_default(),
        CapabilityContent::Wmts(caps) => caps.layers.iter().cloned().map(CapabilityLayer::Wmts).collect(),
    }
}

/// URL the document can be fetched again from.
pub fn capability_url(doc: &CapabilityDocument) -> WmsResult<String> {
    if !doc.source_url.is_empty() {
        return Ok(doc.source_url.clone());
    }
    match &doc.content {
        CapabilityContent::Wms(caps) => wms::get_capabilities_url(caps),
        CapabilityContent::Wmts(caps) => wmts::get_capabilities_url(caps),
    }
}

/// First wanted entry the offer contains, else the first offered, else
/// `fallback`.
pub(crate) fn pick_wanted(offered: &[String], wanted: &[String], fallback: &str) -> String {
    wanted
        .iter()
        .find(|w| offered.contains(w))
        .or_else(|| offered.first())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

pub(crate) fn pick_format(offered: &[String], wanted: &[String]) -> String {
    pick_wanted(offered, wanted, DEFAULT_FORMAT)
}

/// Caller extent in lon/lat, reprojected into `target` east-north.
pub(crate) fn lon_lat_override(
    bbox: Option<&BoundingBox>,
    target: &ProjectionDescriptor,
    registry: &ProjectionRegistry,
) -> WmsResult<Option<BoundingBox>> {
    let Some(bbox) = bbox.filter(|b| !b.is_empty()) else {
        return Ok(None);
    };
    let lon_lat = registry
        .get(LON_LAT)
        .ok_or_else(|| WmsError::ProjectionNotFound(LON_LAT.to_string()))?;
    Ok(Some(transform_extent(bbox, lon_lat, target)?))
}

/// Source options: defaults with the caller's options merged over them.
pub(crate) fn source_options(request: &LayerRequest) -> Value {
    let mut options = serde_json::json!({ "crossOrigin": "anonymous" });
    wms_common::merge_json(&mut options, &[&request.source]);
    options
}

pub(crate) fn same_crs(a: &str, b: &str) -> bool {
    normalize_crs_code(a) == normalize_crs_code(b)
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        Some(OneOrMany::Many(values)) => values,
    })
}

fn bbox_input<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BboxInput {
        Text(String),
        Array([f64; 4]),
        Struct(BoundingBox),
    }

    match Option::<BboxInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BboxInput::Text(text)) => BoundingBox::from_wms_string(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(BboxInput::Array(values)) => Ok(Some(BoundingBox::from_array(values))),
        Some(BboxInput::Struct(bbox)) => Ok(Some(bbox)),
    }
}

fn bbox_output<S>(bbox: &Option<BoundingBox>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    bbox.map(|b| b.to_array()).serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_request_accepts_loose_json() {
        let request: LayerRequest = serde_json::from_value(serde_json::json!({
            "url": "http://maps.example.com/wms",
            "layer": "topp:states",
            "projection": "EPSG:3857",
            "bbox": "-10,-5,10,5",
            "formats": ["image/jpeg", "image/png"],
            "style": "population"
        }))
        .unwrap();

        assert_eq!(request.projections, vec!["EPSG:3857"]);
        assert_eq!(request.bbox, Some(BoundingBox::new(-10.0, -5.0, 10.0, 5.0)));
        assert_eq!(request.formats.len(), 2);
        assert_eq!(request.styles, vec!["population"]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["bbox"], serde_json::json!([-10.0, -5.0, 10.0, 5.0]));
    }

    #[test]
    fn test_negotiation_attempts_from_url() {
        let request = LayerRequest::new("http://maps.example.com/wms?SERVICE=WMS&VERSION=1.1.1", "a");
        let attempts = request.negotiation_attempts().unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].version.as_deref(), Some("1.1.1"));
        assert_eq!(attempts[1].version.as_deref(), Some("1.3.0"));

        let mut wmts = LayerRequest::new("http://tiles.example.com/wmts", "a");
        wmts.service = Some(ServiceType::Wmts);
        let attempts = wmts.negotiation_attempts().unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].service.as_deref(), Some("WMTS"));
    }

    #[test]
    fn test_pick_wanted() {
        let offered = vec!["image/png".to_string(), "image/jpeg".to_string()];
        assert_eq!(pick_format(&offered, &["image/jpeg".to_string()]), "image/jpeg");
        assert_eq!(pick_format(&offered, &["image/webp".to_string()]), "image/png");
        assert_eq!(pick_format(&[], &[]), "image/png");
    }

    #[test]
    fn test_endpoint_from_urls() {
        assert_eq!(Endpoint::from_urls(vec![]), None);
        assert_eq!(
            Endpoint::from_urls(vec!["a".to_string()]),
            Some(Endpoint::Single("a".to_string()))
        );
        let many = Endpoint::from_urls(vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(many.urls(), vec!["a", "b"]);
        assert_eq!(serde_json::to_value(&many).unwrap()["urls"][1], "b");
    }

    #[test]
    fn test_source_options_merge_over_defaults() {
        let mut request = LayerRequest::default();
        request.source = serde_json::json!({ "wrapX": false, "crossOrigin": null });
        let options = source_options(&request);
        assert_eq!(options["crossOrigin"], "anonymous");
        assert_eq!(options["wrapX"], false);
    }
}
