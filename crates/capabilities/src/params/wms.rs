use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use wms_common::{apply_defaults, BoundingBox, ProjectionRegistry, TileGrid, WmsError, WmsResult};
use wms_protocol::{
    compute_url, find_layer, parse_params, upper_case_keys, CapabilityDocument, ResolvedLayer,
    ServiceType, StyleDecl, WmsCapabilities,
};

use super::{
    lon_lat_override, pick_format, source_options, CapabilityLayer, Endpoint,
    LayerConfiguration, LayerRequest, SourceParams, StyleDescriptor,
};
use crate::resolve::{orient_extent, resolve_dimensions, resolve_extent, resolve_projection};

/// GetMap endpoints advertised by the document.
pub fn get_map_urls(caps: &WmsCapabilities) -> Vec<String> {
    caps.request
        .get_map
        .as_ref()
        .map(|op| op.get_urls.clone())
        .unwrap_or_default()
}

/// GetCapabilities URL rebuilt from the advertised endpoint.
pub(crate) fn get_capabilities_url(caps: &WmsCapabilities) -> WmsResult<String> {
    let href = caps
        .request
        .get_capabilities
        .as_ref()
        .and_then(|op| op.get_urls.first())
        .ok_or_else(|| WmsError::GetCapabilitiesUrlNotFound(document_label(caps)))?;

    let mut parsed = parse_params(href, true)?;
    parsed
        .params
        .insert("SERVICE".to_string(), ServiceType::Wms.to_string());
    parsed
        .params
        .insert("VERSION".to_string(), caps.version.clone());
    parsed
        .params
        .insert("REQUEST".to_string(), "GetCapabilities".to_string());
    compute_url(&parsed.url, Some(&parsed.params))
}

fn document_label(caps: &WmsCapabilities) -> String {
    caps.service
        .title
        .clone()
        .or_else(|| caps.service.online_resource.clone())
        .unwrap_or_else(|| "the capabilities document".to_string())
}

/// Axis order is only part of the protocol from WMS 1.3.0 on.
fn honors_axis_order(caps: &WmsCapabilities) -> bool {
    caps.version.starts_with("1.3")
}

fn pick_style<'a>(styles: &'a [StyleDecl], wanted: &[String]) -> Option<&'a StyleDecl> {
    wanted
        .iter()
        .find_map(|name| styles.iter().find(|s| &s.name == name))
}

fn style_descriptors(styles: &[StyleDecl]) -> Vec<StyleDescriptor> {
    styles
        .iter()
        .map(|style| StyleDescriptor {
            name: style.name.clone(),
            title: style.title.clone(),
            is_default: false,
            legend_url: style.legend_url.clone(),
        })
        .collect()
}

pub(crate) fn build(
    doc: &CapabilityDocument,
    caps: &WmsCapabilities,
    request: &LayerRequest,
    registry: &ProjectionRegistry,
) -> WmsResult<LayerConfiguration> {
    let layer = caps
        .root_layer
        .as_ref()
        .and_then(|root| find_layer(root, &request.layer, registry))
        .ok_or_else(|| WmsError::LayerNotFound(request.layer.clone()))?;

    let urls = get_map_urls(caps);
    let endpoint = Endpoint::from_urls(urls)
        .ok_or_else(|| WmsError::GetMapUrlNotFound(document_label(caps)))?;
    let capability_url = super::capability_url(doc)?;

    let projection = resolve_projection(
        &layer.attributes.crs,
        &request.projections,
        request.strict_projection,
        registry,
        &request.layer,
    )?;

    let honor_axis_order = honors_axis_order(caps);
    let wanted_extent = lon_lat_override(request.bbox.as_ref(), projection, registry)?
        .map(|e| orient_extent(&e, projection, honor_axis_order, registry));
    let extent = resolve_extent(
        &layer.attributes.bounding_boxes,
        projection,
        wanted_extent.as_ref(),
        honor_axis_order,
        registry,
    );

    let dimensions = resolve_dimensions(&layer.attributes.dimensions);
    let mut requested = upper_case_keys(&request.params);
    requested.extend(upper_case_keys(&request.dimensions));
    let mut params = apply_defaults(&dimensions, &requested);

    let style = pick_style(&layer.attributes.styles, &request.styles)
        .map(|s| s.name.clone())
        .unwrap_or_default();
    let format = pick_format(caps.get_map_formats(), &request.formats);
    let layer_name = layer.name().unwrap_or(&request.layer).to_string();

    params.insert("LAYERS".to_string(), layer_name);
    params.insert("STYLES".to_string(), style);
    params.insert("FORMAT".to_string(), format.clone());

    let tile_size = request.tile_size();
    // Grid spans the world extent as declared, in lon/lat degrees
    let tile_grid = TileGrid::synthesize(&projection.world_extent, tile_size);

    Ok(LayerConfiguration {
        title: layer.title().map(str::to_string),
        extent,
        projection: projection.clone(),
        styles: style_descriptors(&layer.attributes.styles),
        capability_layer: CapabilityLayer::Wms(layer),
        capability_url,
        dimensions,
        format,
        tile_size,
        source: SourceParams::Wms {
            params,
            version: caps.version.clone(),
            tile_grid,
            options: source_options(request),
        },
        endpoint,
    })
}

/// Options of an overview (thumbnail) GetMap request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewOptions {
    /// Wanted projections in order of preference
    pub projections: Vec<String>,
    /// Wanted extent in lon/lat
    pub bbox: Option<BoundingBox>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub styles: Vec<String>,
    pub formats: Vec<String>,
    /// Extra GetMap parameters; the computed ones take precedence
    pub params: BTreeMap<String, String>,
}

/// GetMap URL rendering `layer` once, for use as a thumbnail.
pub fn overview_url(
    caps: &WmsCapabilities,
    layer: &ResolvedLayer,
    options: &OverviewOptions,
    registry: &ProjectionRegistry,
) -> WmsResult<String> {
    let url = get_map_urls(caps)
        .into_iter()
        .next()
        .ok_or_else(|| WmsError::GetMapUrlNotFound(document_label(caps)))?;
    let layer_name = layer.name().unwrap_or_default();

    let projection = resolve_projection(
        &layer.attributes.crs,
        &options.projections,
        false,
        registry,
        layer_name,
    )?;

    let honor_axis_order = honors_axis_order(caps);
    let wanted_extent = lon_lat_override(options.bbox.as_ref(), projection, registry)?
        .map(|e| orient_extent(&e, projection, honor_axis_order, registry));
    let extent = resolve_extent(
        &layer.attributes.bounding_boxes,
        projection,
        wanted_extent.as_ref(),
        honor_axis_order,
        registry,
    );

    let mut params = upper_case_keys(&options.params);
    params.insert("SERVICE".to_string(), ServiceType::Wms.to_string());
    params.insert("VERSION".to_string(), caps.version.clone());
    params.insert("REQUEST".to_string(), "GetMap".to_string());
    params.insert("LAYERS".to_string(), layer_name.to_string());
    params.insert("TRANSPARENT".to_string(), "TRUE".to_string());

    let crs_key = if caps.version == "1.1.1" { "SRS" } else { "CRS" };
    params.insert(crs_key.to_string(), projection.code.clone());
    params.insert(
        "BBOX".to_string(),
        orient_extent(&extent, projection, honor_axis_order, registry).to_wms_string(),
    );
    params.insert(
        "WIDTH".to_string(),
        options.width.unwrap_or(256).to_string(),
    );
    params.insert(
        "HEIGHT".to_string(),
        options.height.unwrap_or(256).to_string(),
    );
    params.insert(
        "STYLES".to_string(),
        pick_style(&layer.attributes.styles, &options.styles)
            .map(|s| s.name.clone())
            .unwrap_or_default(),
    );
    params.insert(
        "FORMAT".to_string(),
        pick_format(caps.get_map_formats(), &options.formats),
    );

    compute_url(&url, Some(&params))
}
