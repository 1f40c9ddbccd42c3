use tracing::debug;

use wms_common::{
    apply_defaults, ProjectionDescriptor, ProjectionRegistry, TileGrid, TileMatrixSet, WmsError,
    WmsResult,
};
use wms_protocol::wmts::DcpGet;
use wms_protocol::{
    compute_url, parse_params, upper_case_keys, CapabilityDocument, RequestEncoding, ServiceType,
    WmtsCapabilities, WmtsLayer,
};

use super::{
    lon_lat_override, pick_format, pick_wanted, same_crs, source_options, CapabilityLayer,
    Endpoint, LayerConfiguration, LayerRequest, SourceParams, StyleDescriptor, LON_LAT,
};
use crate::resolve::{resolve_dimensions, resolve_projection};

/// GetCapabilities URL rebuilt from the operations metadata.
pub(crate) fn get_capabilities_url(caps: &WmtsCapabilities) -> WmsResult<String> {
    let label = || {
        caps.service
            .title
            .clone()
            .unwrap_or_else(|| "the capabilities document".to_string())
    };
    let href = caps
        .operation("GetCapabilities")
        .and_then(|op| op.get.first())
        .map(|get| get.href.as_str())
        .ok_or_else(|| WmsError::GetCapabilitiesUrlNotFound(label()))?;

    let mut parsed = parse_params(href, true)?;
    parsed
        .params
        .insert("SERVICE".to_string(), ServiceType::Wmts.to_string());
    parsed
        .params
        .insert("VERSION".to_string(), caps.version.clone());
    parsed
        .params
        .insert("REQUEST".to_string(), "GetCapabilities".to_string());
    compute_url(&parsed.url, Some(&parsed.params))
}

fn linked_sets<'a>(caps: &'a WmtsCapabilities, layer: &WmtsLayer) -> Vec<&'a TileMatrixSet> {
    layer
        .tile_matrix_set_links
        .iter()
        .filter_map(|link| caps.tile_matrix_set(&link.tile_matrix_set))
        .collect()
}

/// Projection among the CRSs of the linked matrix sets, lon/lat when none
/// fits and the request is not strict.
fn layer_projection<'a>(
    sets: &[&TileMatrixSet],
    request: &LayerRequest,
    registry: &'a ProjectionRegistry,
) -> WmsResult<&'a ProjectionDescriptor> {
    let candidates: Vec<String> = sets.iter().map(|set| set.crs.clone()).collect();
    match resolve_projection(
        &candidates,
        &request.projections,
        request.strict_projection,
        registry,
        &request.layer,
    ) {
        Ok(projection) => Ok(projection),
        Err(e) if request.strict_projection => Err(e),
        Err(e) => registry.get(LON_LAT).ok_or(e),
    }
}

/// The requested set if linked, else one in the projection's CRS, else the
/// first linked set.
fn pick_matrix_set<'a>(
    sets: &[&'a TileMatrixSet],
    projection: &ProjectionDescriptor,
    preferred: Option<&str>,
) -> Option<&'a TileMatrixSet> {
    preferred
        .and_then(|id| sets.iter().find(|set| set.identifier == id))
        .or_else(|| sets.iter().find(|set| same_crs(&set.crs, &projection.code)))
        .or_else(|| sets.first())
        .copied()
}

fn tile_endpoint(
    caps: &WmtsCapabilities,
    layer: &WmtsLayer,
    format: &str,
) -> WmsResult<(RequestEncoding, Endpoint)> {
    let kvp: Vec<String> = caps
        .operation("GetTile")
        .map(|op| {
            op.get
                .iter()
                .filter(|get| get.encodings.is_empty() || get.supports(RequestEncoding::Kvp))
                .map(|get: &DcpGet| get.href.clone())
                .collect()
        })
        .unwrap_or_default();

    if let Some(endpoint) = Endpoint::from_urls(kvp) {
        return Ok((RequestEncoding::Kvp, endpoint));
    }

    layer
        .tile_template(format)
        .map(|resource| {
            (
                RequestEncoding::Rest,
                Endpoint::Single(resource.template.clone()),
            )
        })
        .ok_or_else(|| WmsError::GetTileUrlNotFound(layer.identifier.clone()))
}

pub(crate) fn build(
    doc: &CapabilityDocument,
    caps: &WmtsCapabilities,
    request: &LayerRequest,
    registry: &ProjectionRegistry,
) -> WmsResult<LayerConfiguration> {
    let layer = caps
        .layer(&request.layer)
        .ok_or_else(|| WmsError::LayerNotFound(request.layer.clone()))?;
    let capability_url = super::capability_url(doc)?;

    let sets = linked_sets(caps, layer);
    let projection = layer_projection(&sets, request, registry)?;

    let extent = match lon_lat_override(layer.wgs84_bounding_box.as_ref(), projection, registry) {
        Ok(Some(extent)) => extent,
        Ok(None) => projection.extent,
        Err(e) => {
            debug!(layer = %layer.identifier, projection = %projection.code, error = %e, "WGS84 box not transformable, using projection extent");
            projection.extent
        }
    };

    let style_ids = layer.ordered_style_ids();
    let style = pick_wanted(&style_ids, &request.styles, "");
    let styles = layer
        .styles
        .iter()
        .map(|s| StyleDescriptor {
            name: s.identifier.clone(),
            title: s.title.clone(),
            is_default: s.is_default,
            legend_url: s.legend_url.clone(),
        })
        .collect();

    let dimensions = resolve_dimensions(&layer.dimensions);
    let dimension_values = apply_defaults(&dimensions, &upper_case_keys(&request.dimensions));

    let format = pick_format(&layer.formats, &request.formats);

    let matrix_set = pick_matrix_set(&sets, projection, request.matrix_set.as_deref())
        .ok_or_else(|| {
            WmsError::MalformedDocument(format!(
                "layer {} links no known tile matrix set",
                layer.identifier
            ))
        })?;
    let set_projection = registry.get(&matrix_set.crs).unwrap_or(projection);
    let tile_grid = TileGrid::from_matrix_set(
        matrix_set,
        set_projection.units.meters_per_unit(),
        registry.axis_orientation_of(set_projection),
    );

    let (request_encoding, endpoint) = tile_endpoint(caps, layer, &format)?;

    let tile_size = if request.width.is_some() || request.height.is_some() {
        request.tile_size()
    } else {
        tile_grid.tile_size
    };

    Ok(LayerConfiguration {
        title: layer.title.clone(),
        extent,
        projection: projection.clone(),
        capability_layer: CapabilityLayer::Wmts(layer.clone()),
        capability_url,
        dimensions,
        styles,
        format: format.clone(),
        tile_size,
        source: SourceParams::Wmts {
            layer: layer.identifier.clone(),
            style,
            format,
            matrix_set: matrix_set.identifier.clone(),
            request_encoding,
            dimensions: dimension_values,
            tile_grid,
            options: source_options(request),
        },
        endpoint,
    })
}
