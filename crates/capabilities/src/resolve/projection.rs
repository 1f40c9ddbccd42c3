use wms_common::crs::normalize_crs_code;
use wms_common::{ProjectionDescriptor, ProjectionRegistry, WmsError, WmsResult};

/// Pick the projection a layer is displayed in.
///
/// `preferred` is searched in order (or `candidates` when it is empty); the
/// first code that the layer advertises and the registry knows wins. Unless
/// `strict`, the first registry-known candidate is the fallback.
pub fn resolve_projection<'a>(
    candidates: &[String],
    preferred: &[String],
    strict: bool,
    registry: &'a ProjectionRegistry,
    layer_name: &str,
) -> WmsResult<&'a ProjectionDescriptor> {
    let advertised: Vec<String> = candidates.iter().map(|c| normalize_crs_code(c)).collect();
    let search = if preferred.is_empty() { candidates } else { preferred };

    let wanted = search
        .iter()
        .filter(|code| advertised.contains(&normalize_crs_code(code)))
        .find_map(|code| registry.get(code));

    let fallback = || {
        if strict {
            None
        } else {
            candidates.iter().find_map(|code| registry.get(code))
        }
    };

    wanted
        .or_else(fallback)
        .ok_or_else(|| WmsError::ProjectionNotFound(layer_name.to_string()))
}
