//! Key-value-pair URL handling for OGC requests.

use std::collections::BTreeMap;
use url::{form_urlencoded, Url};

use wms_common::{WmsError, WmsResult};

/// A URL split into its base (`scheme://host[:port]/path`) and query params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub url: String,
    pub params: BTreeMap<String, String>,
}

/// Split `href` into base URL and decoded query params.
///
/// Only `key=value` segments are kept; bare keys are dropped. With
/// `upper_keys`, keys are upper-cased.
pub fn parse_params(href: &str, upper_keys: bool) -> WmsResult<ParsedUrl> {
    let parsed = Url::parse(href.trim()).map_err(|e| WmsError::InvalidUrl {
        url: href.to_string(),
        message: e.to_string(),
    })?;

    let host = parsed.host_str().ok_or_else(|| WmsError::InvalidUrl {
        url: href.to_string(),
        message: "URL has no host".to_string(),
    })?;
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let url = format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path());

    let mut params = BTreeMap::new();
    if let Some(query) = parsed.query() {
        for segment in query.split('&').filter(|s| s.contains('=')) {
            if let Some((key, value)) = form_urlencoded::parse(segment.as_bytes()).next() {
                if key.is_empty() {
                    continue;
                }
                let key = if upper_keys {
                    key.to_uppercase()
                } else {
                    key.into_owned()
                };
                params.insert(key, value.into_owned());
            }
        }
    }

    Ok(ParsedUrl { url, params })
}

/// Build a canonical request URL.
///
/// The URL's own params and `params` are merged (`params` win), keys are
/// upper-cased and sorted, values percent-encoded. The result is stable for
/// equal inputs, so it doubles as a cache key.
pub fn compute_url(url: &str, params: Option<&BTreeMap<String, String>>) -> WmsResult<String> {
    let parsed = parse_params(url, false)?;

    let mut merged = upper_case_keys(&parsed.params);
    if let Some(params) = params {
        merged.extend(upper_case_keys(params));
    }

    if merged.is_empty() {
        return Ok(parsed.url);
    }

    let query = merged
        .iter()
        .map(|(k, v)| format!("{}={}", k, form_urlencoded::byte_serialize(v.as_bytes()).collect::<String>()))
        .collect::<Vec<_>>()
        .join("&");
    Ok(format!("{}?{}", parsed.url, query))
}

/// Copy of `params` with every key upper-cased.
pub fn upper_case_keys(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    params
        .iter()
        .map(|(k, v)| (k.to_uppercase(), v.clone()))
        .collect()
}

/// Whether the URL names a static capabilities document rather than a
/// KVP endpoint.
pub fn is_static_document(url: &str) -> bool {
    url.trim().to_ascii_lowercase().ends_with(".xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_params_splits_base_and_query() {
        let parsed =
            parse_params("http://example.com:8080/geoserver/wms?service=WMS&version=1.3.0&flag", true)
                .unwrap();
        assert_eq!(parsed.url, "http://example.com:8080/geoserver/wms");
        assert_eq!(parsed.params, params(&[("SERVICE", "WMS"), ("VERSION", "1.3.0")]));
    }

    #[test]
    fn test_parse_params_decodes_values_and_drops_default_port() {
        let parsed = parse_params("http://example.com:80/wms?format=image%2Fpng&layers=a", false).unwrap();
        assert_eq!(parsed.url, "http://example.com/wms");
        assert_eq!(parsed.params.get("format").map(String::as_str), Some("image/png"));
        assert_eq!(parsed.params.get("layers").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_parse_params_rejects_relative_url() {
        assert!(matches!(
            parse_params("/wms?service=WMS", false),
            Err(WmsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_compute_url_sorts_and_uppercases() {
        let url = compute_url(
            "http://example.com/wms?map=/data/world.map",
            Some(&params(&[("version", "1.3.0"), ("SERVICE", "WMS"), ("Request", "GetCapabilities")])),
        )
        .unwrap();
        assert_eq!(
            url,
            "http://example.com/wms?MAP=%2Fdata%2Fworld.map&REQUEST=GetCapabilities&SERVICE=WMS&VERSION=1.3.0"
        );
    }

    #[test]
    fn test_compute_url_params_override_url_params() {
        let url = compute_url(
            "http://example.com/wms?VERSION=1.1.1",
            Some(&params(&[("version", "1.3.0")])),
        )
        .unwrap();
        assert_eq!(url, "http://example.com/wms?VERSION=1.3.0");
    }

    #[test]
    fn test_compute_url_is_idempotent() {
        let once = compute_url(
            "http://example.com/wms?a=1",
            Some(&params(&[("TIME", "2020-01-01T00:00:00Z"), ("BBOX", "-180,-90,180,90")])),
        )
        .unwrap();
        let twice = compute_url(&once, None).unwrap();
        assert_eq!(once, twice);

        let reparsed = parse_params(&once, false).unwrap();
        assert_eq!(reparsed.params.get("BBOX").map(String::as_str), Some("-180,-90,180,90"));
    }

    #[test]
    fn test_compute_url_without_params() {
        assert_eq!(
            compute_url("http://example.com/capabilities.xml", None).unwrap(),
            "http://example.com/capabilities.xml"
        );
    }

    #[test]
    fn test_is_static_document() {
        assert!(is_static_document("http://example.com/WMTSCapabilities.XML"));
        assert!(!is_static_document("http://example.com/wms"));
    }
}
