//! Probe profiles.
//!
//! A profile is a YAML file bundling client settings, extra projections and
//! a default layer request, so repeated probes of one service stay short.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use capabilities::{ClientConfig, LayerRequest};
use wms_common::{merge_json, ProjectionDescriptor, ProjectionRegistry};

/// Root of a probe profile file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Client settings; the environment is used when absent.
    pub client: Option<ClientConfig>,
    /// Projections registered on top of the built-in ones
    pub projections: Vec<ProjectionDescriptor>,
    /// Defaults for every layer request, in the loose request format
    pub request: Value,
}

impl Profile {
    /// Load a profile from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {:?}", path))?;
        let profile: Profile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse profile {:?}", path))?;

        info!(
            path = %path.display(),
            projections = profile.projections.len(),
            "Loaded probe profile"
        );
        Ok(profile)
    }

    /// Load `path` when given, an empty profile otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        self.client.clone().unwrap_or_else(ClientConfig::from_env)
    }

    /// Built-in projections plus the profile's own.
    pub fn registry(&self) -> ProjectionRegistry {
        let mut registry = ProjectionRegistry::with_defaults();
        for projection in &self.projections {
            debug!(code = %projection.code, "Registering profile projection");
            registry.register(projection.clone());
        }
        registry
    }

    /// Layer request from the profile defaults with `overrides` applied.
    ///
    /// List-valued overrides replace the profile lists instead of extending
    /// them, so preference order stays the caller's.
    pub fn layer_request(&self, overrides: &Value) -> Result<LayerRequest> {
        let mut request = match &self.request {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };

        if let (Value::Object(base), Value::Object(wanted)) = (&mut request, overrides) {
            for (key, value) in wanted {
                if value.is_array() {
                    base.remove(key);
                    base.remove(key.trim_end_matches('s'));
                }
            }
        }
        merge_json(&mut request, &[overrides]);

        serde_json::from_value(request).context("Invalid layer request")
    }
}

/// Request overrides collected from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub url: String,
    pub layer: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub projections: Vec<String>,
    pub strict_projection: bool,
    pub bbox: Option<String>,
    pub styles: Vec<String>,
    pub formats: Vec<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub matrix_set: Option<String>,
    pub params: Vec<(String, String)>,
}

impl RequestOverrides {
    /// JSON object holding only the flags that were given.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("url".to_string(), Value::from(self.url.clone()));
        map.insert("layer".to_string(), Value::from(self.layer.clone()));

        let optional = [
            ("service", &self.service),
            ("version", &self.version),
            ("bbox", &self.bbox),
            ("matrix_set", &self.matrix_set),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::from(value.clone()));
            }
        }

        let lists = [
            ("projections", &self.projections),
            ("styles", &self.styles),
            ("formats", &self.formats),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                map.insert(key.to_string(), Value::from(values.clone()));
            }
        }

        if self.strict_projection {
            map.insert("strict_projection".to_string(), Value::Bool(true));
        }
        if let Some(width) = self.width {
            map.insert("width".to_string(), Value::from(width));
        }
        if let Some(height) = self.height {
            map.insert("height".to_string(), Value::from(height));
        }
        if !self.params.is_empty() {
            let params: Map<String, Value> = self
                .params
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect();
            map.insert("params".to_string(), Value::Object(params));
        }

        Value::Object(map)
    }
}

/// Parse a `KEY=VALUE` command-line pair.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_utils::write_temp_file;
    use wms_protocol::ServiceType;

    const PROFILE: &str = r#"
client:
  http_timeout_secs: 5
  cache_ttl_secs: 600
projections:
  - code: "EPSG:2154"
    kind: other
    units: meters
    extent: { min_x: -378305.81, min_y: 6093283.21, max_x: 1212610.74, max_y: 7186901.68 }
    world_extent: { min_x: -9.86, min_y: 41.15, max_x: 10.38, max_y: 51.56 }
request:
  service: WMS
  projection: "EPSG:3857,EPSG:4326"
  format: image/jpeg
  params:
    DPI: "96"
"#;

    fn profile_file(content: &str) -> (TempDir, PathBuf) {
        write_temp_file("profile.yaml", content)
    }

    #[test]
    fn test_load_profile() {
        let (_dir, path) = profile_file(PROFILE);
        let profile = Profile::load(&path).unwrap();

        let client = profile.client_config();
        assert_eq!(client.http_timeout_secs, 5);
        assert_eq!(client.connect_timeout_secs, 10);
        assert_eq!(client.cache_ttl_secs, Some(600));

        let registry = profile.registry();
        assert!(registry.has("EPSG:2154"));
        assert!(registry.has("EPSG:3857"));
    }

    #[test]
    fn test_missing_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(Profile::load(&missing).is_err());
        assert!(Profile::load_optional(None).unwrap().request.is_null());
    }

    #[test]
    fn test_overrides_replace_profile_lists() {
        let (_dir, path) = profile_file(PROFILE);
        let profile = Profile::load(&path).unwrap();
        let overrides = RequestOverrides {
            url: "http://maps.example.com/wms".to_string(),
            layer: "STATES".to_string(),
            projections: vec!["EPSG:4326".to_string()],
            params: vec![("TRANSPARENT".to_string(), "TRUE".to_string())],
            ..Default::default()
        };

        let request = profile.layer_request(&overrides.to_value()).unwrap();
        assert_eq!(request.url, "http://maps.example.com/wms");
        assert_eq!(request.layer, "STATES");
        assert_eq!(request.service, Some(ServiceType::Wms));
        assert_eq!(request.projections, vec!["EPSG:4326"]);
        assert_eq!(request.formats, vec!["image/jpeg"]);
        assert_eq!(request.params.get("DPI").map(String::as_str), Some("96"));
        assert_eq!(request.params.get("TRANSPARENT").map(String::as_str), Some("TRUE"));
    }

    #[test]
    fn test_bbox_override_is_parsed() {
        let overrides = RequestOverrides {
            url: "http://maps.example.com/wms".to_string(),
            layer: "STATES".to_string(),
            bbox: Some("-93,40,-75,50".to_string()),
            ..Default::default()
        };
        let request = Profile::default()
            .layer_request(&overrides.to_value())
            .unwrap();
        let bbox = request.bbox.unwrap();
        assert_eq!(bbox.min_x, -93.0);
        assert_eq!(bbox.max_y, 50.0);
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("DPI=96").unwrap(),
            ("DPI".to_string(), "96".to_string())
        );
        assert!(parse_key_value("DPI").is_err());
        assert!(parse_key_value("=96").is_err());
    }
}
