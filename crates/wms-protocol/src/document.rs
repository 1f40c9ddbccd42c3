//! Service types and the parsed capability document shared by both protocols.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use wms_common::{Dimension, WmsError, WmsResult};

use crate::capabilities::WmsCapabilities;
use crate::wmts::WmtsCapabilities;

/// OGC service family of a capabilities endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceType {
    Wms,
    Wmts,
}

impl ServiceType {
    /// Protocol versions tried during negotiation, most preferred first.
    pub fn known_versions(&self) -> &'static [&'static str] {
        match self {
            ServiceType::Wms => &["1.3.0", "1.1.1"],
            ServiceType::Wmts => &["1.0.0"],
        }
    }

    /// Substrings of which at least one must occur in a genuine document.
    pub fn signatures(&self) -> &'static [&'static str] {
        match self {
            ServiceType::Wms => &[
                "http://www.opengis.net/wms",
                "WMT_MS_Capabilities",
                "WMS_Capabilities",
            ],
            ServiceType::Wmts => &["http://www.opengis.net/wmts/1.0"],
        }
    }

    pub fn matches_signature(&self, raw: &str) -> bool {
        self.signatures().iter().any(|s| raw.contains(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Wms => "WMS",
            ServiceType::Wmts => "WMTS",
        }
    }
}

impl FromStr for ServiceType {
    type Err = WmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WMS" => Ok(ServiceType::Wms),
            "WMTS" => Ok(ServiceType::Wmts),
            _ => Err(WmsError::UnsupportedService(s.to_string())),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimension as declared in a document, before value expansion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Raw value strings; WMS has one, WMTS one per `Value` element
    pub values_raw: Vec<String>,
}

impl DimensionDecl {
    pub fn to_dimension(&self) -> Dimension {
        Dimension::from_declaration(
            &self.name,
            &self.values_raw,
            self.default.clone(),
            self.units.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum CapabilityContent {
    Wms(WmsCapabilities),
    Wmts(WmtsCapabilities),
}

/// A decoded capabilities document tagged with the URL it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityDocument {
    pub source_url: String,
    pub content: CapabilityContent,
}

impl CapabilityDocument {
    /// Decode `raw` with the decoder for `service`.
    pub fn decode(raw: &str, service: ServiceType, source_url: &str) -> WmsResult<Self> {
        let content = match service {
            ServiceType::Wms => CapabilityContent::Wms(WmsCapabilities::from_xml(raw)?),
            ServiceType::Wmts => CapabilityContent::Wmts(WmtsCapabilities::from_xml(raw)?),
        };
        Ok(Self {
            source_url: source_url.to_string(),
            content,
        })
    }

    pub fn service_type(&self) -> ServiceType {
        match self.content {
            CapabilityContent::Wms(_) => ServiceType::Wms,
            CapabilityContent::Wmts(_) => ServiceType::Wmts,
        }
    }

    pub fn version(&self) -> &str {
        match &self.content {
            CapabilityContent::Wms(wms) => &wms.version,
            CapabilityContent::Wmts(wmts) => &wmts.version,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match &self.content {
            CapabilityContent::Wms(wms) => wms.service.title.as_deref(),
            CapabilityContent::Wmts(wmts) => wmts.service.title.as_deref(),
        }
    }

    pub fn as_wms(&self) -> Option<&WmsCapabilities> {
        match &self.content {
            CapabilityContent::Wms(wms) => Some(wms),
            CapabilityContent::Wmts(_) => None,
        }
    }

    pub fn as_wmts(&self) -> Option<&WmtsCapabilities> {
        match &self.content {
            CapabilityContent::Wmts(wmts) => Some(wmts),
            CapabilityContent::Wms(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_from_str() {
        assert_eq!("wms".parse::<ServiceType>().unwrap(), ServiceType::Wms);
        assert_eq!("WMTS".parse::<ServiceType>().unwrap(), ServiceType::Wmts);
        assert!(matches!(
            "WFS".parse::<ServiceType>(),
            Err(WmsError::UnsupportedService(s)) if s == "WFS"
        ));
    }

    #[test]
    fn test_signatures() {
        assert!(ServiceType::Wms.matches_signature("<WMT_MS_Capabilities version=\"1.1.1\">"));
        assert!(!ServiceType::Wms.matches_signature("<html><body>Not found</body></html>"));
        assert!(ServiceType::Wmts
            .matches_signature("<Capabilities xmlns=\"http://www.opengis.net/wmts/1.0\">"));
    }

    #[test]
    fn test_dimension_decl_expands() {
        let decl = DimensionDecl {
            name: "time".to_string(),
            units: Some("ISO8601".to_string()),
            default: None,
            values_raw: vec!["2020-01-01/2020-01-02/P1D".to_string()],
        };
        let dim = decl.to_dimension();
        assert_eq!(dim.name, "TIME");
        assert_eq!(dim.values.len(), 2);
    }
}
