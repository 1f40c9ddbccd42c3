//! Version and service negotiation against a capabilities endpoint.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use wms_common::{ProjectionRegistry, WmsError, WmsResult};
use wms_protocol::{
    compute_url, find_layer, is_static_document, parse_params, CapabilityDocument, ServiceType,
};

use crate::cache::CacheStores;
use crate::config::ClientConfig;
use crate::fetcher::{CapabilityFetcher, HttpTransport, ReqwestTransport};
use crate::params::{
    build_layer_configuration, capability_layers, overview_url, CapabilityLayer,
    LayerConfiguration, LayerRequest, OverviewOptions,
};
use crate::parser::CapabilityParser;

const GET_CAPABILITIES: &str = "GetCapabilities";

/// How the capabilities document is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    /// `SERVICE`/`VERSION`/`REQUEST` query parameters on the endpoint
    Kvp,
    /// The URL is a static document, fetched as-is
    Rest,
}

/// One negotiation attempt.
///
/// Unset fields are inherited when the attempt extends another one; an
/// empty `url` means the same.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesOptions {
    pub url: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub request: Option<String>,
    pub request_type: Option<RequestType>,
    pub extra_params: BTreeMap<String, String>,
}

impl CapabilitiesOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Options from a full endpoint URL; recognised query keys become fields
    /// and the rest extra params.
    pub fn from_url(href: &str) -> WmsResult<Self> {
        let mut parsed = parse_params(href, true)?;
        let service = parsed.params.remove("SERVICE").map(|s| s.to_uppercase());
        let version = parsed.params.remove("VERSION");
        let request = parsed.params.remove("REQUEST");
        let request_type = parsed.params.remove("TYPE").and_then(|t| {
            match t.to_uppercase().as_str() {
                "REST" => Some(RequestType::Rest),
                "KVP" => Some(RequestType::Kvp),
                _ => None,
            }
        });

        Ok(Self {
            url: parsed.url,
            service,
            version,
            request,
            request_type,
            extra_params: parsed.params,
        })
    }

    pub fn with_service(mut self, service: ServiceType) -> Self {
        self.service = Some(service.to_string());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// A copy of `self` with every field set on `other` taking precedence.
    pub fn extend(&self, other: &CapabilitiesOptions) -> Self {
        let mut extended = self.clone();
        if !other.url.is_empty() {
            extended.url = other.url.clone();
        }
        if other.service.is_some() {
            extended.service = other.service.clone();
        }
        if other.version.is_some() {
            extended.version = other.version.clone();
        }
        if other.request.is_some() {
            extended.request = other.request.clone();
        }
        if other.request_type.is_some() {
            extended.request_type = other.request_type;
        }
        extended.extra_params.extend(
            other
                .extra_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        extended
    }

    /// Whether the document is fetched verbatim.
    pub fn is_static(&self) -> bool {
        self.request_type == Some(RequestType::Rest) || is_static_document(&self.url)
    }

    /// Query parameters of the GetCapabilities request.
    pub fn query_params(&self) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> = self
            .extra_params
            .iter()
            .map(|(k, v)| (k.to_uppercase(), v.clone()))
            .collect();
        if let Some(service) = &self.service {
            params.insert("SERVICE".to_string(), service.clone());
        }
        if let Some(version) = &self.version {
            params.insert("VERSION".to_string(), version.clone());
        }
        params.insert(
            "REQUEST".to_string(),
            self.request
                .clone()
                .unwrap_or_else(|| GET_CAPABILITIES.to_string()),
        );
        params
    }

    /// Key under which the parsed document is cached.
    pub fn canonical_url(&self) -> WmsResult<String> {
        compute_url(&self.url, Some(&self.query_params()))
    }

    /// Attempts for every known version of the service, `self`'s version
    /// (or the newest) first. Static documents get a single attempt.
    pub fn version_chain(&self) -> Vec<CapabilitiesOptions> {
        let service = self
            .service
            .as_deref()
            .and_then(|s| s.parse::<ServiceType>().ok());

        let Some(service) = service.filter(|_| !self.is_static()) else {
            return vec![self.clone()];
        };

        let known = service.known_versions();
        let preferred = self
            .version
            .clone()
            .unwrap_or_else(|| known[0].to_string());

        let mut attempts = vec![self.clone().with_version(preferred.clone())];
        attempts.extend(
            known
                .iter()
                .filter(|v| **v != preferred)
                .map(|v| CapabilitiesOptions::default().with_version(*v)),
        );
        attempts
    }
}

/// Tries negotiation attempts in order until one yields a valid document.
#[derive(Clone)]
pub struct Negotiator {
    fetcher: CapabilityFetcher,
    parser: CapabilityParser,
}

impl Negotiator {
    pub fn new(fetcher: CapabilityFetcher, parser: CapabilityParser) -> Self {
        Self { fetcher, parser }
    }

    /// Negotiate a document. Attempts after the first extend the first.
    #[instrument(skip(self, attempts), fields(attempts = attempts.len()))]
    pub async fn negotiate(
        &self,
        attempts: &[CapabilitiesOptions],
    ) -> WmsResult<Arc<CapabilityDocument>> {
        let Some(base) = attempts.first() else {
            return Err(WmsError::InvalidParameter {
                param: "attempts".to_string(),
                message: "at least one negotiation attempt is required".to_string(),
            });
        };

        let mut last_error = None;
        for (index, attempt) in attempts.iter().enumerate() {
            let options = if index == 0 {
                base.clone()
            } else {
                base.extend(attempt)
            };

            match self.attempt(&options).await {
                Ok(doc) => {
                    info!(
                        url = %options.url,
                        service = %doc.service_type(),
                        version = doc.version(),
                        attempt = index + 1,
                        "Negotiated capabilities"
                    );
                    return Ok(doc);
                }
                Err(e) => {
                    warn!(
                        url = %options.url,
                        version = ?options.version,
                        attempt = index + 1,
                        error = %e,
                        kind = e.kind(),
                        retryable = e.is_attempt_local(),
                        "Capabilities attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(WmsError::NegotiationFailed {
            attempts: attempts.len(),
            last: Box::new(last_error.unwrap_or_else(|| {
                WmsError::InternalError("negotiation ended without an attempt".to_string())
            })),
        })
    }

    async fn attempt(&self, options: &CapabilitiesOptions) -> WmsResult<Arc<CapabilityDocument>> {
        let params = options.query_params();
        let raw = if options.is_static() {
            self.fetcher.fetch(&options.url, None).await?
        } else {
            self.fetcher.fetch(&options.url, Some(&params)).await?
        };

        let key = options.canonical_url()?;
        let service = options.service.as_deref().unwrap_or_default();
        self.parser.parse(&raw, service, &key).await
    }
}

/// Entry point: negotiation, caching and layer parameter derivation behind
/// one handle.
#[derive(Clone)]
pub struct Capabilities {
    negotiator: Negotiator,
    registry: Arc<ProjectionRegistry>,
    caches: CacheStores,
}

impl Capabilities {
    /// Production setup: reqwest transport and caches from `config`.
    pub fn new(config: &ClientConfig, registry: ProjectionRegistry) -> WmsResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Ok(Self::with_transport(
            transport,
            CacheStores::from_config(config),
            Arc::new(registry),
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        caches: CacheStores,
        registry: Arc<ProjectionRegistry>,
    ) -> Self {
        let fetcher = CapabilityFetcher::new(transport, caches.responses.clone());
        let parser = CapabilityParser::new(caches.documents.clone());
        Self {
            negotiator: Negotiator::new(fetcher, parser),
            registry,
            caches,
        }
    }

    /// Negotiate a document from explicit attempts.
    pub async fn get(&self, attempts: &[CapabilitiesOptions]) -> WmsResult<Arc<CapabilityDocument>> {
        self.negotiator.negotiate(attempts).await
    }

    /// Negotiate a document from a full endpoint URL, trying every known
    /// version of its service.
    pub async fn get_url(
        &self,
        href: &str,
        service: Option<ServiceType>,
    ) -> WmsResult<Arc<CapabilityDocument>> {
        let mut options = CapabilitiesOptions::from_url(href)?;
        if let Some(service) = service {
            options = options.with_service(service);
        }
        self.get(&options.version_chain()).await
    }

    /// Negotiate the request's endpoint and derive its layer configuration.
    pub async fn layer_configuration(&self, request: &LayerRequest) -> WmsResult<LayerConfiguration> {
        let doc = self.get(&request.negotiation_attempts()?).await?;
        build_layer_configuration(&doc, request, &self.registry)
    }

    /// Derive several configurations concurrently, one result per request.
    pub async fn layer_configurations(
        &self,
        requests: &[LayerRequest],
    ) -> Vec<WmsResult<LayerConfiguration>> {
        join_all(requests.iter().map(|r| self.layer_configuration(r))).await
    }

    /// Every displayable layer of the negotiated document.
    pub async fn list_layers(&self, attempts: &[CapabilitiesOptions]) -> WmsResult<Vec<CapabilityLayer>> {
        let doc = self.get(attempts).await?;
        Ok(capability_layers(&doc, &self.registry))
    }

    /// Thumbnail GetMap URL for a WMS layer of the negotiated document.
    pub async fn overview_url(
        &self,
        attempts: &[CapabilitiesOptions],
        layer_name: &str,
        options: &OverviewOptions,
    ) -> WmsResult<String> {
        let doc = self.get(attempts).await?;
        let caps = doc.as_wms().ok_or_else(|| WmsError::InvalidParameter {
            param: "service".to_string(),
            message: "overviews are only available for WMS".to_string(),
        })?;
        let layer = caps
            .root_layer
            .as_ref()
            .and_then(|root| find_layer(root, layer_name, &self.registry))
            .ok_or_else(|| WmsError::LayerNotFound(layer_name.to_string()))?;
        overview_url(caps, &layer, options, &self.registry)
    }

    pub fn registry(&self) -> &ProjectionRegistry {
        &self.registry
    }

    pub fn caches(&self) -> &CacheStores {
        &self.caches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_splits_known_keys() {
        let options = CapabilitiesOptions::from_url(
            "http://example.com/wms?service=WMS&version=1.1.1&map=demo&type=rest",
        )
        .unwrap();
        assert_eq!(options.url, "http://example.com/wms");
        assert_eq!(options.service.as_deref(), Some("WMS"));
        assert_eq!(options.version.as_deref(), Some("1.1.1"));
        assert_eq!(options.request_type, Some(RequestType::Rest));
        assert_eq!(options.extra_params.get("MAP").map(String::as_str), Some("demo"));
        assert!(options.is_static());
    }

    #[test]
    fn test_extend_overrides_set_fields_only() {
        let mut base = CapabilitiesOptions::new("http://example.com/wms")
            .with_service(ServiceType::Wms)
            .with_version("1.3.0");
        base.extra_params.insert("MAP".to_string(), "a".to_string());

        let mut later = CapabilitiesOptions::default().with_version("1.1.1");
        later.extra_params.insert("DPI".to_string(), "96".to_string());

        let extended = base.extend(&later);
        assert_eq!(extended.url, "http://example.com/wms");
        assert_eq!(extended.service.as_deref(), Some("WMS"));
        assert_eq!(extended.version.as_deref(), Some("1.1.1"));
        assert_eq!(extended.extra_params.len(), 2);
    }

    #[test]
    fn test_canonical_url_defaults_request() {
        let options = CapabilitiesOptions::new("http://example.com/wms")
            .with_service(ServiceType::Wms)
            .with_version("1.3.0");
        assert_eq!(
            options.canonical_url().unwrap(),
            "http://example.com/wms?REQUEST=GetCapabilities&SERVICE=WMS&VERSION=1.3.0"
        );
    }

    #[test]
    fn test_version_chain() {
        let chain = CapabilitiesOptions::new("http://example.com/wms")
            .with_service(ServiceType::Wms)
            .with_version("1.1.1")
            .version_chain();
        let versions: Vec<_> = chain.iter().map(|o| o.version.as_deref()).collect();
        assert_eq!(versions, vec![Some("1.1.1"), Some("1.3.0")]);
        assert!(chain[1].url.is_empty());

        let static_chain = CapabilitiesOptions::new("http://example.com/WMTSCapabilities.xml")
            .with_service(ServiceType::Wmts)
            .version_chain();
        assert_eq!(static_chain.len(), 1);
    }
}
