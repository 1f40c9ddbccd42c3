//! Validation and decoding of fetched capability documents.

use std::sync::Arc;
use tracing::debug;

use wms_common::{WmsError, WmsResult};
use wms_protocol::{CapabilityDocument, ServiceType};

use crate::cache::DocumentCache;

/// Turns raw capability text into a shared [`CapabilityDocument`].
#[derive(Clone)]
pub struct CapabilityParser {
    cache: Arc<DocumentCache>,
}

impl CapabilityParser {
    pub fn new(cache: Arc<DocumentCache>) -> Self {
        Self { cache }
    }

    /// Parse `raw` as a `service` document fetched from `url`.
    ///
    /// A document already cached under `url` is returned without looking at
    /// `raw`.
    pub async fn parse(
        &self,
        raw: &str,
        service: &str,
        url: &str,
    ) -> WmsResult<Arc<CapabilityDocument>> {
        if let Some(doc) = self.cache.get(url).await {
            return Ok(doc);
        }

        let service: ServiceType = service.parse()?;
        if !service.matches_signature(raw) {
            return Err(WmsError::Validation {
                service: service.to_string(),
                url: url.to_string(),
            });
        }

        let doc = CapabilityDocument::decode(raw, service, url)?;
        debug!(
            service = %service,
            version = doc.version(),
            url = url,
            "Decoded capabilities document"
        );
        Ok(self.cache.insert(url.to_string(), Arc::new(doc)).await)
    }
}
