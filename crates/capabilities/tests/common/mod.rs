//! In-memory transport and helpers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use capabilities::{Capabilities, CacheStores, HttpTransport};
use wms_common::{ProjectionRegistry, WmsError, WmsResult};

pub const WMS_130_URL: &str =
    "http://maps.example.com/wms?REQUEST=GetCapabilities&SERVICE=WMS&VERSION=1.3.0";
pub const WMS_111_URL: &str =
    "http://maps.example.com/wms?REQUEST=GetCapabilities&SERVICE=WMS&VERSION=1.1.1";
pub const LEGACY_111_URL: &str =
    "http://legacy.example.com/cgi-bin/wms?REQUEST=GetCapabilities&SERVICE=WMS&VERSION=1.1.1";
pub const WMTS_URL: &str =
    "http://tiles.example.com/wmts?REQUEST=GetCapabilities&SERVICE=WMTS&VERSION=1.0.0";

/// Serves canned bodies by exact URL and records every request.
/// Unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get_text(&self, url: &str) -> WmsResult<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| WmsError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// A client over `transport` with fresh caches and the default registry.
pub fn client(transport: Arc<MockTransport>) -> Capabilities {
    Capabilities::with_transport(
        transport,
        CacheStores::default(),
        Arc::new(ProjectionRegistry::with_defaults()),
    )
}
