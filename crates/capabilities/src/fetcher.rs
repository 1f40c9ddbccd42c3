//! Capability document retrieval over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use wms_common::{WmsError, WmsResult};
use wms_protocol::{compute_url, is_static_document};

use crate::cache::ResponseCache;
use crate::config::ClientConfig;

/// Plain HTTP GET returning the body as text.
///
/// Implementations must report non-2xx responses as errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_text(&self, url: &str) -> WmsResult<String>;
}

/// [`HttpTransport`] backed by a shared reqwest client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> WmsResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WmsError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str) -> WmsResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WmsError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WmsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| WmsError::Transport {
            url: url.to_string(),
            message: format!("Failed to read body: {}", e),
        })
    }
}

/// Fetches raw capability documents, one GET per distinct request URL.
#[derive(Clone)]
pub struct CapabilityFetcher {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResponseCache>,
}

impl CapabilityFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, cache: Arc<ResponseCache>) -> Self {
        Self { transport, cache }
    }

    /// Fetch the document at `url` with `params` appended.
    ///
    /// Static `.xml` documents and calls without params use `url` verbatim.
    #[instrument(skip(self, params), fields(url = %url))]
    pub async fn fetch(
        &self,
        url: &str,
        params: Option<&BTreeMap<String, String>>,
    ) -> WmsResult<Arc<str>> {
        let request_url = request_url(url, params)?;

        if let Some(body) = self.cache.get(&request_url).await {
            return Ok(body);
        }

        debug!(request_url = %request_url, "Fetching capabilities");
        let body = self.transport.get_text(&request_url).await?;
        Ok(self.cache.insert(request_url, Arc::from(body)).await)
    }
}

/// The exact URL requested for `url` and `params`.
pub fn request_url(url: &str, params: Option<&BTreeMap<String, String>>) -> WmsResult<String> {
    match params {
        Some(params) if !is_static_document(url) => compute_url(url, Some(params)),
        _ => Ok(url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn get_text(&self, url: &str) -> WmsResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("body of {}", url))
        }
    }

    fn params() -> BTreeMap<String, String> {
        [("service", "WMS"), ("request", "GetCapabilities")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_request_url() {
        assert_eq!(
            request_url("http://example.com/wms", Some(&params())).unwrap(),
            "http://example.com/wms?REQUEST=GetCapabilities&SERVICE=WMS"
        );
        assert_eq!(
            request_url("http://example.com/caps.xml", Some(&params())).unwrap(),
            "http://example.com/caps.xml"
        );
        assert_eq!(
            request_url("http://example.com/wms?a=b", None).unwrap(),
            "http://example.com/wms?a=b"
        );
    }

    #[tokio::test]
    async fn test_fetch_is_cached_per_request_url() {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let fetcher = CapabilityFetcher::new(
            transport.clone(),
            Arc::new(ResponseCache::new("test", None)),
        );

        let first = fetcher.fetch("http://example.com/wms", Some(&params())).await.unwrap();
        let second = fetcher.fetch("http://example.com/wms", Some(&params())).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        fetcher.fetch("http://example.com/wms", None).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
