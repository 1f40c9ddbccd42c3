//! Capability negotiation and layer parameter derivation for OGC map services.
//!
//! Given an endpoint and caller preferences, [`Capabilities`] negotiates a
//! protocol version, fetches and parses the capabilities document (both
//! steps cached), resolves the requested layer and derives a
//! [`LayerConfiguration`] ready to hand to a map layer factory.

pub mod cache;
pub mod config;
pub mod fetcher;
pub mod negotiator;
pub mod params;
pub mod parser;
pub mod resolve;

pub use cache::{CacheStats, CacheStores, DocumentCache, MemoCache, ResponseCache};
pub use config::ClientConfig;
pub use fetcher::{CapabilityFetcher, HttpTransport, ReqwestTransport};
pub use negotiator::{Capabilities, CapabilitiesOptions, Negotiator, RequestType};
pub use params::{
    build_layer_configuration, CapabilityLayer, Endpoint, LayerConfiguration, LayerRequest,
    OverviewOptions, SourceParams, StyleDescriptor,
};
pub use parser::CapabilityParser;
