//! OGC WMS and WMTS capability documents.
//!
//! Supports:
//! - WMS 1.1.1 and WMS 1.3.0 GetCapabilities decoding
//! - WMTS 1.0.0 GetCapabilities decoding (KVP and RESTful bindings)
//! - Layer tree inheritance and KVP URL canonicalization

pub mod capabilities;
pub mod document;
pub mod kvp;
pub mod layer_tree;
pub mod wmts;
pub mod xml;

pub use capabilities::{
    Attribution, LayerAttributes, LayerBoundingBox, LayerIdentity, LayerNode, Operation,
    ServiceMetadata, StyleDecl, WmsCapabilities,
};
pub use document::{CapabilityContent, CapabilityDocument, DimensionDecl, ServiceType};
pub use kvp::{compute_url, is_static_document, parse_params, upper_case_keys, ParsedUrl};
pub use layer_tree::{find_layer, list_layers, ResolvedLayer};
pub use wmts::{RequestEncoding, WmtsCapabilities, WmtsLayer, WmtsStyle};
