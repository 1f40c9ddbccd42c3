//! Error types for capability negotiation and layer derivation.

use thiserror::Error;

/// Result type alias using WmsError.
pub type WmsResult<T> = Result<T, WmsError>;

/// Primary error type for WMS/WMTS client operations.
#[derive(Debug, Error)]
pub enum WmsError {
    // === Negotiation Errors ===
    #[error("The capabilities document is not a {service} Capabilities : {url}")]
    Validation { service: String, url: String },

    #[error("Unrecognized service type {0}")]
    UnsupportedService(String),

    #[error("All {attempts} capabilities attempts failed, last error: {last}")]
    NegotiationFailed {
        attempts: usize,
        #[source]
        last: Box<WmsError>,
    },

    // === Transport Errors ===
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    // === Document Errors ===
    #[error("Malformed capabilities document: {0}")]
    MalformedDocument(String),

    #[error("The layer {0} was not found on the capability document")]
    LayerNotFound(String),

    #[error("Unable to find the GetMap url on {0}")]
    GetMapUrlNotFound(String),

    #[error("Unable to find the GetTile url for the layer {0}")]
    GetTileUrlNotFound(String),

    #[error("Unable to find the GetCapabilities url on {0}")]
    GetCapabilitiesUrlNotFound(String),

    // === Derivation Errors ===
    #[error("Unable to find supported projection on this capabilities for the layer {0}")]
    ProjectionNotFound(String),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WmsError {
    /// Stable machine-readable code, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            WmsError::Validation { .. } => "ValidationError",
            WmsError::UnsupportedService(_) => "UnsupportedServiceError",
            WmsError::NegotiationFailed { .. } => "NegotiationFailed",
            WmsError::Transport { .. } | WmsError::HttpStatus { .. } => "TransportError",
            WmsError::InvalidUrl { .. } => "InvalidUrl",
            WmsError::MalformedDocument(_) => "MalformedDocument",
            WmsError::LayerNotFound(_) => "LayerNotFoundError",
            WmsError::GetMapUrlNotFound(_) => "GetMapUrlNotFoundError",
            WmsError::GetTileUrlNotFound(_) => "GetTileUrlNotFoundError",
            WmsError::GetCapabilitiesUrlNotFound(_) => "GetCapabilitiesUrlNotFoundError",
            WmsError::ProjectionNotFound(_) => "ProjectionNotFoundError",
            WmsError::ProjectionError(_) => "ProjectionError",
            WmsError::InvalidParameter { .. } => "InvalidParameterValue",
            WmsError::InvalidBbox(_) => "InvalidBBox",
            WmsError::InvalidTime(_) => "InvalidDimensionValue",
            WmsError::InternalError(_) => "InternalError",
        }
    }

    /// Whether the error belongs to a single negotiation attempt, so that the
    /// next candidate version may still succeed.
    pub fn is_attempt_local(&self) -> bool {
        matches!(
            self,
            WmsError::Validation { .. }
                | WmsError::UnsupportedService(_)
                | WmsError::Transport { .. }
                | WmsError::HttpStatus { .. }
                | WmsError::MalformedDocument(_)
        )
    }
}

impl From<serde_json::Error> for WmsError {
    fn from(err: serde_json::Error) -> Self {
        WmsError::InternalError(format!("JSON error: {}", err))
    }
}

impl From<crate::bbox::BboxParseError> for WmsError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        WmsError::InvalidBbox(err.to_string())
    }
}
