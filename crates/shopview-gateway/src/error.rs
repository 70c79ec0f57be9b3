use shopview_core::MalformedTreeError;
use thiserror::Error;

/// Errors returned by the storefront backend client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    /// The category payload does not form a forest.
    #[error("malformed category tree: {0}")]
    MalformedTree(#[from] MalformedTreeError),
}
