//! Error types for reverse searches.

use crate::config::ConfigError;
use pipeline::FetchError;
use thiserror::Error;

/// Errors from the search provider
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Search provider rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected search response: {0}")]
    InvalidResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Error from the image store
#[derive(Error, Debug)]
#[error("Image store failed: {0}")]
pub struct StoreError(pub String);

/// Caller-visible failures of a reverse search.
///
/// Everything after the reference image is in hand degrades per item
/// instead, so these all happen before enhancement starts.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Uploaded images need an image store, none is configured")]
    NoImageStore,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Reverse image search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Could not obtain the reference image: {0}")]
    ReferenceImage(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to set up {component}: {reason}")]
    Setup {
        component: &'static str,
        reason: String,
    },
}
