//! Reverse search service for the FaceFind engine.
//!
//! This crate wires the collaborators of one reverse-image search together:
//! the search provider, optional image storage, the FaceGate and the
//! enhancement pipeline. Configuration is read from `FACEFIND_*` variables.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod serpapi;

pub use collaborators::{ImageStore, SearchProvider};
pub use config::{AppConfig, ConfigError};
pub use error::{OrchestratorError, SearchError, StoreError};
pub use orchestrator::{build_pipeline, ReferenceImage, ReverseSearchOrchestrator, SearchResponse};
pub use serpapi::{SerpApiClient, SerpApiConfig};
