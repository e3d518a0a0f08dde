//! Face-identity client for comparing a reference photo with search hits.
//!
//! This crate provides:
//! - `FaceService`: the detect / verify capability, as a trait
//! - `FaceApiClient`: an HTTP implementation for a Luxand-style face API
//! - `FaceGate`: "does the reference contain a face at all?"
//! - `SimilarityScorer`: a 0-100 identity score for two images
//!
//! Both `FaceGate` and `SimilarityScorer` swallow service errors: the gate
//! fails closed (no face) and the scorer returns 0.

pub mod client;
pub mod gate;
pub mod scorer;

pub use client::{FaceApiClient, FaceServiceConfig};
pub use gate::FaceGate;
pub use scorer::SimilarityScorer;

use async_trait::async_trait;
use records::ImageBuffer;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when interacting with the face service
#[derive(Error, Debug)]
pub enum FaceServiceError {
    #[error("Failed to reach face service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Face service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered 2xx but reported a failure in the payload
    #[error("Face service rejected the request: {0}")]
    Rejected(String),

    #[error("Invalid response from face service: {0}")]
    InvalidResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Opaque identity token for one detected face.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceIdentity(String);

impl FaceIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Face detection and verification.
#[async_trait]
pub trait FaceService: Send + Sync {
    /// Identity of the first face found in `image`, if any.
    async fn detect(&self, image: &ImageBuffer) -> Result<Option<FaceIdentity>, FaceServiceError>;

    /// Whether `image` contains any face, identified or not.
    async fn has_face(&self, image: &ImageBuffer) -> Result<bool, FaceServiceError> {
        Ok(self.detect(image).await?.is_some())
    }

    /// Confidence (nominally 0-100) that both identities are the same person.
    async fn verify(
        &self,
        first: &FaceIdentity,
        second: &FaceIdentity,
    ) -> Result<f32, FaceServiceError>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted `FaceService` shared by the gate and scorer tests.

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Detection is keyed by the image bytes; verification returns a fixed value.
    #[derive(Default)]
    pub struct MockFaceService {
        pub faces: HashMap<Vec<u8>, String>,
        /// Images with a face the service returns no identity for
        pub unidentified: HashSet<Vec<u8>>,
        pub confidence: f32,
        pub fail_detect: bool,
        pub fail_verify: bool,
        pub detect_calls: AtomicUsize,
        pub verify_calls: AtomicUsize,
    }

    impl MockFaceService {
        pub fn with_face(mut self, bytes: &[u8], id: &str) -> Self {
            self.faces.insert(bytes.to_vec(), id.to_string());
            self
        }

        pub fn with_unidentified_face(mut self, bytes: &[u8]) -> Self {
            self.unidentified.insert(bytes.to_vec());
            self
        }

        pub fn with_confidence(mut self, confidence: f32) -> Self {
            self.confidence = confidence;
            self
        }

        pub fn detect_count(&self) -> usize {
            self.detect_calls.load(Ordering::SeqCst)
        }

        pub fn verify_count(&self) -> usize {
            self.verify_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FaceService for MockFaceService {
        async fn detect(
            &self,
            image: &ImageBuffer,
        ) -> Result<Option<FaceIdentity>, FaceServiceError> {
            self.detect_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_detect {
                return Err(FaceServiceError::Rejected("detect unavailable".into()));
            }
            Ok(self.faces.get(image.bytes.as_ref()).map(FaceIdentity::new))
        }

        async fn has_face(&self, image: &ImageBuffer) -> Result<bool, FaceServiceError> {
            let identified = self.detect(image).await?.is_some();
            Ok(identified || self.unidentified.contains(image.bytes.as_ref()))
        }

        async fn verify(
            &self,
            _first: &FaceIdentity,
            _second: &FaceIdentity,
        ) -> Result<f32, FaceServiceError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_verify {
                return Err(FaceServiceError::Status {
                    status: 503,
                    body: "busy".into(),
                });
            }
            Ok(self.confidence)
        }
    }
}
