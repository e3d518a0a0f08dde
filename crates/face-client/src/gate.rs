//! FaceGate - decides whether the reference image is worth face matching.

use crate::FaceService;
use records::ImageBuffer;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Checks the reference image for at least one detectable face.
///
/// Any face counts, even one the service returns without an identity.
///
/// Fails closed: a service error reads as "no face", which routes the batch
/// to the cheap thumbnail-only path.
#[derive(Clone)]
pub struct FaceGate {
    service: Arc<dyn FaceService>,
}

impl FaceGate {
    pub fn new(service: Arc<dyn FaceService>) -> Self {
        Self { service }
    }

    #[instrument(skip_all, fields(bytes = reference.len()))]
    pub async fn contains_face(&self, reference: &ImageBuffer) -> bool {
        match self.service.has_face(reference).await {
            Ok(true) => {
                info!("Reference image contains a face");
                true
            }
            Ok(false) => {
                info!("No face detected in reference image");
                false
            }
            Err(e) => {
                warn!("Face detection failed, treating reference as faceless: {}", e);
                false
            }
        }
    }
}
