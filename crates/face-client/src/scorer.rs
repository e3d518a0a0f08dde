//! SimilarityScorer - identity similarity between two images.
//!
//! ## Algorithm
//! 1. Detect a face in each image (both requests run concurrently)
//! 2. If either image has no face, the pair does not match: score 0 and
//!    no verification call
//! 3. Otherwise verify the two identities and clamp the confidence to [0, 100]
//!
//! Any service error at any step also scores 0; `score` never fails.

use crate::{FaceIdentity, FaceService, FaceServiceError};
use records::{ImageBuffer, Similarity};
use std::sync::Arc;
use tracing::{debug, warn};

/// Scores how likely two images show the same person.
#[derive(Clone)]
pub struct SimilarityScorer {
    service: Arc<dyn FaceService>,
}

impl SimilarityScorer {
    pub fn new(service: Arc<dyn FaceService>) -> Self {
        Self { service }
    }

    pub async fn score(&self, reference: &ImageBuffer, candidate: &ImageBuffer) -> Similarity {
        match self.try_score(reference, candidate).await {
            Ok(similarity) => similarity,
            Err(e) => {
                warn!("Face comparison failed: {}", e);
                Similarity::ZERO
            }
        }
    }

    async fn try_score(
        &self,
        reference: &ImageBuffer,
        candidate: &ImageBuffer,
    ) -> Result<Similarity, FaceServiceError> {
        let (reference_face, candidate_face) = tokio::join!(
            self.service.detect(reference),
            self.service.detect(candidate)
        );

        let (Some(reference_face), Some(candidate_face)) = (reference_face?, candidate_face?) else {
            debug!("Face missing in one of the images, not a match");
            return Ok(Similarity::ZERO);
        };

        self.verify(&reference_face, &candidate_face).await
    }

    async fn verify(
        &self,
        first: &FaceIdentity,
        second: &FaceIdentity,
    ) -> Result<Similarity, FaceServiceError> {
        let confidence = self.service.verify(first, second).await?;
        debug!("Verification of {} vs {}: {}", first, second, confidence);
        Ok(Similarity::new(confidence))
    }
}
