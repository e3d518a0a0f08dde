//! # Reverse Search Orchestrator
//!
//! Runs one reverse-image search end to end:
//! 1. Obtain a searchable URL and the reference bytes
//!    - upload: store the bytes, search with the stored URL
//!    - URL: search with it and download the reference in parallel
//! 2. Ask the FaceGate whether the reference shows a face
//! 3. Run the enhancement pipeline in the matching mode
//!
//! Only step 1 can fail. Once the reference bytes are in hand every result
//! is produced, degraded per item if need be.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument};
use url::Url;

use face_client::{FaceApiClient, FaceGate, FaceService, SimilarityScorer};
use pipeline::{HttpImageFetcher, ImageFetcher, ResultEnhancementPipeline};
use records::{CandidateRecord, EnhancedResult, ImageBuffer};
use resolver::CandidateImageResolver;

use crate::collaborators::{ImageStore, SearchProvider};
use crate::config::AppConfig;
use crate::error::OrchestratorError;
use crate::serpapi::SerpApiClient;

/// The image a search starts from.
#[derive(Debug, Clone)]
pub enum ReferenceImage {
    /// Raw uploaded bytes; needs an `ImageStore` to become searchable
    Upload {
        bytes: Bytes,
        content_type: Option<String>,
    },
    /// A publicly reachable image
    Url(Url),
}

/// Response body of a reverse search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub original_results: Vec<EnhancedResult>,
}

/// Coordinates search provider, storage, FaceGate and the enhancement pipeline.
#[derive(Clone)]
pub struct ReverseSearchOrchestrator {
    search: Arc<dyn SearchProvider>,
    store: Option<Arc<dyn ImageStore>>,
    image_fetcher: Arc<dyn ImageFetcher>,
    gate: FaceGate,
    pipeline: ResultEnhancementPipeline,
}

impl ReverseSearchOrchestrator {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        image_fetcher: Arc<dyn ImageFetcher>,
        gate: FaceGate,
        pipeline: ResultEnhancementPipeline,
    ) -> Self {
        Self {
            search,
            store: None,
            image_fetcher,
            gate,
            pipeline,
        }
    }

    /// Build the production stack (SerpApi, face API, HTTP resolver) from config.
    pub fn from_config(config: &AppConfig) -> Result<Self, OrchestratorError> {
        let face: Arc<dyn FaceService> = Arc::new(
            FaceApiClient::new(config.face_service()?).map_err(|e| setup("face client", e))?,
        );
        let search = Arc::new(
            SerpApiClient::new(config.search_provider()?).map_err(|e| setup("search client", e))?,
        );
        let image_fetcher: Arc<dyn ImageFetcher> = Arc::new(
            HttpImageFetcher::new(config.image_timeout).map_err(|e| setup("image fetcher", e))?,
        );
        let pipeline = build_pipeline(config, face.clone(), image_fetcher.clone())?;

        Ok(Self::new(search, image_fetcher, FaceGate::new(face), pipeline))
    }

    /// Attach durable storage for uploaded references (builder pattern).
    pub fn with_store(mut self, store: Arc<dyn ImageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Main entry point: reverse search `reference` and enhance every hit.
    #[instrument(skip_all)]
    pub async fn search(&self, reference: ReferenceImage) -> Result<SearchResponse, OrchestratorError> {
        let start_time = Instant::now();

        let (candidates, reference) = match reference {
            ReferenceImage::Upload { bytes, content_type } => {
                let store = self.store.as_ref().ok_or(OrchestratorError::NoImageStore)?;
                let image = ImageBuffer::new(bytes);
                let image = match content_type {
                    Some(content_type) => image.with_content_type(content_type),
                    None => image,
                };
                let public_url = store.store(&image).await?;
                info!("Stored uploaded reference at {}", public_url);
                (self.search.search(&public_url).await?, image)
            }
            ReferenceImage::Url(url) => {
                let (candidates, image) = tokio::join!(
                    self.search.search(&url),
                    self.image_fetcher.fetch_image(url.as_str())
                );
                (candidates?, image?)
            }
        };
        info!(
            "Search returned {} candidates, reference is {} bytes",
            candidates.len(),
            reference.len()
        );

        let original_results = self.enhance(candidates, &reference).await;

        info!(
            "Reverse search finished with {} results in {:.2?}",
            original_results.len(),
            start_time.elapsed()
        );
        Ok(SearchResponse { original_results })
    }

    /// Enhance an already-fetched batch against reference bytes in hand.
    pub async fn enhance(
        &self,
        candidates: Vec<CandidateRecord>,
        reference: &ImageBuffer,
    ) -> Vec<EnhancedResult> {
        let has_face = self.gate.contains_face(reference).await;
        self.pipeline.enhance(candidates, reference, has_face).await
    }
}

/// Enhancement pipeline over the HTTP resolver and the given face service.
pub fn build_pipeline(
    config: &AppConfig,
    face: Arc<dyn FaceService>,
    image_fetcher: Arc<dyn ImageFetcher>,
) -> Result<ResultEnhancementPipeline, OrchestratorError> {
    let resolver = CandidateImageResolver::from_config(config.resolver.clone())
        .map_err(|e| setup("page resolver", e))?;

    Ok(ResultEnhancementPipeline::new(
        Arc::new(resolver),
        image_fetcher,
        Arc::new(SimilarityScorer::new(face)),
    )
    .with_config(config.pipeline.clone()))
}

fn setup(component: &'static str, error: impl std::fmt::Display) -> OrchestratorError {
    OrchestratorError::Setup {
        component,
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SearchError, StoreError};
    use async_trait::async_trait;
    use face_client::{FaceIdentity, FaceServiceError};
    use pipeline::{FetchError, ImageResolver, SimilarityScoring};
    use records::Similarity;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    struct FixedSearch {
        results: Vec<CandidateRecord>,
        fail: bool,
        queried: Mutex<Vec<String>>,
    }

    impl FixedSearch {
        fn returning(results: Vec<CandidateRecord>) -> Self {
            Self {
                results,
                fail: false,
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, image_url: &Url) -> Result<Vec<CandidateRecord>, SearchError> {
            self.queried.lock().unwrap().push(image_url.to_string());
            if self.fail {
                return Err(SearchError::Rejected("quota exceeded".to_string()));
            }
            Ok(self.results.clone())
        }
    }

    struct MemoryStore;

    #[async_trait]
    impl ImageStore for MemoryStore {
        async fn store(&self, image: &ImageBuffer) -> Result<Url, StoreError> {
            Url::parse(&format!("http://store/{}.jpg", image.len()))
                .map_err(|e| StoreError(e.to_string()))
        }
    }

    /// Serves known URLs; the bytes are the URL text.
    struct MapFetcher {
        known: Vec<String>,
    }

    #[async_trait]
    impl ImageFetcher for MapFetcher {
        async fn fetch_image(&self, url: &str) -> Result<ImageBuffer, FetchError> {
            if self.known.iter().any(|k| k == url) {
                Ok(ImageBuffer::new(url.as_bytes().to_vec()))
            } else {
                Err(FetchError::Status { status: 404 })
            }
        }
    }

    /// A face is any buffer containing "face"; `broken` makes every call fail.
    #[derive(Default)]
    struct KeywordFaces {
        broken: bool,
        detect_calls: AtomicUsize,
    }

    #[async_trait]
    impl FaceService for KeywordFaces {
        async fn detect(&self, image: &ImageBuffer) -> Result<Option<FaceIdentity>, FaceServiceError> {
            self.detect_calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(FaceServiceError::Rejected("service down".to_string()));
            }
            let text = String::from_utf8_lossy(&image.bytes);
            Ok(text.contains("face").then(|| FaceIdentity::new(text.to_string())))
        }

        async fn verify(&self, _: &FaceIdentity, _: &FaceIdentity) -> Result<f32, FaceServiceError> {
            Ok(90.0)
        }
    }

    #[derive(Default)]
    struct CountingResolver {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageResolver for CountingResolver {
        async fn resolve_image(&self, page_url: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(page_url).cloned()
        }
    }

    #[derive(Default)]
    struct CountingScorer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SimilarityScoring for CountingScorer {
        async fn score(&self, _: &ImageBuffer, _: &ImageBuffer) -> Similarity {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Similarity::new(90.0)
        }
    }

    struct Harness {
        orchestrator: ReverseSearchOrchestrator,
        search: Arc<FixedSearch>,
        faces: Arc<KeywordFaces>,
        resolver: Arc<CountingResolver>,
        scorer: Arc<CountingScorer>,
    }

    fn harness(search: FixedSearch, faces: KeywordFaces, known: &[&str]) -> Harness {
        let search = Arc::new(search);
        let faces = Arc::new(faces);
        let resolver = Arc::new(CountingResolver::default());
        let scorer = Arc::new(CountingScorer::default());
        let fetcher = Arc::new(MapFetcher {
            known: known.iter().map(|k| k.to_string()).collect(),
        });

        let pipeline = ResultEnhancementPipeline::new(resolver.clone(), fetcher.clone(), scorer.clone());
        let orchestrator =
            ReverseSearchOrchestrator::new(search.clone(), fetcher, FaceGate::new(faces.clone()), pipeline);

        Harness {
            orchestrator,
            search,
            faces,
            resolver,
            scorer,
        }
    }

    fn batch() -> Vec<CandidateRecord> {
        vec![
            CandidateRecord::new("http://x/a.html", "http://x/t.jpg"),
            CandidateRecord::new("http://x/b.html", "http://x/u.jpg"),
        ]
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[tokio::test]
    async fn test_url_search_with_face_scores_every_result() {
        let h = harness(
            FixedSearch::returning(batch()),
            KeywordFaces::default(),
            &["http://img/face.jpg", "http://x/t.jpg", "http://x/u.jpg"],
        );

        let url = Url::parse("http://img/face.jpg").unwrap();
        let response = h.orchestrator.search(ReferenceImage::Url(url)).await.unwrap();

        assert_eq!(response.original_results.len(), 2);
        assert!(response.original_results.iter().all(|r| r.is_similar));
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.scorer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_face_service_takes_no_face_path() {
        let h = harness(
            FixedSearch::returning(batch()),
            KeywordFaces {
                broken: true,
                ..Default::default()
            },
            &["http://img/face.jpg"],
        );

        let url = Url::parse("http://img/face.jpg").unwrap();
        let response = h.orchestrator.search(ReferenceImage::Url(url)).await.unwrap();

        assert_eq!(h.faces.detect_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.scorer.calls.load(Ordering::SeqCst), 0);
        for (result, record) in response.original_results.iter().zip(batch()) {
            assert_eq!(result.high_res_image, record.thumbnail);
            assert_eq!(result.similarity, Similarity::ZERO);
            assert!(!result.is_similar);
        }
    }

    #[tokio::test]
    async fn test_unreachable_reference_is_fatal() {
        let h = harness(FixedSearch::returning(batch()), KeywordFaces::default(), &[]);

        let url = Url::parse("http://img/missing.jpg").unwrap();
        let result = h.orchestrator.search(ReferenceImage::Url(url)).await;

        assert!(matches!(result, Err(OrchestratorError::ReferenceImage(_))));
        assert_eq!(h.faces.detect_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_reported() {
        let search = FixedSearch {
            fail: true,
            ..FixedSearch::returning(Vec::new())
        };
        let h = harness(search, KeywordFaces::default(), &["http://img/face.jpg"]);

        let url = Url::parse("http://img/face.jpg").unwrap();
        let result = h.orchestrator.search(ReferenceImage::Url(url)).await;

        assert!(matches!(result, Err(OrchestratorError::Search(_))));
    }

    #[tokio::test]
    async fn test_upload_needs_a_store() {
        let h = harness(FixedSearch::returning(batch()), KeywordFaces::default(), &[]);
        let upload = ReferenceImage::Upload {
            bytes: Bytes::from_static(b"my face"),
            content_type: Some("image/jpeg".to_string()),
        };

        let result = h.orchestrator.search(upload.clone()).await;
        assert!(matches!(result, Err(OrchestratorError::NoImageStore)));

        let orchestrator = h.orchestrator.clone().with_store(Arc::new(MemoryStore));
        let response = orchestrator.search(upload).await.unwrap();

        assert_eq!(h.search.queried.lock().unwrap().as_slice(), ["http://store/7.jpg"]);
        assert_eq!(response.original_results.len(), 2);
        assert_eq!(h.faces.detect_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_response_serializes_like_the_api() {
        let record = CandidateRecord::new("http://x/a.html", "http://x/t.jpg");
        let response = SearchResponse {
            original_results: vec![EnhancedResult::unscored(record, "http://x/t.jpg".to_string(), 70.0)],
        };
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["originalResults"][0]["highResImage"], "http://x/t.jpg");
        assert_eq!(value["originalResults"][0]["isSimilar"], false);
        assert_eq!(value["originalResults"][0]["similarity"], 0.0);
    }
}
