//! HTTP client for a Luxand-style face API.
//!
//! - `POST {endpoint}/photo/detect` with the raw image body returns a JSON
//!   array of faces; a face usually carries an `id`
//! - `GET {endpoint}/photo/verify?photo1=..&photo2=..` returns
//!   `{"confidence": <0-100>}`
//!
//! Every request carries the API key in a `token` header.

use crate::{FaceIdentity, FaceService, FaceServiceError};
use async_trait::async_trait;
use records::ImageBuffer;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Public Luxand endpoint
pub const DEFAULT_FACE_ENDPOINT: &str = "https://api.luxand.cloud";

/// Per-request budget for face-service calls
pub const DEFAULT_FACE_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_HEADER: &str = "token";

/// Connection settings for `FaceApiClient`.
#[derive(Debug, Clone)]
pub struct FaceServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl FaceServiceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_FACE_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_FACE_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// `FaceService` over HTTP.
#[derive(Debug, Clone)]
pub struct FaceApiClient {
    client: reqwest::Client,
    config: FaceServiceConfig,
}

impl FaceApiClient {
    pub fn new(config: FaceServiceConfig) -> Result<Self, FaceServiceError> {
        info!("Creating face service client for {}", config.endpoint);
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FaceServiceError::ClientBuild(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Get the endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Raw face entries the service found in `image`.
    async fn detect_faces(&self, image: &ImageBuffer) -> Result<Vec<Value>, FaceServiceError> {
        debug!("Detecting faces in {} byte image", image.len());
        let response = self
            .client
            .post(self.url("photo/detect"))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(TOKEN_HEADER, &self.config.api_key)
            .body(image.bytes.clone())
            .send()
            .await?;

        match Self::read_json(response).await? {
            Value::Array(faces) => {
                debug!("Face service found {} faces", faces.len());
                Ok(faces)
            }
            other => Err(failure_or_invalid(&other)),
        }
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, FaceServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Face service returned {}: {}", status, body);
            return Err(FaceServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| FaceServiceError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl FaceService for FaceApiClient {
    async fn detect(&self, image: &ImageBuffer) -> Result<Option<FaceIdentity>, FaceServiceError> {
        let faces = self.detect_faces(image).await?;
        Ok(faces.iter().find_map(face_identity))
    }

    async fn has_face(&self, image: &ImageBuffer) -> Result<bool, FaceServiceError> {
        Ok(!self.detect_faces(image).await?.is_empty())
    }

    async fn verify(
        &self,
        first: &FaceIdentity,
        second: &FaceIdentity,
    ) -> Result<f32, FaceServiceError> {
        let response = self
            .client
            .get(self.url("photo/verify"))
            .query(&[("photo1", first.as_str()), ("photo2", second.as_str())])
            .header(TOKEN_HEADER, &self.config.api_key)
            .send()
            .await?;

        let value = Self::read_json(response).await?;
        let parsed: VerifyResponse = serde_json::from_value(value)
            .map_err(|e| FaceServiceError::InvalidResponse(e.to_string()))?;

        if parsed.status.as_deref() == Some("failure") {
            return Err(FaceServiceError::Rejected(
                parsed.message.unwrap_or_else(|| "verification failed".to_string()),
            ));
        }
        Ok(parsed.confidence.unwrap_or(0.0) as f32)
    }
}

/// A face's `id`, given as a string or a number.
fn face_identity(face: &Value) -> Option<FaceIdentity> {
    match face.get("id")? {
        Value::String(id) if !id.is_empty() => Some(FaceIdentity::new(id.clone())),
        Value::Number(id) => Some(FaceIdentity::new(id.to_string())),
        _ => None,
    }
}

fn failure_or_invalid(value: &Value) -> FaceServiceError {
    match value.get("message").and_then(Value::as_str) {
        Some(message) => FaceServiceError::Rejected(message.to_string()),
        None => FaceServiceError::InvalidResponse(format!("expected a face array, got {}", value)),
    }
}
