//! Remote inference-service detector.
//!
//! Talks to a face-detection sidecar over HTTP: `GET /v1/health` to verify
//! the model is loaded, `POST /v1/detect` per frame. Boxes below the
//! confidence threshold are dropped before the monitor sees them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use adaptest_core::traits::{BoundingBox, FaceDetector, Frame};

use crate::error::DetectorError;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Detector backed by a remote inference service.
pub struct RemoteDetector {
    base_url: String,
    api_key: Option<String>,
    min_confidence: f64,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl RemoteDetector {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self::with_options(base_url, api_key, DEFAULT_MIN_CONFIDENCE, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_options(
        base_url: &str,
        api_key: Option<String>,
        min_confidence: f64,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            min_confidence,
            timeout_secs,
            client,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> DetectorError {
        if e.is_timeout() {
            DetectorError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            DetectorError::NetworkError(format!(
                "detection service not reachable at {}",
                self.base_url
            ))
        } else {
            DetectorError::NetworkError(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

#[derive(Deserialize)]
struct DetectResponse {
    #[serde(default)]
    faces: Vec<DetectedFace>,
}

#[derive(Deserialize)]
struct DetectedFace {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    #[serde(default = "full_confidence")]
    confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

#[async_trait]
impl FaceDetector for RemoteDetector {
    fn name(&self) -> &str {
        "remote"
    }

    async fn load(&self) -> anyhow::Result<()> {
        let response = self
            .authorize(self.client.get(format!("{}/v1/health", self.base_url)))
            .send()
            .await
            .map_err(|e| DetectorError::ModelUnavailable(self.map_send_error(e).to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(DetectorError::AuthenticationFailed(
                "detection service rejected the API key".into(),
            )
            .into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::ModelUnavailable(format!(
                "health check failed (HTTP {status}): {body}"
            ))
            .into());
        }

        Ok(())
    }

    #[instrument(skip(self, frame), fields(width = frame.width, height = frame.height))]
    async fn detect(&self, frame: &Frame) -> anyhow::Result<Vec<BoundingBox>> {
        let body = DetectRequest {
            width: frame.width,
            height: frame.height,
            pixels: &frame.data,
        };

        let response = self
            .authorize(self.client.post(format!("{}/v1/detect", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(DetectorError::AuthenticationFailed(
                "detection service rejected the API key".into(),
            )
            .into());
        }
        if status == 422 {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::MalformedFrame(body).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: DetectResponse =
            response.json().await.map_err(|e| DetectorError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        Ok(api_response
            .faces
            .into_iter()
            .filter(|f| f.confidence >= self.min_confidence)
            .map(|f| BoundingBox::new(f.x0, f.y0, f.x1, f.y1))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn frame() -> Frame {
        Frame {
            width: 4,
            height: 4,
            data: vec![0u8; 48],
        }
    }

    #[tokio::test]
    async fn successful_detection() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "faces": [
                {"x0": 100.0, "y0": 50.0, "x1": 300.0, "y1": 250.0, "confidence": 0.97}
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let detector = RemoteDetector::new(&server.uri(), None);
        let faces = detector.detect(&frame()).await.unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].center().x, 200.0);
    }

    #[tokio::test]
    async fn low_confidence_boxes_are_dropped() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "faces": [
                {"x0": 0.0, "y0": 0.0, "x1": 10.0, "y1": 10.0, "confidence": 0.2},
                {"x0": 100.0, "y0": 100.0, "x1": 200.0, "y1": 200.0, "confidence": 0.9}
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let detector = RemoteDetector::new(&server.uri(), None);
        let faces = detector.detect(&frame()).await.unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].x0, 100.0);
    }

    #[tokio::test]
    async fn api_key_is_sent_as_bearer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/detect"))
            .and(header("authorization", "Bearer secret-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"faces": []})),
            )
            .mount(&server)
            .await;

        let detector = RemoteDetector::new(&server.uri(), Some("secret-key".into()));
        let faces = detector.detect(&frame()).await.unwrap();
        assert!(faces.is_empty());
    }

    #[tokio::test]
    async fn rejected_key_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/detect"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let detector = RemoteDetector::new(&server.uri(), Some("wrong".into()));
        let err = detector.detect(&frame()).await.unwrap_err();
        let detector_err = err.downcast_ref::<DetectorError>().unwrap();
        assert!(detector_err.is_fatal());
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/detect"))
            .respond_with(ResponseTemplate::new(500).set_body_string("inference crashed"))
            .mount(&server)
            .await;

        let detector = RemoteDetector::new(&server.uri(), None);
        let err = detector.detect(&frame()).await.unwrap_err();
        let detector_err = err.downcast_ref::<DetectorError>().unwrap();
        assert!(matches!(detector_err, DetectorError::ApiError { status: 500, .. }));
        assert!(!detector_err.is_fatal());
    }

    #[tokio::test]
    async fn healthy_service_loads() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .mount(&server)
            .await;

        let detector = RemoteDetector::new(&server.uri(), None);
        detector.load().await.unwrap();
    }

    #[tokio::test]
    async fn unhealthy_service_fails_to_load() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model still loading"))
            .mount(&server)
            .await;

        let detector = RemoteDetector::new(&server.uri(), None);
        let err = detector.load().await.unwrap_err();
        let detector_err = err.downcast_ref::<DetectorError>().unwrap();
        assert!(matches!(detector_err, DetectorError::ModelUnavailable(_)));
        assert!(detector_err.is_fatal());
    }
}
