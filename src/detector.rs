//! Mark-detection collaborator. Detectors never fail: every problem is
//! logged and reported as "no marks".

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::DetectorConfig;
use crate::types::RawDetection;

pub trait Detector {
    fn detect(&self, image: &[u8]) -> Vec<RawDetection>;
}

/// Fixed detections, returned for any image.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector(pub Vec<RawDetection>);

impl Detector for StaticDetector {
    fn detect(&self, _image: &[u8]) -> Vec<RawDetection> {
        self.0.clone()
    }
}

/// Hosted detector: image bytes in, JSON detections out.
pub struct HttpDetector {
    client: Client,
    config: DetectorConfig,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetectorResponse {
    List(Vec<RawDetection>),
    Wrapped { marks: Vec<RawDetection> },
}

impl HttpDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn request(&self, image: &[u8]) -> Result<Vec<RawDetection>, String> {
        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec());
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                format!("Detector unreachable: {}", e)
            } else {
                format!("Network error: {}", e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("Detector failed ({}): {}", status, body));
        }
        let body = response.text().map_err(|e| e.to_string())?;
        parse_detections(&body)
    }
}

impl Detector for HttpDetector {
    fn detect(&self, image: &[u8]) -> Vec<RawDetection> {
        if image.is_empty() {
            tracing::warn!("Empty image, skipping detection");
            return Vec::new();
        }
        match self.request(image) {
            Ok(marks) => {
                tracing::info!(count = marks.len(), "Marks detected");
                marks
            }
            Err(e) => {
                tracing::warn!(endpoint = %self.config.endpoint, error = %e, "Mark detection failed");
                Vec::new()
            }
        }
    }
}

/// Accepts `[...]` or `{"marks": [...]}`.
fn parse_detections(body: &str) -> Result<Vec<RawDetection>, String> {
    match serde_json::from_str::<DetectorResponse>(body) {
        Ok(DetectorResponse::List(marks)) | Ok(DetectorResponse::Wrapped { marks }) => Ok(marks),
        Err(e) => Err(format!("Invalid JSON: {}", e)),
    }
}
