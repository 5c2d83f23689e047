//! HTTP client for the face-detection sidecar.
//!
//! Detection runs in a separate service; this client fetches per-frame
//! observations and adapts them to the tracker source traits. Any
//! transport or protocol failure surfaces as `DetectorUnavailable`, which
//! the portrait stage treats as "fall back to fast tracking".

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use clipper_media::tracking::{FaceBox, FaceBoxSource, FaceLandmarks, LandmarkSource};
use clipper_media::{MediaError, MediaResult};

use crate::error::{AiError, AiResult};

/// Configuration for the detector sidecar client.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Base URL of the detector service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for transient failures
    pub max_retries: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 2,
        }
    }
}

impl DetectorConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("DETECTOR_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("DETECTOR_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("DETECTOR_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

#[derive(Debug, Serialize)]
struct ObserveRequest<'a> {
    video_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct FacesResponse {
    frames: Vec<Vec<FaceBox>>,
}

#[derive(Debug, Deserialize)]
struct LandmarksResponse {
    frames: Vec<Vec<FaceLandmarks>>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Client for the detection sidecar.
pub struct DetectorClient {
    http: Client,
    config: DetectorConfig,
}

impl DetectorClient {
    pub fn new(config: DetectorConfig) -> AiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AiError::Http)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> AiResult<Self> {
        Self::new(DetectorConfig::from_env())
    }

    /// Check whether the detector service is up.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<HealthResponse>()
                .await
                .map(|h| h.status == "healthy" || h.status == "ok")
                .unwrap_or(false),
            Ok(response) => {
                warn!("Detector health check failed: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Detector health check error: {}", e);
                false
            }
        }
    }

    async fn post_observe<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        video_path: &Path,
        cancel_rx: &watch::Receiver<bool>,
    ) -> MediaResult<T> {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        let request = ObserveRequest {
            video_path: &video_path.to_string_lossy(),
        };

        debug!(url = %url, "Requesting frame observations");

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if *cancel_rx.borrow() {
                return Err(MediaError::Cancelled);
            }

            match self.http.post(&url).json(&request).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|e| {
                        MediaError::detector_unavailable(format!("malformed response: {}", e))
                    });
                }
                Ok(response) => {
                    // Protocol errors are not transient; give up immediately.
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(MediaError::detector_unavailable(format!(
                        "detector returned {}: {:.200}",
                        status, body
                    )));
                }
                Err(e) if attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Detector request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        Err(MediaError::detector_unavailable(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "detector unreachable".to_string()),
        ))
    }
}

#[async_trait]
impl FaceBoxSource for DetectorClient {
    async fn observe(
        &self,
        video_path: &Path,
        cancel_rx: watch::Receiver<bool>,
    ) -> MediaResult<Vec<Vec<FaceBox>>> {
        let response: FacesResponse = self.post_observe("faces", video_path, &cancel_rx).await?;
        Ok(response.frames)
    }

    fn name(&self) -> &'static str {
        "detector-sidecar"
    }
}

#[async_trait]
impl LandmarkSource for DetectorClient {
    async fn observe(
        &self,
        video_path: &Path,
        cancel_rx: watch::Receiver<bool>,
    ) -> MediaResult<Vec<Vec<FaceLandmarks>>> {
        let response: LandmarksResponse =
            self.post_observe("landmarks", video_path, &cancel_rx).await?;
        Ok(response.frames)
    }

    fn name(&self) -> &'static str {
        "detector-sidecar"
    }
}
