//! Text-to-speech client for hook audio.

use std::path::Path;
use serde::Serialize;
use tracing::debug;

use crate::error::{AiError, AiResult};

/// Voice used for spoken hook intros.
pub const HOOK_VOICE: &str = "nova";

/// Client for a speech-synthesis endpoint.
#[derive(Debug, Clone)]
pub struct TtsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl TtsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Synthesize speech to an MP3 file.
    ///
    /// Returns the number of characters synthesized, for usage accounting.
    pub async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> AiResult<u64> {
        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: "mp3",
        };

        debug!(voice, chars = text.len(), "Requesting speech synthesis");

        let response = self
            .http
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::api(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(output, &bytes).await?;

        Ok(text.chars().count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_synthesize_writes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3mp3data".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("hook.mp3");

        let client = TtsClient::new(server.uri(), "key", "tts-1");
        let chars = client.synthesize("hello there", HOOK_VOICE, &output).await.unwrap();

        assert_eq!(chars, 11);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"ID3mp3data");
    }

    #[tokio::test]
    async fn test_api_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = TtsClient::new(server.uri(), "key", "tts-1");
        let err = client
            .synthesize("x", HOOK_VOICE, &dir.path().join("out.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Api { status: 500, .. }));
    }
}
