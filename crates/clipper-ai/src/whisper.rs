//! Word-level speech-to-text client.

use std::path::Path;
use serde::Deserialize;
use tracing::debug;

use clipper_models::{TranscribedWord, Transcription, TranscriptSegment};

use crate::error::{AiError, AiResult};

/// Client for a whisper-style transcription endpoint.
#[derive(Debug, Clone)]
pub struct WhisperClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Transcribe an audio file with word timestamps.
    ///
    /// Returns the transcription plus the audio duration in seconds for
    /// usage accounting.
    pub async fn transcribe(&self, audio_path: &Path) -> AiResult<(Transcription, f64)> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        debug!(file = %file_name, "Requesting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .text("timestamp_granularities[]", "segment");

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::api(status.as_u16(), body));
        }

        let parsed: WhisperResponse = response.json().await?;
        let transcription = Transcription {
            text: parsed.text,
            words: parsed
                .words
                .into_iter()
                .map(|w| TranscribedWord { word: w.word, start: w.start, end: w.end })
                .collect(),
            segments: parsed
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text.trim().to_string(),
                })
                .collect(),
        };

        Ok((transcription, parsed.duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_transcribe_parses_words_and_segments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "hello world",
                "duration": 1.2,
                "words": [
                    {"word": "hello", "start": 0.0, "end": 0.5},
                    {"word": "world", "start": 0.5, "end": 1.0}
                ],
                "segments": [{"start": 0.0, "end": 1.0, "text": " hello world "}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("clip.wav");
        tokio::fs::write(&audio, b"RIFF").await.unwrap();

        let client = WhisperClient::new(server.uri(), "key", "whisper-1");
        let (transcription, duration) = client.transcribe(&audio).await.unwrap();

        assert_eq!(transcription.words.len(), 2);
        assert_eq!(transcription.words[1].word, "world");
        assert_eq!(transcription.segments[0].text, "hello world");
        assert!((duration - 1.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let client = WhisperClient::new("http://localhost:1", "key", "whisper-1");
        let err = client
            .transcribe(Path::new("/nonexistent/audio.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Io(_)));
    }
}
