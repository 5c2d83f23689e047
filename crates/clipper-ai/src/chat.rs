//! Chat-completion text generation client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use clipper_models::TokenUsage;

use crate::error::{AiError, AiResult};

/// Output of one text-generation call.
#[derive(Debug, Clone)]
pub struct CompletionOutput {
    pub text: String,
    pub usage: TokenUsage,
}

/// Seam over the text-generation backends.
///
/// The highlight selector only needs "prompt in, text out"; chat and
/// Gemini clients both implement this, and tests script it.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> AiResult<CompletionOutput>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, prompt: &str) -> AiResult<CompletionOutput> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.7,
        };

        debug!(model = %self.model, "Requesting chat completion");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::api(status.as_u16(), body));
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::malformed("completion response carried no choices"))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(CompletionOutput {
            text,
            usage: TokenUsage::completion(usage.prompt_tokens, usage.completion_tokens),
        })
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete_parses_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "[]"}}],
                "usage": {"prompt_tokens": 120, "completion_tokens": 30}
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri(), "key", "model-x");
        let output = client.complete("prompt").await.unwrap();
        assert_eq!(output.text, "[]");
        assert_eq!(output.usage.prompt_tokens, 120);
        assert_eq!(output.usage.completion_tokens, 30);
    }

    #[tokio::test]
    async fn test_error_status_surfaces_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri(), "key", "model-x");
        let err = client.complete("prompt").await.unwrap_err();
        match err {
            AiError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri(), "key", "model-x");
        assert!(matches!(
            client.complete("prompt").await,
            Err(AiError::MalformedResponse(_))
        ));
    }
}
