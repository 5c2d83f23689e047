//! Environment-based configuration.

use std::path::PathBuf;

use clipper_models::PromptTemplate;

use crate::error::{PipelineError, PipelineResult};

/// Which text-generation API shape to use for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBackend {
    Chat,
    Gemini,
}

/// Worker configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the OpenAI-compatible API
    pub api_base_url: String,
    /// API key for chat/transcription/TTS calls
    pub api_key: String,
    /// Selection backend shape
    pub text_backend: TextBackend,
    /// Base URL for the Gemini API (when selected)
    pub gemini_base_url: String,
    /// Gemini API key (when selected)
    pub gemini_api_key: String,
    /// Text-generation model name
    pub text_model: String,
    /// Speech-to-text model name
    pub transcription_model: String,
    /// Text-to-speech model name
    pub tts_model: String,
    /// Directory for finished clips
    pub output_dir: PathBuf,
    /// Scratch directory for intermediates
    pub work_dir: PathBuf,
    /// Selection prompt, validated at load
    pub prompt_template: PromptTemplate,
}

impl Config {
    /// Load from the environment (and `.env`, when present).
    ///
    /// A custom prompt template is validated here so a missing
    /// placeholder fails startup instead of the first job.
    pub fn from_env() -> PipelineResult<Self> {
        dotenvy::dotenv().ok();

        let api_key = required("OPENAI_API_KEY")?;
        let text_backend = match std::env::var("TEXT_BACKEND").as_deref() {
            Ok("gemini") => TextBackend::Gemini,
            _ => TextBackend::Chat,
        };

        let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if text_backend == TextBackend::Gemini && gemini_api_key.is_empty() {
            return Err(PipelineError::config(
                "TEXT_BACKEND=gemini requires GEMINI_API_KEY",
            ));
        }

        let prompt_template = match std::env::var("PROMPT_TEMPLATE_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    PipelineError::config(format!("cannot read {}: {}", path, e))
                })?;
                PromptTemplate::new(raw)
                    .map_err(|e| PipelineError::config(e.to_string()))?
            }
            Err(_) => PromptTemplate::default(),
        };

        Ok(Self {
            api_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            api_key,
            text_backend,
            gemini_base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            gemini_api_key,
            text_model: env_or("TEXT_MODEL", "gpt-4o"),
            transcription_model: env_or("TRANSCRIPTION_MODEL", "whisper-1"),
            tts_model: env_or("TTS_MODEL", "tts-1"),
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "clips")),
            work_dir: PathBuf::from(env_or("WORK_DIR", "work")),
            prompt_template,
        })
    }
}

fn required(name: &str) -> PipelineResult<String> {
    std::env::var(name)
        .map_err(|_| PipelineError::config(format!("{} is not set", name)))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
