//! Highlight selection prompt template.
//!
//! Custom templates are validated when configuration loads, so a missing
//! placeholder surfaces before any job runs rather than as a malformed
//! prompt at selection time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholders every selection prompt must carry.
pub const REQUIRED_PLACEHOLDERS: [&str; 3] = ["{num_clips}", "{video_context}", "{transcript}"];

/// Built-in selection prompt.
pub const DEFAULT_TEMPLATE: &str = r#"You are an expert short-form video editor. From the transcript below, select the {num_clips} most engaging self-contained moments to publish as vertical clips.

Video context:
{video_context}

Rules:
- Each clip must run between 58 and 120 seconds.
- Use the exact timestamp format HH:MM:SS,mmm taken from the transcript.
- Each clip must stand on its own without outside context.
- Write hook_text as one short spoken sentence that teases the clip.

Respond with ONLY a JSON array, no prose, where every element is:
{"start_time": "HH:MM:SS,mmm", "end_time": "HH:MM:SS,mmm", "title": "...", "reason": "...", "hook_text": "..."}

Transcript:
{transcript}"#;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Prompt template is missing required placeholder {0}")]
    MissingPlaceholder(&'static str),
}

/// A validated selection prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Validate and wrap a template string.
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !template.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder(placeholder));
            }
        }
        Ok(Self { template })
    }

    /// Fill the placeholders with job values.
    pub fn render(&self, num_clips: usize, video_context: &str, transcript: &str) -> String {
        self.template
            .replace("{num_clips}", &num_clips.to_string())
            .replace("{video_context}", video_context)
            .replace("{transcript}", transcript)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_is_valid() {
        assert!(PromptTemplate::new(DEFAULT_TEMPLATE).is_ok());
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let result = PromptTemplate::new("give me {num_clips} clips from {transcript}");
        assert_eq!(
            result.unwrap_err(),
            PromptError::MissingPlaceholder("{video_context}")
        );
    }

    #[test]
    fn test_render_fills_all_placeholders() {
        let template =
            PromptTemplate::new("n={num_clips} ctx={video_context} t={transcript}").unwrap();
        let rendered = template.render(5, "a podcast", "[...] hello");
        assert_eq!(rendered, "n=5 ctx=a podcast t=[...] hello");
    }
}
