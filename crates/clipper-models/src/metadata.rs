//! Clip metadata and source video info records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::highlight::Highlight;

/// Maximum length of the description carried into prompts.
const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Source video info, a subset of the downloader's JSON dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "uploader")]
    pub channel: String,
}

impl VideoInfo {
    /// Render as prompt context, truncating long descriptions.
    pub fn as_prompt_context(&self) -> String {
        let description: String = self.description.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!(
            "Title: {}\nChannel: {}\nDescription: {}",
            self.title, self.channel, description
        )
    }
}

/// Per-clip metadata written as `data.json` in the clip directory.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipMetadata {
    pub title: String,
    pub hook_text: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    pub has_hook: bool,
    pub has_captions: bool,
    pub has_watermark: bool,
}

impl ClipMetadata {
    pub fn from_highlight(
        highlight: &Highlight,
        has_hook: bool,
        has_captions: bool,
        has_watermark: bool,
    ) -> Self {
        Self {
            title: highlight.title.clone(),
            hook_text: highlight.hook_text.clone(),
            start_time: highlight.start_time.clone(),
            end_time: highlight.end_time.clone(),
            duration_seconds: highlight.duration_seconds,
            has_hook,
            has_captions,
            has_watermark,
        }
    }
}
