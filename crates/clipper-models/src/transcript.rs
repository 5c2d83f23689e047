//! Transcript models: SRT segments and word-level transcriptions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::{format_srt_timestamp, parse_timestamp};

/// One subtitle cue from an SRT file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Cue text with internal line breaks collapsed
    pub text: String,
}

/// A single word with timing from speech-to-text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscribedWord {
    pub word: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

/// Word-level transcription result.
///
/// `words` may be empty when the backend only returned segment timing;
/// caption building falls back to `segments` in that case.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<TranscribedWord>,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

/// Parse SRT subtitle content into segments.
///
/// Cues that fail to parse are skipped; an entirely unparseable input
/// yields an empty vector rather than an error so callers can decide how
/// to report a missing transcript.
pub fn parse_srt(content: &str) -> Vec<TranscriptSegment> {
    let mut segments = Vec::new();

    for block in content.replace("\r\n", "\n").split("\n\n") {
        let mut lines = block.lines().filter(|l| !l.trim().is_empty());

        // Index line is optional in malformed files.
        let Some(first) = lines.next() else { continue };
        let timing_line = if first.contains("-->") {
            first
        } else {
            match lines.next() {
                Some(l) if l.contains("-->") => l,
                _ => continue,
            }
        };

        let Some((start_raw, end_raw)) = timing_line.split_once("-->") else {
            continue;
        };
        let (Ok(start), Ok(end)) = (parse_timestamp(start_raw), parse_timestamp(end_raw)) else {
            continue;
        };

        let text = lines.collect::<Vec<_>>().join(" ").trim().to_string();
        if text.is_empty() {
            continue;
        }
        segments.push(TranscriptSegment { start, end, text });
    }

    segments
}

/// Render segments as prompt input, one cue per line:
/// `[HH:MM:SS,mmm - HH:MM:SS,mmm] text`.
pub fn render_for_prompt(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| {
            format!(
                "[{} - {}] {}",
                format_srt_timestamp(s.start),
                format_srt_timestamp(s.end),
                s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
