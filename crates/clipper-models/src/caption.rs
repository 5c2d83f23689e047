//! Caption events with karaoke-style per-word highlighting.
//!
//! Words are grouped into fixed-size chunks; every word becomes one event
//! covering that word's speech time, rendering the whole chunk with only
//! the active word coloured. Colours use ASS inline override tags.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::transcript::Transcription;

/// Words shown per caption line.
pub const WORDS_PER_CHUNK: usize = 4;

/// ASS override tag for the active word (yellow, AABBGGRR ordering).
const HIGHLIGHT_TAG: &str = r"{\c&H00FFFF&}";
/// ASS override tag resetting to the base colour (white).
const RESET_TAG: &str = r"{\c&HFFFFFF&}";

/// One rendered caption event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionEvent {
    /// Start time in seconds, already shifted by the hook offset
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Display text with ASS inline markup
    pub text: String,
}

/// Style values for the ASS script header.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptionStyle {
    pub font_name: String,
    pub font_size: u32,
    /// Play area width
    pub play_res_x: u32,
    /// Play area height
    pub play_res_y: u32,
    /// Vertical margin from the bottom edge
    pub margin_v: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial Black".to_string(),
            font_size: 65,
            play_res_x: 1080,
            play_res_y: 1920,
            margin_v: 400,
        }
    }
}

/// Build ordered caption events from a transcription.
///
/// `time_offset` shifts every event forward; it is the measured hook
/// duration, or zero when the clip has no hook. When the transcription
/// carries no word timing, whole segments are emitted without
/// highlighting.
pub fn build_caption_events(transcription: &Transcription, time_offset: f64) -> Vec<CaptionEvent> {
    if transcription.words.is_empty() {
        return segment_fallback(transcription, time_offset);
    }

    let mut events = Vec::with_capacity(transcription.words.len());
    let mut last_start = 0.0_f64;

    for chunk in transcription.words.chunks(WORDS_PER_CHUNK) {
        for (i, word) in chunk.iter().enumerate() {
            let line = chunk
                .iter()
                .enumerate()
                .map(|(j, w)| {
                    let upper = w.word.trim().to_uppercase();
                    if i == j {
                        format!("{}{}{}", HIGHLIGHT_TAG, upper, RESET_TAG)
                    } else {
                        upper
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");

            // Timestamps must stay monotonic even if the backend emits
            // slightly overlapping word timings.
            let start = (word.start + time_offset).max(last_start);
            let end = (word.end + time_offset).max(start);
            last_start = start;

            events.push(CaptionEvent { start, end, text: line });
        }
    }

    events
}

fn segment_fallback(transcription: &Transcription, time_offset: f64) -> Vec<CaptionEvent> {
    let mut last_start = 0.0_f64;
    transcription
        .segments
        .iter()
        .map(|s| {
            let start = (s.start + time_offset).max(last_start);
            let end = (s.end + time_offset).max(start);
            last_start = start;
            CaptionEvent {
                start,
                end,
                text: s.text.trim().to_uppercase(),
            }
        })
        .collect()
}
