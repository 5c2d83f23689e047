//! Shared data models for the AutoClipper pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Highlights and timestamp handling
//! - Transcripts (SRT segments and word-level transcriptions)
//! - Caption events with karaoke markup
//! - Encoder profiles
//! - Prompt templates and clip metadata

pub mod caption;
pub mod encoding;
pub mod highlight;
pub mod metadata;
pub mod prompt;
pub mod timestamp;
pub mod transcript;
pub mod usage;

// Re-export common types
pub use caption::{build_caption_events, CaptionEvent, CaptionStyle};
pub use encoding::EncoderProfile;
pub use highlight::{Highlight, MAX_CLIP_SECS, MIN_CLIP_SECS, OVER_REQUEST_MARGIN};
pub use metadata::{ClipMetadata, VideoInfo};
pub use prompt::{PromptError, PromptTemplate};
pub use timestamp::{format_srt_timestamp, parse_timestamp, TimestampError};
pub use transcript::{parse_srt, TranscribedWord, Transcription, TranscriptSegment};
pub use usage::TokenUsage;
