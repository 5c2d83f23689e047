//! Token/usage accounting reported through the job's usage sink.

use serde::{Deserialize, Serialize};

/// Usage attributed to one external AI call.
///
/// Reported as a side effect for billing; failures to deliver a record
/// never affect job correctness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens consumed by a text-generation call
    pub prompt_tokens: u64,
    /// Completion tokens produced by a text-generation call
    pub completion_tokens: u64,
    /// Seconds of audio transcribed
    pub transcription_seconds: f64,
    /// Characters synthesized by text-to-speech
    pub tts_characters: u64,
}

impl TokenUsage {
    pub fn completion(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self { prompt_tokens, completion_tokens, ..Default::default() }
    }

    pub fn transcription(seconds: f64) -> Self {
        Self { transcription_seconds: seconds, ..Default::default() }
    }

    pub fn tts(characters: u64) -> Self {
        Self { tts_characters: characters, ..Default::default() }
    }
}
