//! HTTP clients for the AI collaborators.
//!
//! Text generation (chat-completion and Gemini styles), word-level
//! speech-to-text, and text-to-speech. All clients share one error type
//! and report usage alongside their results.

pub mod chat;
pub mod detector;
pub mod error;
pub mod gemini;
pub mod tts;
pub mod whisper;

pub use chat::{ChatClient, CompletionBackend, CompletionOutput};
pub use detector::{DetectorClient, DetectorConfig};
pub use error::{AiError, AiResult};
pub use gemini::GeminiClient;
pub use tts::{TtsClient, HOOK_VOICE};
pub use whisper::WhisperClient;
