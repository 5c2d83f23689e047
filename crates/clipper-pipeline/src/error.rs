//! Pipeline error taxonomy.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors a job can end with.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    #[error("Highlight response could not be parsed: {0}")]
    HighlightParse(String),

    #[error("No usable highlights were found")]
    NoHighlights,

    #[error("Transcode failed during {stage}: {detail}")]
    Transcode { stage: String, detail: String },

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("AI call failed: {0}")]
    Ai(#[from] clipper_ai::AiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    pub fn highlight_parse(msg: impl Into<String>) -> Self {
        Self::HighlightParse(msg.into())
    }

    pub fn transcode(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Transcode {
            stage: stage.into(),
            detail: detail.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the job ended because the user asked it to stop.
    ///
    /// Only the typed variant counts; message text is never inspected.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Short human-readable summary for job status reporting.
    ///
    /// Known members get a friendly message; anything else is truncated
    /// raw detail, with the full error left to the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Acquisition(_) => "The source video could not be downloaded.".to_string(),
            Self::HighlightParse(_) => {
                "The AI returned an unreadable highlight list.".to_string()
            }
            Self::NoHighlights => {
                "No highlights of a usable length were found in this video.".to_string()
            }
            Self::Transcode { stage, .. } => {
                format!("Video processing failed during the {} stage.", stage)
            }
            Self::DependencyUnavailable(_) => {
                "A required processing component is unavailable.".to_string()
            }
            Self::Cancelled => "The job was cancelled.".to_string(),
            Self::Timeout(secs) => format!("Processing stalled and was stopped after {}s.", secs),
            other => {
                let mut raw = other.to_string();
                if raw.len() > 200 {
                    raw.truncate(200);
                    raw.push('…');
                }
                raw
            }
        }
    }
}

/// Map media-layer errors into the pipeline taxonomy, tagging transcode
/// failures with the stage they happened in.
pub fn from_media(stage: &str, err: clipper_media::MediaError) -> PipelineError {
    use clipper_media::MediaError;

    match err {
        MediaError::Cancelled => PipelineError::Cancelled,
        MediaError::Timeout(secs) => PipelineError::Timeout(secs),
        MediaError::DetectorUnavailable(reason) => PipelineError::DependencyUnavailable(reason),
        MediaError::FfmpegNotFound | MediaError::FfprobeNotFound | MediaError::YtDlpNotFound => {
            PipelineError::DependencyUnavailable(err.to_string())
        }
        MediaError::DownloadFailed { message } => PipelineError::Acquisition(message),
        MediaError::SubtitleUnavailable(lang) => {
            PipelineError::Acquisition(format!("no subtitles available for '{}'", lang))
        }
        MediaError::FfmpegFailed { message, stderr, .. } => {
            let detail = match stderr {
                Some(s) if !s.is_empty() => format!("{}: {}", message, s),
                _ => message,
            };
            PipelineError::transcode(stage, detail)
        }
        other => PipelineError::transcode(stage, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipper_media::MediaError;

    #[test]
    fn test_cancellation_is_typed_not_textual() {
        // An error whose text mentions cancellation is still not Cancelled.
        let err = PipelineError::transcode("cut", "user wanted to cancel maybe");
        assert!(!err.is_cancelled());
        assert!(PipelineError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_media_cancelled_maps_to_cancelled() {
        assert!(from_media("portrait", MediaError::Cancelled).is_cancelled());
    }

    #[test]
    fn test_ffmpeg_failure_carries_stage_and_stderr() {
        let err = from_media(
            "caption",
            MediaError::ffmpeg_failed("boom", Some("Invalid argument".into()), Some(1)),
        );
        match err {
            PipelineError::Transcode { stage, detail } => {
                assert_eq!(stage, "caption");
                assert!(detail.contains("Invalid argument"));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_user_message_truncates_unknown_detail() {
        let err = PipelineError::Config("x".repeat(500));
        assert!(err.user_message().len() <= 210);
    }
}
