//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("No subtitles available for language '{0}'")]
    SubtitleUnavailable(String),

    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create a detector unavailability error.
    pub fn detector_unavailable(message: impl Into<String>) -> Self {
        Self::DetectorUnavailable(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Keywords marking diagnostic stderr lines worth keeping.
const ERROR_MARKERS: [&str; 5] = ["error", "invalid", "failed", "cannot", "unable"];

/// How many trailing lines to keep when nothing matches a marker.
const TAIL_LINES: usize = 5;

/// Reduce tool stderr to the lines that explain a failure.
///
/// Keeps lines containing a known error marker; if none match, keeps the
/// last few lines so the diagnostic is never empty.
pub fn filter_error_lines(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();

    let flagged: Vec<&str> = lines
        .iter()
        .filter(|l| {
            let lower = l.to_lowercase();
            ERROR_MARKERS.iter().any(|m| lower.contains(m))
        })
        .copied()
        .collect();

    let kept = if flagged.is_empty() {
        let start = lines.len().saturating_sub(TAIL_LINES);
        &lines[start..]
    } else {
        &flagged[..]
    };

    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_marked_lines() {
        let stderr = "frame=100\nError opening output file\nframe=200\nInvalid argument\n";
        let filtered = filter_error_lines(stderr);
        assert_eq!(filtered, "Error opening output file\nInvalid argument");
    }

    #[test]
    fn test_filter_falls_back_to_tail() {
        let stderr = "a\nb\nc\nd\ne\nf\ng\n";
        let filtered = filter_error_lines(stderr);
        assert_eq!(filtered, "c\nd\ne\nf\ng");
    }

    #[test]
    fn test_filter_empty_input() {
        assert_eq!(filter_error_lines(""), "");
    }
}
