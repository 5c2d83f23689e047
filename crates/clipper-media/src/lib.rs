//! FFmpeg and yt-dlp wrappers for clip processing.
//!
//! This crate wraps the external tools behind typed async APIs:
//! - Command builder/runner with progress, cancellation, and stall watchdog
//! - Source acquisition (yt-dlp) with cookie strategy fallback
//! - Segment cutting, portrait reframing, hooks, captions, watermarks
//! - Speaker tracking and crop stabilization

pub mod acquire;
pub mod captions;
pub mod command;
pub mod cut;
pub mod encoder;
pub mod error;
pub mod fs_utils;
pub mod hook;
pub mod portrait;
pub mod probe;
pub mod progress;
pub mod tracking;
pub mod watermark;

pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
