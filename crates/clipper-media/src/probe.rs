//! FFprobe wrapper for media inspection.

use std::path::Path;
use std::process::Stdio;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Properties of a media file needed by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MediaProbe {
    /// Container duration in seconds
    pub duration: f64,
    /// Video width in pixels (0 when no video stream)
    pub width: u32,
    /// Video height in pixels
    pub height: u32,
    /// Video frame rate
    pub fps: f64,
    /// Pixel format of the video stream
    pub pix_fmt: String,
    /// Audio sample rate in Hz (0 when no audio stream)
    pub sample_rate: u32,
    /// Audio channel count
    pub channels: u32,
    /// Whether the file has an audio stream
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    r_frame_rate: Option<String>,
    #[serde(default)]
    pix_fmt: Option<String>,
    #[serde(default)]
    sample_rate: Option<String>,
    #[serde(default)]
    channels: Option<u32>,
}

/// Probe a media file with ffprobe.
pub async fn probe_media(path: &Path) -> MediaResult<MediaProbe> {
    check_ffprobe()?;

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        });
    }

    let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)?;
    let mut probe = MediaProbe {
        duration: parsed
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(0.0),
        ..Default::default()
    };

    for stream in &parsed.streams {
        match stream.codec_type.as_str() {
            "video" if probe.width == 0 => {
                probe.width = stream.width.unwrap_or(0);
                probe.height = stream.height.unwrap_or(0);
                probe.fps = stream
                    .r_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .unwrap_or(0.0);
                probe.pix_fmt = stream.pix_fmt.clone().unwrap_or_default();
            }
            "audio" if !probe.has_audio => {
                probe.has_audio = true;
                probe.sample_rate = stream
                    .sample_rate
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
                probe.channels = stream.channels.unwrap_or(0);
            }
            _ => {}
        }
    }

    debug!(
        duration = probe.duration,
        width = probe.width,
        height = probe.height,
        fps = probe.fps,
        "Probed media file"
    );

    Ok(probe)
}

/// Probe only the duration of a media file.
pub async fn probe_duration(path: &Path) -> MediaResult<f64> {
    Ok(probe_media(path).await?.duration)
}

/// Parse an ffprobe rational frame rate like `30000/1001`.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => rate.parse().ok(),
    }
}
