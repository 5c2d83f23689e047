//! Encoder availability detection.

use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use clipper_models::EncoderProfile;

use crate::command::check_ffmpeg;
use crate::error::MediaResult;

/// Resolve the encoder profile for a job.
///
/// Probes the local FFmpeg build for NVENC when GPU encoding is requested;
/// any probe failure falls back to the software profile so a job never
/// dies on a missing encoder.
pub async fn resolve_profile(use_gpu: bool) -> MediaResult<EncoderProfile> {
    check_ffmpeg()?;

    if !use_gpu {
        return Ok(EncoderProfile::cpu());
    }

    match nvenc_available().await {
        Ok(true) => {
            info!("h264_nvenc available, using hardware encoding");
            Ok(EncoderProfile::nvenc())
        }
        Ok(false) => {
            warn!("GPU encoding requested but h264_nvenc not present, using libx264");
            Ok(EncoderProfile::cpu())
        }
        Err(e) => {
            warn!("Encoder probe failed ({}), using libx264", e);
            Ok(EncoderProfile::cpu())
        }
    }
}

async fn nvenc_available() -> MediaResult<bool> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .await?;

    let listing = String::from_utf8_lossy(&output.stdout);
    Ok(listing.contains("h264_nvenc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cpu_requested_skips_probe() {
        // With GPU disabled the resolver must not depend on encoder
        // availability at all.
        if check_ffmpeg().is_ok() {
            let profile = resolve_profile(false).await.unwrap();
            assert!(!profile.hardware);
            assert_eq!(profile.codec, "libx264");
        }
    }
}
