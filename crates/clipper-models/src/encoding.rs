//! Encoder profile resolved once per job and shared by all stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Video encoder arguments for FFmpeg invocations.
///
/// Resolved a single time when a job starts and treated as immutable
/// afterwards so every stage of a clip encodes identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncoderProfile {
    /// FFmpeg encoder name (`libx264` or `h264_nvenc`)
    pub codec: String,
    /// Encoder preset
    pub preset: String,
    /// Quality value (CRF for CPU, CQ for NVENC)
    pub quality: u32,
    /// Whether this profile targets a hardware encoder
    pub hardware: bool,
}

impl EncoderProfile {
    /// Fixed software fallback profile.
    pub fn cpu() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "fast".to_string(),
            quality: 18,
            hardware: false,
        }
    }

    /// NVENC hardware profile.
    pub fn nvenc() -> Self {
        Self {
            codec: "h264_nvenc".to_string(),
            preset: "fast".to_string(),
            quality: 18,
            hardware: true,
        }
    }

    /// Ordered FFmpeg output arguments for this profile.
    ///
    /// NVENC rates with `-cq`; software encoders with `-crf`.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let rate_flag = if self.hardware { "-cq" } else { "-crf" };
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            rate_flag.to_string(),
            self.quality.to_string(),
        ]
    }
}

impl Default for EncoderProfile {
    fn default() -> Self {
        Self::cpu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_args() {
        let args = EncoderProfile::cpu().to_ffmpeg_args();
        assert_eq!(args, vec!["-c:v", "libx264", "-preset", "fast", "-crf", "18"]);
    }

    #[test]
    fn test_nvenc_uses_cq() {
        let args = EncoderProfile::nvenc().to_ffmpeg_args();
        assert_eq!(args, vec!["-c:v", "h264_nvenc", "-preset", "fast", "-cq", "18"]);
    }
}
