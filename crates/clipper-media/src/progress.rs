//! FFmpeg progress reporting.

use serde::{Deserialize, Serialize};

/// Progress information parsed from FFmpeg's `-progress` stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current encoding FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed relative to realtime
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fraction of the output rendered, given the expected duration.
    pub fn fraction(&self, total_duration_secs: f64) -> f64 {
        if total_duration_secs <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / 1000.0) / total_duration_secs).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let progress = FfmpegProgress { out_time_ms: 5000, ..Default::default() };
        assert!((progress.fraction(10.0) - 0.5).abs() < 1e-9);
        assert!((progress.fraction(2.0) - 1.0).abs() < 1e-9);
        assert_eq!(progress.fraction(0.0), 0.0);
    }
}
