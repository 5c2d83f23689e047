//! Timestamp parsing and validation utilities.
//!
//! Highlights and SRT cues carry timestamps as `HH:MM:SS,mmm` (SRT form).
//! Parsing also accepts the dot variant and shorter `MM:SS` / `SS` forms so
//! model output that drops leading components still resolves.

/// Maximum reasonable video duration (24 hours in seconds).
pub const MAX_VIDEO_DURATION_SECS: f64 = 86400.0;

/// Parse a timestamp string to total seconds.
///
/// Supports formats:
/// - `HH:MM:SS,mmm` or `HH:MM:SS.mmm` or `HH:MM:SS`
/// - `MM:SS` or `MM:SS.mmm`
/// - `SS` or `SS.mmm`
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }
    // SRT uses a comma before the millisecond field.
    let ts = ts.replace(',', ".");

    let parts: Vec<&str> = ts.split(':').collect();
    match parts.len() {
        1 => {
            let seconds: f64 = parts[0]
                .parse()
                .map_err(|_| TimestampError::InvalidValue("seconds", parts[0].to_string()))?;
            if seconds < 0.0 {
                return Err(TimestampError::Negative);
            }
            Ok(seconds)
        }
        2 => {
            let minutes: f64 = parts[0]
                .parse()
                .map_err(|_| TimestampError::InvalidValue("minutes", parts[0].to_string()))?;
            let seconds: f64 = parts[1]
                .parse()
                .map_err(|_| TimestampError::InvalidValue("seconds", parts[1].to_string()))?;
            if minutes < 0.0 || seconds < 0.0 {
                return Err(TimestampError::Negative);
            }
            Ok(minutes * 60.0 + seconds)
        }
        3 => {
            let hours: f64 = parts[0]
                .parse()
                .map_err(|_| TimestampError::InvalidValue("hours", parts[0].to_string()))?;
            let minutes: f64 = parts[1]
                .parse()
                .map_err(|_| TimestampError::InvalidValue("minutes", parts[1].to_string()))?;
            let seconds: f64 = parts[2]
                .parse()
                .map_err(|_| TimestampError::InvalidValue("seconds", parts[2].to_string()))?;
            if hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
                return Err(TimestampError::Negative);
            }
            Ok(hours * 3600.0 + minutes * 60.0 + seconds)
        }
        _ => Err(TimestampError::InvalidFormat(ts.to_string())),
    }
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Rounds to whole milliseconds first so the carry propagates into the
/// seconds component.
pub fn format_srt_timestamp(total_secs: f64) -> String {
    let total_millis = (total_secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let mins = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Validated timestamp pair with computed duration.
#[derive(Debug, Clone)]
pub struct ValidatedSpan {
    /// Start time in seconds
    pub start_secs: f64,
    /// End time in seconds
    pub end_secs: f64,
    /// Duration in seconds
    pub duration_secs: f64,
}

/// Validate a start/end timestamp pair.
///
/// Checks that both parse, start is before end, and neither exceeds the
/// maximum reasonable duration.
pub fn validate_span(start: &str, end: &str) -> Result<ValidatedSpan, TimestampError> {
    let start_secs = parse_timestamp(start)?;
    let end_secs = parse_timestamp(end)?;

    if start_secs >= end_secs {
        return Err(TimestampError::StartNotBeforeEnd);
    }
    if start_secs > MAX_VIDEO_DURATION_SECS || end_secs > MAX_VIDEO_DURATION_SECS {
        return Err(TimestampError::ExceedsMaxDuration(MAX_VIDEO_DURATION_SECS));
    }

    Ok(ValidatedSpan {
        start_secs,
        end_secs,
        duration_secs: end_secs - start_secs,
    })
}

/// Timestamp parsing/validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// Timestamp string is empty
    Empty,
    /// Timestamp contains negative values
    Negative,
    /// Invalid numeric value for a component
    InvalidValue(&'static str, String),
    /// Invalid timestamp format
    InvalidFormat(String),
    /// Start time is not before end time
    StartNotBeforeEnd,
    /// Timestamp exceeds maximum allowed duration
    ExceedsMaxDuration(f64),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timestamp cannot be empty"),
            Self::Negative => write!(f, "Timestamp cannot be negative"),
            Self::InvalidValue(component, value) => {
                write!(f, "Invalid {} value: {}", component, value)
            }
            Self::InvalidFormat(ts) => write!(
                f,
                "Invalid timestamp format '{}'. Use HH:MM:SS,mmm, HH:MM:SS, MM:SS, or SS",
                ts
            ),
            Self::StartNotBeforeEnd => write!(f, "Start time must be before end time"),
            Self::ExceedsMaxDuration(max) => {
                write!(f, "Timestamps exceed maximum allowed duration ({} hours)", max / 3600.0)
            }
        }
    }
}

impl std::error::Error for TimestampError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_srt_form() {
        assert!((parse_timestamp("00:01:00,000").unwrap() - 60.0).abs() < 1e-9);
        assert!((parse_timestamp("00:02:10,000").unwrap() - 130.0).abs() < 1e-9);
        assert!((parse_timestamp("00:00:30,500").unwrap() - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_timestamp_dot_and_short_forms() {
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert!((parse_timestamp("00:00:30.500").unwrap() - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("  "), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("abc"), Err(TimestampError::InvalidValue(_, _))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
    }

    #[test]
    fn test_format_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(70.0), "00:01:10,000");
        assert_eq!(format_srt_timestamp(3661.5), "01:01:01,500");
    }

    #[test]
    fn test_format_srt_timestamp_millis_carry() {
        // Rounding up at a second boundary must carry, not render ",1000".
        assert_eq!(format_srt_timestamp(59.9996), "00:01:00,000");
        assert_eq!(format_srt_timestamp(0.9995), "00:00:01,000");
        assert_eq!(format_srt_timestamp(3599.9999), "01:00:00,000");
    }

    #[test]
    fn test_validate_span() {
        let span = validate_span("00:01:00,000", "00:02:10,000").unwrap();
        assert!((span.duration_secs - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_span_start_after_end() {
        let result = validate_span("00:02:00,000", "00:01:00,000");
        assert!(matches!(result, Err(TimestampError::StartNotBeforeEnd)));
    }
}
