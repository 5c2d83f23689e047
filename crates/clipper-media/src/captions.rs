//! ASS subtitle generation and burning.

use std::path::Path;
use tracing::info;

use clipper_models::{CaptionEvent, CaptionStyle};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Format seconds as an ASS event time (`H:MM:SS.cc`).
pub fn format_ass_time(secs: f64) -> String {
    let secs = secs.max(0.0);
    let hours = (secs / 3600.0).floor() as u32;
    let mins = ((secs % 3600.0) / 60.0).floor() as u32;
    let s = (secs % 60.0).floor() as u32;
    let centis = ((secs - secs.floor()) * 100.0).round() as u32;
    format!("{}:{:02}:{:02}.{:02}", hours, mins, s, centis.min(99))
}

/// Build a complete ASS document for the given events.
///
/// White text with a black outline, bottom-centered in the portrait play
/// area; per-word colour changes arrive as inline override tags already
/// embedded in the event text.
pub fn build_ass_document(events: &[CaptionEvent], style: &CaptionStyle) -> String {
    let mut doc = String::new();

    doc.push_str("[Script Info]\n");
    doc.push_str("ScriptType: v4.00+\n");
    doc.push_str(&format!("PlayResX: {}\n", style.play_res_x));
    doc.push_str(&format!("PlayResY: {}\n", style.play_res_y));
    doc.push_str("WrapStyle: 0\n");
    doc.push_str("ScaledBorderAndShadow: yes\n\n");

    doc.push_str("[V4+ Styles]\n");
    doc.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    // Colours are AABBGGRR: white primary, black outline and shadow.
    doc.push_str(&format!(
        "Style: Default,{font},{size},&H00FFFFFF,&H00FFFFFF,&H00000000,&H80000000,\
         -1,0,0,0,100,100,0,0,1,4,2,2,60,60,{margin},1\n\n",
        font = style.font_name,
        size = style.font_size,
        margin = style.margin_v,
    ));

    doc.push_str("[Events]\n");
    doc.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
    for event in events {
        doc.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            format_ass_time(event.start),
            format_ass_time(event.end),
            event.text
        ));
    }

    doc
}

/// Write the ASS document and burn it into the clip, copying audio.
pub async fn burn_captions(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    events: &[CaptionEvent],
    style: &CaptionStyle,
) -> MediaResult<()> {
    let ass_path = output.with_extension("ass");
    tokio::fs::write(&ass_path, build_ass_document(events, style)).await?;

    info!(events = events.len(), "Burning captions");

    let cmd = FfmpegCommand::new(input, output)
        .video_filter(format!("ass='{}'", ass_path.to_string_lossy()))
        .audio_codec("copy");

    let result = runner.run(&cmd).await;
    let _ = tokio::fs::remove_file(&ass_path).await;
    result
}

/// Extract mono 16kHz PCM audio for transcription.
pub async fn extract_audio(runner: &FfmpegRunner, input: &Path, output: &Path) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(input, output)
        .output_args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"]);
    runner.run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(61.25), "0:01:01.25");
        assert_eq!(format_ass_time(3600.0), "1:00:00.00");
    }

    #[test]
    fn test_document_structure() {
        let events = vec![CaptionEvent {
            start: 4.5,
            end: 5.0,
            text: r"{\c&H00FFFF&}HELLO{\c&HFFFFFF&} WORLD".to_string(),
        }];
        let doc = build_ass_document(&events, &CaptionStyle::default());

        assert!(doc.contains("[Script Info]"));
        assert!(doc.contains("PlayResX: 1080"));
        assert!(doc.contains("PlayResY: 1920"));
        assert!(doc.contains("Style: Default,Arial Black,65,&H00FFFFFF"));
        assert!(doc.contains("Dialogue: 0,0:00:04.50,0:00:05.00,Default,,0,0,0,,"));
        assert!(doc.contains(r"{\c&H00FFFF&}HELLO{\c&HFFFFFF&} WORLD"));
    }

    #[test]
    fn test_audio_extract_args() {
        let cmd = FfmpegCommand::new("in.mp4", "out.wav")
            .output_args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"]);
        let args = cmd.build_args();
        assert!(args.windows(2).any(|w| w[0] == "-ar" && w[1] == "16000"));
        assert!(args.windows(2).any(|w| w[0] == "-ac" && w[1] == "1"));
    }
}
