//! Source video acquisition via yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{info, warn};

use clipper_models::VideoInfo;

use crate::command::check_ytdlp;
use crate::error::{filter_error_lines, MediaError, MediaResult};

/// Cookie strategies tried in order until a download succeeds.
///
/// Age-restricted or member videos often need browser cookies; public
/// videos download fine with none.
const COOKIE_STRATEGIES: [Option<&str>; 3] = [Some("chrome"), Some("edge"), None];

/// A downloaded source video with its subtitle track.
#[derive(Debug, Clone)]
pub struct AcquiredSource {
    pub video_path: PathBuf,
    pub subtitle_path: PathBuf,
    pub info: VideoInfo,
}

/// Fetch video metadata without downloading.
pub async fn fetch_video_info(url: &str) -> MediaResult<VideoInfo> {
    check_ytdlp()?;

    let output = Command::new("yt-dlp")
        .args(["--dump-json", "--no-download", url])
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::download_failed(format!(
            "metadata fetch failed: {}",
            filter_error_lines(&String::from_utf8_lossy(&output.stderr))
        )));
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Download a source video with subtitles into `dest_dir`.
///
/// Tries each cookie strategy in order; the error of the final attempt is
/// reported when all fail. A missing subtitle track after a successful
/// download is its own error so the caller can distinguish "video
/// unavailable" from "no transcript".
pub async fn download_source(
    url: &str,
    dest_dir: &Path,
    subtitle_lang: &str,
    cancel_rx: &watch::Receiver<bool>,
) -> MediaResult<AcquiredSource> {
    check_ytdlp()?;
    tokio::fs::create_dir_all(dest_dir).await?;

    let info = fetch_video_info(url).await?;
    let output_template = dest_dir.join("source.%(ext)s");
    let mut last_error = String::new();

    for strategy in COOKIE_STRATEGIES {
        if *cancel_rx.borrow() {
            return Err(MediaError::Cancelled);
        }

        let mut cmd = Command::new("yt-dlp");
        cmd.args([
            "-f",
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best",
            "--merge-output-format",
            "mp4",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            subtitle_lang,
            "--convert-subs",
            "srt",
            "-o",
        ])
        .arg(&output_template)
        .arg(url)
        .stdin(Stdio::null());

        if let Some(browser) = strategy {
            cmd.args(["--cookies-from-browser", browser]);
        }

        info!(
            strategy = strategy.unwrap_or("none"),
            "Downloading source video"
        );

        let output = cmd.output().await?;
        if output.status.success() {
            return finish_download(dest_dir, subtitle_lang, info).await;
        }

        last_error = filter_error_lines(&String::from_utf8_lossy(&output.stderr));
        warn!(
            strategy = strategy.unwrap_or("none"),
            "Download attempt failed"
        );
    }

    Err(MediaError::download_failed(last_error))
}

async fn finish_download(
    dest_dir: &Path,
    subtitle_lang: &str,
    info: VideoInfo,
) -> MediaResult<AcquiredSource> {
    let video_path = dest_dir.join("source.mp4");
    if !video_path.exists() {
        return Err(MediaError::download_failed(
            "download reported success but produced no source.mp4",
        ));
    }

    let subtitle_path = find_subtitle(dest_dir, subtitle_lang)
        .await?
        .ok_or_else(|| MediaError::SubtitleUnavailable(subtitle_lang.to_string()))?;

    Ok(AcquiredSource { video_path, subtitle_path, info })
}

/// Locate the converted SRT file for the requested language.
///
/// yt-dlp names subtitles `source.<lang>.srt` but the language tag may
/// carry a region suffix (`en-US`), so match on prefix.
async fn find_subtitle(dest_dir: &Path, lang: &str) -> MediaResult<Option<PathBuf>> {
    let exact = dest_dir.join(format!("source.{}.srt", lang));
    if exact.exists() {
        return Ok(Some(exact));
    }

    let prefix = format!("source.{}", lang);
    let mut entries = tokio::fs::read_dir(dest_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && name.ends_with(".srt") {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_subtitle_matches_region_variant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.en-US.srt");
        tokio::fs::write(&path, "1\n00:00:00,000 --> 00:00:01,000\nhi\n")
            .await
            .unwrap();

        let found = find_subtitle(dir.path(), "en").await.unwrap();
        assert_eq!(found, Some(path));
    }

    #[tokio::test]
    async fn test_find_subtitle_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_subtitle(dir.path(), "en").await.unwrap().is_none());
    }

    #[test]
    fn test_strategy_order_ends_with_no_cookies() {
        assert_eq!(COOKIE_STRATEGIES.last(), Some(&None));
    }
}
