//! Clip worker binary.
//!
//! Turns one source video URL into short vertical clips. Configuration
//! comes from the environment (and `.env`); per-run options come from
//! the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{error, info, warn};
use uuid::Uuid;

use clipper_ai::{ChatClient, CompletionBackend, DetectorClient, GeminiClient, TtsClient, WhisperClient};
use clipper_media::command::{check_ffmpeg, check_ffprobe, check_ytdlp};
use clipper_media::tracking::TrackingMode;
use clipper_pipeline::config::TextBackend;
use clipper_pipeline::pipeline::{ClipPipeline, JobRequest};
use clipper_pipeline::{CancelToken, ClipOptions, Config, JobContext};

const USAGE: &str = "usage: autoclipper <url> [--clips N] [--fast] [--gpu] \
[--no-hook] [--no-captions] [--watermark <image>] [--lang <code>]";

fn parse_args() -> anyhow::Result<JobRequest> {
    let mut args = std::env::args().skip(1);
    let mut url = None;
    let mut options = ClipOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--clips" => {
                let value = args.next().context("--clips needs a number")?;
                options.num_clips = value.parse().context("--clips needs a number")?;
            }
            "--fast" => options.tracking_mode = TrackingMode::Fast,
            "--gpu" => options.use_gpu = true,
            "--no-hook" => options.enable_hook = false,
            "--no-captions" => options.enable_captions = false,
            "--watermark" => {
                let value = args.next().context("--watermark needs an image path")?;
                options.enable_watermark = true;
                options.watermark_path = Some(PathBuf::from(value));
            }
            "--lang" => {
                options.subtitle_lang = args.next().context("--lang needs a language code")?;
            }
            other if url.is_none() && !other.starts_with('-') => {
                url = Some(other.to_string());
            }
            other => bail!("unexpected argument {:?}\n{}", other, USAGE),
        }
    }

    let url = url.with_context(|| USAGE.to_string())?;
    if options.num_clips == 0 {
        bail!("--clips must be at least 1");
    }
    Ok(JobRequest { url, options })
}

fn check_tools() -> anyhow::Result<()> {
    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;
    check_ytdlp().context("yt-dlp is required")?;
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let request = parse_args()?;
    let config = Config::from_env()?;
    check_tools()?;

    let chat;
    let gemini;
    let backend: &dyn CompletionBackend = match config.text_backend {
        TextBackend::Chat => {
            chat = ChatClient::new(&config.api_base_url, &config.api_key, &config.text_model);
            &chat
        }
        TextBackend::Gemini => {
            gemini = GeminiClient::new(
                &config.gemini_base_url,
                &config.gemini_api_key,
                &config.text_model,
            );
            &gemini
        }
    };
    let whisper = WhisperClient::new(
        &config.api_base_url,
        &config.api_key,
        &config.transcription_model,
    );
    let tts = TtsClient::new(&config.api_base_url, &config.api_key, &config.tts_model);

    let detector = DetectorClient::from_env()?;
    if !detector.health_check().await {
        warn!("Detector service is not responding; clips will fall back to fast tracking");
    }

    let pipeline = ClipPipeline::new(&config, backend, &whisper, &tts, &detector)
        .with_landmark_source(&detector);

    let (cancel_handle, cancel_token) = CancelToken::channel();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal, cancelling job");
        cancel_handle.cancel();
    });

    let job_id = Uuid::new_v4().to_string();
    let ctx = JobContext::new(&job_id, cancel_token).with_progress_sink(Arc::new(
        |fraction, stage| {
            info!(progress = format!("{:.0}%", fraction * 100.0), stage, "Progress");
        },
    ));

    let outcomes = pipeline.run(&ctx, &request).await?;
    if outcomes.is_empty() {
        bail!("no clips were produced");
    }
    for outcome in &outcomes {
        info!(
            title = %outcome.metadata.title,
            path = %outcome.final_path.display(),
            "Clip ready"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    clipper_pipeline::logging::init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
