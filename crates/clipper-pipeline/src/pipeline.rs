//! End-to-end clip job orchestration.

use std::path::{Path, PathBuf};
use chrono::Local;
use tracing::{info, warn};

use clipper_ai::{CompletionBackend, TtsClient, WhisperClient, HOOK_VOICE};
use clipper_media::portrait::PortraitConverter;
use clipper_media::tracking::{FaceBoxSource, LandmarkSource, TrackerSettings};
use clipper_media::{acquire, captions, cut, encoder, fs_utils, hook, watermark, FfmpegRunner};
use clipper_models::{
    build_caption_events, CaptionStyle, ClipMetadata, EncoderProfile, Highlight, TokenUsage,
};
use clipper_models::timestamp::validate_span;
use clipper_models::transcript::{parse_srt, render_for_prompt};

use crate::config::Config;
use crate::context::JobContext;
use crate::error::{from_media, PipelineError, PipelineResult};
use crate::job::{ClipOptions, ClipStage, StagePlan, CLEANUP_PROGRESS, SELECTION_PROGRESS};
use crate::selector::HighlightSelector;

/// A request to turn one source video into clips.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub url: String,
    pub options: ClipOptions,
}

/// One finished clip.
#[derive(Debug, Clone)]
pub struct ClipOutcome {
    pub directory: PathBuf,
    pub final_path: PathBuf,
    pub metadata: ClipMetadata,
}

/// The clip pipeline, wired with its external collaborators.
pub struct ClipPipeline<'a> {
    config: &'a Config,
    backend: &'a dyn CompletionBackend,
    whisper: &'a WhisperClient,
    tts: &'a TtsClient,
    face_source: &'a dyn FaceBoxSource,
    landmark_source: Option<&'a dyn LandmarkSource>,
    tracker_settings: TrackerSettings,
}

impl<'a> ClipPipeline<'a> {
    pub fn new(
        config: &'a Config,
        backend: &'a dyn CompletionBackend,
        whisper: &'a WhisperClient,
        tts: &'a TtsClient,
        face_source: &'a dyn FaceBoxSource,
    ) -> Self {
        Self {
            config,
            backend,
            whisper,
            tts,
            face_source,
            landmark_source: None,
            tracker_settings: TrackerSettings::default(),
        }
    }

    pub fn with_landmark_source(mut self, source: &'a dyn LandmarkSource) -> Self {
        self.landmark_source = Some(source);
        self
    }

    pub fn with_tracker_settings(mut self, settings: TrackerSettings) -> Self {
        self.tracker_settings = settings;
        self
    }

    /// Run one job to completion.
    ///
    /// A failing clip is logged and skipped; cancellation and stalls end
    /// the whole job. The scratch directory is cleared on every exit
    /// path.
    pub async fn run(&self, ctx: &JobContext, request: &JobRequest) -> PipelineResult<Vec<ClipOutcome>> {
        let work_dir = self.config.work_dir.join(&ctx.job_id);
        tokio::fs::create_dir_all(&work_dir).await?;

        let result = self.run_inner(ctx, request, &work_dir).await;

        if let Err(e) = fs_utils::clear_scratch_dir(&work_dir).await {
            warn!("Failed to clear scratch dir: {}", e);
        }

        match &result {
            Ok(outcomes) => ctx.logger.log_completion(&format!("{} clips produced", outcomes.len())),
            Err(e) if e.is_cancelled() => ctx.logger.log_progress("job cancelled"),
            Err(e) => ctx.logger.log_error(&e.user_message()),
        }
        result
    }

    async fn run_inner(
        &self,
        ctx: &JobContext,
        request: &JobRequest,
        work_dir: &Path,
    ) -> PipelineResult<Vec<ClipOutcome>> {
        let options = &request.options;
        ctx.cancel.ensure_active()?;
        ctx.logger.log_start(&format!("source {}", request.url));

        // Acquire source and transcript.
        ctx.report_progress(0.05, "acquire");
        let source = acquire::download_source(
            &request.url,
            work_dir,
            &options.subtitle_lang,
            &ctx.cancel.receiver(),
        )
        .await
        .map_err(|e| from_media("acquire", e))?;

        ctx.report_progress(0.1, "transcript");
        let srt = tokio::fs::read_to_string(&source.subtitle_path).await?;
        let segments = parse_srt(&srt);
        if segments.is_empty() {
            return Err(PipelineError::acquisition("transcript contained no usable cues"));
        }
        let transcript_text = render_for_prompt(&segments);

        // Select highlights.
        ctx.cancel.ensure_active()?;
        let selector = HighlightSelector::new(self.backend, self.config.prompt_template.clone());
        let highlights = selector
            .select(ctx, &transcript_text, &source.info.as_prompt_context(), options.num_clips)
            .await?;
        ctx.report_progress(SELECTION_PROGRESS, "select");

        // One profile for the whole job; every stage encodes identically.
        let profile = encoder::resolve_profile(options.use_gpu)
            .await
            .map_err(|e| from_media("encode", e))?;

        let plan = StagePlan::from_options(options);
        let job_started = Local::now();
        let total = highlights.len();
        let mut outcomes = Vec::new();

        for (i, highlight) in highlights.iter().enumerate() {
            ctx.cancel.ensure_active()?;
            let clip_index = i + 1;

            match self
                .assemble_clip(
                    ctx, &plan, options, &profile, &source.video_path, highlight, clip_index,
                    total, &job_started, work_dir,
                )
                .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => absorb_clip_failure(ctx, clip_index, total, e)?,
            }
        }

        ctx.report_progress(CLEANUP_PROGRESS, "cleanup");
        ctx.report_progress(1.0, "done");
        Ok(outcomes)
    }

    #[allow(clippy::too_many_arguments)]
    async fn assemble_clip(
        &self,
        ctx: &JobContext,
        plan: &StagePlan,
        options: &ClipOptions,
        profile: &EncoderProfile,
        source_video: &Path,
        highlight: &Highlight,
        clip_index: usize,
        total: usize,
        job_started: &chrono::DateTime<Local>,
        work_dir: &Path,
    ) -> PipelineResult<ClipOutcome> {
        let clip_dir = fs_utils::create_clip_dir(&self.config.output_dir, job_started, clip_index)
            .await
            .map_err(|e| from_media("setup", e))?;
        let runner = FfmpegRunner::new().with_cancel(ctx.cancel.receiver());
        let report = |stage: ClipStage, sub: f64| {
            ctx.report_progress(plan.progress(clip_index, total, stage, sub), stage.label());
        };

        info!(clip = clip_index, total, title = %highlight.title, "Assembling clip");

        // CUT
        ctx.cancel.ensure_active()?;
        report(ClipStage::Cut, 0.0);
        let span = validate_span(&highlight.start_time, &highlight.end_time)
            .map_err(|e| PipelineError::highlight_parse(e.to_string()))?;
        let cut_path = clip_dir.join("01_cut.mp4");
        let cut_ctx = ctx.clone();
        let cut_plan = plan.clone();
        cut::cut_segment(
            &runner,
            source_video,
            &cut_path,
            span.start_secs,
            span.end_secs,
            profile,
            move |sub| {
                cut_ctx.report_progress(
                    cut_plan.progress(clip_index, total, ClipStage::Cut, sub),
                    ClipStage::Cut.label(),
                );
            },
        )
        .await
        .map_err(|e| from_media("cut", e))?;
        let mut current = cut_path;

        // PORTRAIT
        ctx.cancel.ensure_active()?;
        report(ClipStage::Portrait, 0.0);
        let portrait_path = clip_dir.join("02_portrait.mp4");
        let mut converter = PortraitConverter::new(self.face_source, self.tracker_settings.clone());
        if let Some(landmarks) = self.landmark_source {
            converter = converter.with_landmarks(landmarks);
        }
        converter
            .convert(
                &runner,
                &current,
                &portrait_path,
                options.tracking_mode,
                ctx.cancel.receiver(),
                profile,
            )
            .await
            .map_err(|e| from_media("portrait", e))?;
        fs_utils::remove_intermediates(&[current]).await;
        current = portrait_path;
        // Captions are timed against the pre-hook clip.
        let pre_hook = current.clone();

        // HOOK
        let mut has_hook = false;
        let mut hook_duration = 0.0;
        if options.enable_hook {
            ctx.cancel.ensure_active()?;
            report(ClipStage::Hook, 0.0);
            if highlight.hook_text.trim().is_empty() {
                warn!(clip = clip_index, "Highlight has no hook text, skipping hook");
            } else {
                let hook_audio = work_dir.join(format!("hook_{:02}.mp3", clip_index));
                let chars = self
                    .tts
                    .synthesize(&highlight.hook_text, HOOK_VOICE, &hook_audio)
                    .await?;
                ctx.report_usage(TokenUsage::tts(chars));

                let hooked = clip_dir.join("03_hook.mp4");
                hook_duration =
                    hook::compose_hook(&runner, &current, &hook_audio, &highlight.hook_text, &hooked, profile)
                        .await
                        .map_err(|e| from_media("hook", e))?;
                fs_utils::remove_intermediates(&[hook_audio]).await;
                has_hook = true;
                current = hooked;
            }
        }

        // CAPTION (degrades to a copy-through on transcription trouble)
        let mut has_captions = false;
        if options.enable_captions {
            ctx.cancel.ensure_active()?;
            report(ClipStage::Caption, 0.0);
            if let Some(captioned) = self
                .caption_clip(ctx, &runner, &pre_hook, &current, hook_duration, &clip_dir)
                .await?
            {
                if current != pre_hook {
                    fs_utils::remove_intermediates(&[current]).await;
                }
                current = captioned;
                has_captions = true;
            }
        }

        // WATERMARK (degrades to a copy-through when the image is missing)
        let mut has_watermark = false;
        if options.enable_watermark {
            ctx.cancel.ensure_active()?;
            report(ClipStage::Watermark, 0.0);
            match &options.watermark_path {
                Some(image) => {
                    let marked = clip_dir.join("05_watermark.mp4");
                    has_watermark = watermark::apply_watermark(
                        &runner,
                        &current,
                        image,
                        &marked,
                        &options.watermark_settings,
                    )
                    .await
                    .map_err(|e| from_media("watermark", e))?;
                    if current != pre_hook {
                        fs_utils::remove_intermediates(&[current]).await;
                    }
                    current = marked;
                }
                None => {
                    warn!(clip = clip_index, "Watermark enabled but no image configured");
                }
            }
        }

        // Finalize and record metadata.
        let final_path = clip_dir.join("clip.mp4");
        tokio::fs::rename(&current, &final_path).await?;
        if pre_hook != current && pre_hook.exists() {
            fs_utils::remove_intermediates(&[pre_hook]).await;
        }

        let metadata = ClipMetadata::from_highlight(highlight, has_hook, has_captions, has_watermark);
        let metadata_json = serde_json::to_vec_pretty(&metadata)?;
        tokio::fs::write(clip_dir.join("data.json"), metadata_json).await?;

        if let Some(last) = plan.stages().last() {
            report(*last, 1.0);
        }
        info!(clip = clip_index, path = %final_path.display(), "Clip finished");

        Ok(ClipOutcome { directory: clip_dir, final_path, metadata })
    }

    /// Transcribe and burn captions.
    ///
    /// Returns `Ok(None)` when audio extraction or transcription fails:
    /// the clip ships un-captioned rather than dying this late. Burn
    /// failures, cancellation, and stalls still propagate.
    async fn caption_clip(
        &self,
        ctx: &JobContext,
        runner: &FfmpegRunner,
        pre_hook: &Path,
        current: &Path,
        hook_duration: f64,
        clip_dir: &Path,
    ) -> PipelineResult<Option<PathBuf>> {
        let wav = clip_dir.join("caption_audio.wav");
        if let Err(e) = captions::extract_audio(runner, pre_hook, &wav).await {
            let mapped = from_media("caption", e);
            if !caption_error_is_soft(&mapped) {
                return Err(mapped);
            }
            warn!("Audio extraction failed ({}), shipping clip without captions", mapped);
            return Ok(None);
        }

        let transcription = match self.whisper.transcribe(&wav).await {
            Ok((transcription, seconds)) => {
                ctx.report_usage(TokenUsage::transcription(seconds));
                transcription
            }
            Err(e) => {
                warn!("Transcription failed ({}), shipping clip without captions", e);
                fs_utils::remove_intermediates(&[wav]).await;
                return Ok(None);
            }
        };
        fs_utils::remove_intermediates(&[wav]).await;

        let events = build_caption_events(&transcription, hook_duration);
        if events.is_empty() {
            warn!("Transcription produced no caption events");
            return Ok(None);
        }

        let captioned = clip_dir.join("04_caption.mp4");
        captions::burn_captions(runner, current, &captioned, &events, &CaptionStyle::default())
            .await
            .map_err(|e| from_media("caption", e))?;

        Ok(Some(captioned))
    }
}

/// Route one clip's failure: cancellation ends the job, any other error
/// is logged so the remaining clips still run.
fn absorb_clip_failure(
    ctx: &JobContext,
    clip_index: usize,
    total: usize,
    err: PipelineError,
) -> PipelineResult<()> {
    if err.is_cancelled() {
        return Err(err);
    }
    ctx.logger.log_error(&format!("clip {}/{} failed: {}", clip_index, total, err));
    Ok(())
}

/// Caption trouble that degrades to an uncaptioned clip rather than
/// failing it. Cancellation and stalls always propagate.
fn caption_error_is_soft(err: &PipelineError) -> bool {
    !err.is_cancelled() && !matches!(err, PipelineError::Timeout(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;

    #[test]
    fn test_failed_clip_is_absorbed() {
        let ctx = JobContext::new("job-1", CancelToken::never());
        let err = PipelineError::transcode("cut", "exit status 1");
        assert!(absorb_clip_failure(&ctx, 1, 3, err).is_ok());
    }

    #[test]
    fn test_cancellation_ends_the_job() {
        let ctx = JobContext::new("job-1", CancelToken::never());
        let result = absorb_clip_failure(&ctx, 2, 3, PipelineError::Cancelled);
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_stall_ends_the_job() {
        let ctx = JobContext::new("job-1", CancelToken::never());
        let result = absorb_clip_failure(&ctx, 2, 3, PipelineError::Timeout(30));
        assert!(matches!(result, Err(PipelineError::Timeout(30))));
    }

    #[test]
    fn test_caption_soft_failure_classification() {
        assert!(caption_error_is_soft(&PipelineError::transcode("caption", "boom")));
        assert!(caption_error_is_soft(&PipelineError::acquisition("no audio stream")));
        assert!(!caption_error_is_soft(&PipelineError::Cancelled));
        assert!(!caption_error_is_soft(&PipelineError::Timeout(30)));
    }
}
