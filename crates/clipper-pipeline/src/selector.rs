//! Highlight selection from the transcript.

use tracing::{info, warn};

use clipper_ai::CompletionBackend;
use clipper_models::{Highlight, PromptTemplate, MIN_CLIP_SECS, OVER_REQUEST_MARGIN};

use crate::context::JobContext;
use crate::error::{PipelineError, PipelineResult};

/// Selects highlights by prompting a text-generation backend and
/// filtering the candidates by clip duration.
pub struct HighlightSelector<'a> {
    backend: &'a dyn CompletionBackend,
    template: PromptTemplate,
}

impl<'a> HighlightSelector<'a> {
    pub fn new(backend: &'a dyn CompletionBackend, template: PromptTemplate) -> Self {
        Self { backend, template }
    }

    /// Select up to `desired` highlights.
    ///
    /// Over-requests candidates so duration filtering still leaves enough,
    /// keeps first-accepted order, and never pads: fewer than `desired`
    /// survivors is a valid outcome, zero is an error.
    pub async fn select(
        &self,
        ctx: &JobContext,
        transcript_text: &str,
        video_context: &str,
        desired: usize,
    ) -> PipelineResult<Vec<Highlight>> {
        let requested = desired + OVER_REQUEST_MARGIN;
        let prompt = self.template.render(requested, video_context, transcript_text);

        info!(requested, desired, backend = self.backend.name(), "Selecting highlights");

        let output = self.backend.complete(&prompt).await?;
        ctx.report_usage(output.usage);

        let candidates = parse_highlight_array(&output.text)?;
        let accepted = filter_by_duration(candidates, desired);

        if accepted.is_empty() {
            return Err(PipelineError::NoHighlights);
        }
        Ok(accepted)
    }
}

/// Parse the model response into highlight candidates.
pub fn parse_highlight_array(raw: &str) -> PipelineResult<Vec<Highlight>> {
    let stripped = strip_code_fences(raw);
    serde_json::from_str::<Vec<Highlight>>(stripped)
        .map_err(|e| PipelineError::highlight_parse(format!("{} in: {:.120}", e, stripped)))
}

/// Apply the duration gate, preserving candidate order.
pub fn filter_by_duration(candidates: Vec<Highlight>, desired: usize) -> Vec<Highlight> {
    let mut accepted = Vec::new();

    for candidate in candidates {
        if accepted.len() >= desired {
            break;
        }
        let highlight = match candidate.with_computed_duration() {
            Ok(h) => h,
            Err(e) => {
                warn!("Skipping highlight with bad timestamps: {}", e);
                continue;
            }
        };
        if !highlight.duration_acceptable() {
            let reason = if highlight.duration_seconds < MIN_CLIP_SECS {
                "too short"
            } else {
                "too long"
            };
            info!(
                title = %highlight.title,
                duration = highlight.duration_seconds,
                "Rejecting highlight: {}", reason
            );
            continue;
        }
        accepted.push(highlight);
    }

    accepted
}

/// Remove a surrounding Markdown code fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence line (which may carry a language tag), then the
    // closing fence.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use async_trait::async_trait;
    use clipper_ai::{AiResult, CompletionOutput};
    use clipper_models::{format_srt_timestamp, TokenUsage};

    struct Scripted(String);

    #[async_trait]
    impl CompletionBackend for Scripted {
        async fn complete(&self, _prompt: &str) -> AiResult<CompletionOutput> {
            Ok(CompletionOutput {
                text: self.0.clone(),
                usage: TokenUsage::completion(100, 20),
            })
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn candidate_json(durations: &[f64]) -> String {
        let items: Vec<String> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                format!(
                    r#"{{"start_time":"00:10:00,000","end_time":"{}","title":"c{}"}}"#,
                    format_srt_timestamp(600.0 + d),
                    i
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    #[tokio::test]
    async fn test_duration_gate_keeps_order() {
        // Durations 45, 70, 130, 90, 95: only 70, 90, 95 survive.
        let backend = Scripted(candidate_json(&[45.0, 70.0, 130.0, 90.0, 95.0]));
        let selector = HighlightSelector::new(&backend, PromptTemplate::default());
        let ctx = JobContext::new("job-1", CancelToken::never());

        let selected = selector.select(&ctx, "transcript", "ctx", 3).await.unwrap();
        let durations: Vec<f64> = selected.iter().map(|h| h.duration_seconds).collect();
        assert_eq!(durations, vec![70.0, 90.0, 95.0]);
        assert_eq!(selected[0].title, "c1");
    }

    #[tokio::test]
    async fn test_bounds_are_inclusive() {
        let backend = Scripted(candidate_json(&[58.0, 120.0]));
        let selector = HighlightSelector::new(&backend, PromptTemplate::default());
        let ctx = JobContext::new("job-1", CancelToken::never());

        let selected = selector.select(&ctx, "t", "c", 5).await.unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_fewer_than_desired_is_not_padded() {
        let backend = Scripted(candidate_json(&[70.0]));
        let selector = HighlightSelector::new(&backend, PromptTemplate::default());
        let ctx = JobContext::new("job-1", CancelToken::never());

        let selected = selector.select(&ctx, "t", "c", 3).await.unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[tokio::test]
    async fn test_all_rejected_is_no_highlights() {
        let backend = Scripted(candidate_json(&[10.0, 500.0]));
        let selector = HighlightSelector::new(&backend, PromptTemplate::default());
        let ctx = JobContext::new("job-1", CancelToken::never());

        assert!(matches!(
            selector.select(&ctx, "t", "c", 3).await,
            Err(PipelineError::NoHighlights)
        ));
    }

    #[tokio::test]
    async fn test_non_json_is_parse_error() {
        let backend = Scripted("I could not find highlights, sorry!".to_string());
        let selector = HighlightSelector::new(&backend, PromptTemplate::default());
        let ctx = JobContext::new("job-1", CancelToken::never());

        assert!(matches!(
            selector.select(&ctx, "t", "c", 3).await,
            Err(PipelineError::HighlightParse(_))
        ));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("[1]"), "[1]");
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  ```json\n[1,\n2]\n```  "), "[1,\n2]");
    }

    #[test]
    fn test_truncation_counts_accepted_not_candidates() {
        let raw = candidate_json(&[30.0, 70.0, 80.0, 90.0, 100.0]);
        let candidates = parse_highlight_array(&raw).unwrap();
        let accepted = filter_by_duration(candidates, 2);
        let durations: Vec<f64> = accepted.iter().map(|h| h.duration_seconds).collect();
        assert_eq!(durations, vec![70.0, 80.0]);
    }
}
