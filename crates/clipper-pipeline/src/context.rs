//! Job context: cancellation token and reporting sinks.

use std::sync::Arc;
use tokio::sync::watch;

use clipper_models::TokenUsage;

use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;

/// Sender side of a job's cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Request cooperative cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver side, checked by the worker between stages and inside loops.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a connected handle/token pair.
    pub fn channel() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
    }

    /// A token that can never fire, for callers without cancellation.
    pub fn never() -> CancelToken {
        let (_tx, rx) = watch::channel(false);
        // Receiver keeps the channel alive after _tx drops; borrow stays false.
        CancelToken { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Error out if cancellation has been requested.
    pub fn ensure_active(&self) -> PipelineResult<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Raw receiver for handing to the media runner.
    pub fn receiver(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}

/// Progress callback: fraction in `[0, 1]` plus a stage label.
pub type ProgressSink = Arc<dyn Fn(f64, &str) + Send + Sync>;

/// Usage callback for AI billing records.
pub type UsageSink = Arc<dyn Fn(TokenUsage) + Send + Sync>;

/// Everything a running job needs to report back.
///
/// Sinks fire from the worker task only; consumers must not block in
/// them.
#[derive(Clone)]
pub struct JobContext {
    pub job_id: String,
    pub logger: JobLogger,
    pub cancel: CancelToken,
    progress: ProgressSink,
    usage: UsageSink,
}

impl JobContext {
    pub fn new(job_id: impl Into<String>, cancel: CancelToken) -> Self {
        let job_id = job_id.into();
        Self {
            logger: JobLogger::new(&job_id, "clip_job"),
            job_id,
            cancel,
            progress: Arc::new(|_, _| {}),
            usage: Arc::new(|_| {}),
        }
    }

    pub fn with_progress_sink(mut self, sink: ProgressSink) -> Self {
        self.progress = sink;
        self
    }

    pub fn with_usage_sink(mut self, sink: UsageSink) -> Self {
        self.usage = sink;
        self
    }

    /// Report overall job progress.
    pub fn report_progress(&self, fraction: f64, stage: &str) {
        (self.progress)(fraction.clamp(0.0, 1.0), stage);
    }

    /// Report AI usage for billing.
    pub fn report_usage(&self, usage: TokenUsage) {
        (self.usage)(usage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_cancel_round_trip() {
        let (handle, token) = CancelToken::channel();
        assert!(token.ensure_active().is_ok());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.ensure_active(), Err(PipelineError::Cancelled)));

        // Cancelling twice is fine.
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_never_token_stays_active() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_progress_sink_receives_clamped_values() {
        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let ctx = JobContext::new("job-1", CancelToken::never()).with_progress_sink(Arc::new(
            move |fraction, _| sink_seen.lock().unwrap().push(fraction),
        ));

        ctx.report_progress(0.5, "cut");
        ctx.report_progress(1.7, "done");
        assert_eq!(*seen.lock().unwrap(), vec![0.5, 1.0]);
    }
}
