// Acquisition orchestrator - the end-to-end flow behind one request:
// format selection and compression planning feed the argument list, the
// supervisor runs the subprocess, and the classifier turns the finished
// run into one terminal outcome.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::errors::DownloadError;
use super::estimator::{estimate_size, format_estimate};
use super::invocation::build_download_args;
use super::metadata::probe_metadata;
use super::models::{DownloadRequest, MediaMetadata, OutcomeResult, ToolPaths};
use super::outcome::{classify, classify_internal_failure, classify_spawn_failure};
use super::supervisor::{CancelHandle, Supervisor, DEFAULT_TIMEOUT};
use super::traits::ProgressObserver;

/// Backend seam for the acquisition flow. One implementation drives the
/// real extractor; tests substitute their own.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Metadata-only probe ahead of the download. Lower priority: callers
    /// must treat failure as "no estimate", never as a blocker.
    async fn probe(&self, url: &str) -> Result<MediaMetadata, DownloadError>;

    /// Run one download to completion, cancellation or failure. Exactly one
    /// subprocess per call; fallback lives inside the format expression,
    /// not in repeated spawns.
    async fn acquire(
        &self,
        request: &DownloadRequest,
        handle: &CancelHandle,
        observer: &dyn ProgressObserver,
    ) -> OutcomeResult;
}

/// The yt-dlp-compatible extractor backend.
pub struct YtDlpExtractor {
    tools: ToolPaths,
    timeout: Duration,
}

impl YtDlpExtractor {
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the wall-clock ceiling, mainly for tests
    pub fn with_timeout(tools: ToolPaths, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    /// Probe the URL and render a display estimate for the request, e.g.
    /// "~165 MB". `None` whenever the probe fails or reports no duration.
    pub async fn estimate_display_size(&self, request: &DownloadRequest) -> Option<String> {
        let metadata = self.probe(&request.url).await.ok()?;
        let duration = metadata.duration_secs?;
        let mb = estimate_size(
            duration,
            request.mode,
            request.quality,
            request.compression,
            request.audio_quality,
        );
        Some(format_estimate(mb))
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<MediaMetadata, DownloadError> {
        probe_metadata(&self.tools.extractor, url).await
    }

    async fn acquire(
        &self,
        request: &DownloadRequest,
        handle: &CancelHandle,
        observer: &dyn ProgressObserver,
    ) -> OutcomeResult {
        let args = build_download_args(request, &self.tools);
        debug!(backend = self.name(), url = %request.url, "starting acquisition");

        let supervisor = Supervisor::with_timeout(self.timeout);
        match supervisor
            .run(&self.tools.extractor, &args, handle, observer)
            .await
        {
            Ok(report) => classify(&report, request),
            Err(DownloadError::Spawn { program, .. }) => classify_spawn_failure(&program),
            Err(e) => classify_internal_failure(&e),
        }
    }
}
