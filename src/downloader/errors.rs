// Error taxonomy for the acquisition core
//
// `ErrorKind` is the stable, user-facing classification of a failed run;
// `DownloadError` covers faults of the crate itself (bad configuration,
// spawn problems) before a run produces an outcome.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an acquisition ended in failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The extractor does not recognize the URL
    UnsupportedUrl,

    /// Removed, deleted, or otherwise gone
    VideoUnavailable,

    /// The requested format expression resolved to nothing upstream
    FormatUnavailable,

    /// Player signature extraction failed. The file is frequently still
    /// produced; with a clean exit callers should treat this as success
    /// with a caveat rather than an outright failure.
    SignatureExtractionIssue,

    /// Some streams could not be listed; the download may be degraded
    PartialFormatsMissing,

    /// HTTP 403 from the upstream host
    AccessDenied,

    /// Private content requiring authorization
    PrivateVideo,

    /// Live event over, stream no longer downloadable
    LiveStreamEnded,

    /// The extraction executable could not be invoked
    ExecutableNotFound,

    /// The wall-clock ceiling elapsed before the process finished
    Timeout,

    /// The user cancelled the request mid-flight
    UserCancelled,

    /// Anything the pattern table does not cover
    Unknown,
}

impl ErrorKind {
    /// Warning-tone kinds: the run may still have produced a usable file
    /// when the exit status was otherwise clean.
    pub fn is_warning_only(&self) -> bool {
        matches!(
            self,
            Self::SignatureExtractionIssue | Self::PartialFormatsMissing
        )
    }

    /// Human-readable description for user-facing messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedUrl => "This URL is not supported by the extractor",
            Self::VideoUnavailable => "The video is unavailable",
            Self::FormatUnavailable => "The requested format is not available",
            Self::SignatureExtractionIssue => {
                "Player signature extraction failed (the file may still have been saved)"
            }
            Self::PartialFormatsMissing => "Some formats could not be retrieved",
            Self::AccessDenied => "Access denied by the server (HTTP 403)",
            Self::PrivateVideo => "This video is private",
            Self::LiveStreamEnded => "This live event has ended",
            Self::ExecutableNotFound => "The download tool could not be found",
            Self::Timeout => "The download timed out",
            Self::UserCancelled => "Cancelled",
            Self::Unknown => "Download failed",
        }
    }
}

/// Faults raised by the crate itself, before or instead of a classified
/// outcome.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Custom CRF outside the accepted 18-30 range
    #[error("custom CRF {0} is outside the accepted range 18-30")]
    InvalidCompression(u8),

    /// The configured executable could not be spawned
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Lost a pipe or failed reading subprocess output
    #[error("i/o error while supervising subprocess: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata probe returned output we could not parse
    #[error("failed to parse probe output: {0}")]
    Parse(String),
}
