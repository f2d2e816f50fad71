//! Media acquisition core.
//!
//! Drives an external extraction executable (and, through it, an external
//! encoder) to download or transcode remote media: builds a fallback-aware
//! format expression from user intent, supervises the subprocess with a
//! hard timeout and a cancellation handle, parses its output into live
//! progress samples, and classifies the terminal outcome. Presentation,
//! clipboard, folder pickers and executable discovery belong to the host
//! application.

pub mod downloader;

pub use downloader::{
    build_format_expression, AudioQuality, CancelHandle, ChannelObserver, Compression,
    DownloadError, DownloadRequest, ErrorKind, FormatExpression, MediaExtractor, MediaMetadata,
    Mode, NullObserver, OutcomeResult, ProgressObserver, ProgressSample, QualityTarget,
    Supervisor, ToolPaths, YtDlpExtractor,
};
