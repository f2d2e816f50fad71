// Acquisition core - format selection, argument assembly, subprocess
// supervision, progress parsing and outcome classification

pub mod compression;
pub mod errors;
pub mod estimator;
pub mod format_selector;
pub mod invocation;
pub mod metadata;
pub mod models;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod supervisor;
pub mod traits;

pub use errors::{DownloadError, ErrorKind};
pub use format_selector::{build_format_expression, FormatExpression};
pub use models::{
    AudioQuality, Compression, DownloadRequest, MediaMetadata, Mode, OutcomeResult,
    ProgressSample, QualityTarget, ToolPaths,
};
pub use orchestrator::{MediaExtractor, YtDlpExtractor};
pub use supervisor::{CancelHandle, Supervisor};
pub use traits::{ChannelObserver, NullObserver, ProgressObserver};
