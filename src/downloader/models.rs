// Common data models for the acquisition core

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::{DownloadError, ErrorKind};

/// What kind of output the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Merged video + audio in one container
    VideoAudio,
    /// Video stream only, no audio track
    VideoOnly,
    /// Audio extracted and converted to MP3
    Mp3Audio,
    /// Audio extracted and converted to M4A
    M4aAudio,
}

impl Mode {
    /// Whether this mode goes through the extractor's audio-extraction path
    pub fn is_audio_only(&self) -> bool {
        matches!(self, Self::Mp3Audio | Self::M4aAudio)
    }

    /// Container extension the output ends up in
    pub fn output_ext(&self) -> &'static str {
        match self {
            Self::VideoAudio | Self::VideoOnly => "mp4",
            Self::Mp3Audio => "mp3",
            Self::M4aAudio => "m4a",
        }
    }
}

/// Quality ceiling for video modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTarget {
    Best,
    P2160,
    P1440,
    P1080,
    P720,
    P480,
}

impl QualityTarget {
    /// Height cap in pixels, `None` for "best available"
    pub fn height_cap(&self) -> Option<u32> {
        match self {
            Self::Best => None,
            Self::P2160 => Some(2160),
            Self::P1440 => Some(1440),
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
        }
    }
}

/// Re-encode strength applied after download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    /// Stream copy, no re-encode
    None,
    /// CRF 20
    Light,
    /// CRF 23
    Medium,
    /// CRF 28
    High,
    /// User-picked CRF, valid range 18-30 inclusive
    Custom(u8),
}

impl Compression {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// CRF value for the encoder, `None` when stream-copying
    pub fn crf(&self) -> Option<u8> {
        match self {
            Self::None => None,
            Self::Light => Some(20),
            Self::Medium => Some(23),
            Self::High => Some(28),
            Self::Custom(crf) => Some(*crf),
        }
    }
}

/// Audio quality code passed to the extractor's audio converter.
/// VBR levels map to the encoder's quality scale, Cbr320 forces 320 kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioQuality {
    Vbr0,
    Vbr2,
    Vbr5,
    Cbr320,
}

impl AudioQuality {
    /// Value for the extractor's `--audio-quality` flag
    pub fn code(&self) -> &'static str {
        match self {
            Self::Vbr0 => "0",
            Self::Vbr2 => "2",
            Self::Vbr5 => "5",
            Self::Cbr320 => "320K",
        }
    }

    /// Approximate MP3 bitrate in kbps for size estimation
    pub fn approx_mp3_kbps(&self) -> u32 {
        match self {
            Self::Vbr0 => 245,
            Self::Vbr2 => 190,
            Self::Vbr5 => 130,
            Self::Cbr320 => 320,
        }
    }
}

/// One validated download request. Built once per invocation, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub mode: Mode,
    pub quality: QualityTarget,
    pub compression: Compression,
    pub audio_quality: AudioQuality,
    pub output_dir: PathBuf,
    /// Extractor-side output template, e.g. "%(title)s.%(ext)s"
    pub output_template: String,
}

impl DownloadRequest {
    /// Validate and build a request. A custom CRF outside 18-30 is a
    /// configuration error here, never clamped downstream.
    pub fn new(
        url: impl Into<String>,
        mode: Mode,
        quality: QualityTarget,
        compression: Compression,
        audio_quality: AudioQuality,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, DownloadError> {
        if let Compression::Custom(crf) = compression {
            if !(18..=30).contains(&crf) {
                return Err(DownloadError::InvalidCompression(crf));
            }
        }
        Ok(Self {
            url: url.into(),
            mode,
            quality,
            compression,
            audio_quality,
            output_dir: output_dir.into(),
            output_template: "%(title)s.%(ext)s".to_string(),
        })
    }

    /// Default output directory: the user's download folder
    pub fn default_output_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Resolved invocations for the two external executables. Locating them on
/// disk is the host application's job; this crate only consumes the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPaths {
    /// Extraction executable (yt-dlp or compatible)
    pub extractor: String,
    /// Encoding executable handed to the extractor for post-processing
    pub encoder: String,
}

/// One live progress reading. Ephemeral: samples exist only while the
/// subprocess runs and are never retained after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub percent: f32,
    /// Downloaded so far, canonicalized to MB
    pub downloaded_mb: Option<f64>,
    /// Expected total, canonicalized to MB
    pub total_mb: Option<f64>,
    /// Current transfer speed in MB/s
    pub speed_mb_s: Option<f64>,
    /// Remaining seconds; absent when speed is zero or the value is too
    /// large to be meaningful for display
    pub eta_secs: Option<u64>,
}

/// Metadata from the ahead-of-download probe. Advisory: a failed probe only
/// suppresses the size estimate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub duration_secs: Option<f64>,
    pub filesize_approx: Option<u64>,
}

/// Terminal result of one acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutcomeResult {
    Success {
        saved_file: String,
    },
    Cancelled,
    Failed {
        kind: ErrorKind,
        user_message: String,
        raw_diagnostics: String,
    },
}

impl OutcomeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
