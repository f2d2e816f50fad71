// Size estimator - advisory output size prediction from media duration,
// bitrate tables and the compression cost model. Never gates a download.

use super::models::{AudioQuality, Compression, Mode, QualityTarget};

/// Uncompressed audio track bitrate assumed for merged downloads
const MERGED_AUDIO_KBPS: u32 = 256;
/// Audio bitrate once any compression is active (matches the planner)
const COMPRESSED_AUDIO_KBPS: u32 = 128;
/// Fixed bitrate assumed for M4A extraction
const M4A_KBPS: u32 = 256;

/// Assumed video bitrate in kbps for a quality target
fn video_kbps(quality: QualityTarget) -> u32 {
    match quality {
        QualityTarget::Best | QualityTarget::P2160 => 8000,
        QualityTarget::P1440 => 4000,
        QualityTarget::P1080 => 2000,
        QualityTarget::P720 => 1000,
        QualityTarget::P480 => 500,
    }
}

/// Size reduction factor of the compression cost model. The 0.3 floor is a
/// clamp of the estimate only; the actual encode argument is never clamped.
pub fn compression_factor(compression: Compression) -> f64 {
    match compression {
        Compression::None => 1.0,
        Compression::Light => 0.8,
        Compression::Medium => 0.6,
        Compression::High => 0.4,
        Compression::Custom(crf) => (1.0 - (crf as f64 - 18.0) * 0.04).max(0.3),
    }
}

/// Predict the output size in MB for a download of `duration_secs`.
pub fn estimate_size(
    duration_secs: f64,
    mode: Mode,
    quality: QualityTarget,
    compression: Compression,
    audio_quality: AudioQuality,
) -> f64 {
    // kbps * seconds / 8 = kilobytes; / 1024 = MB
    let kbps_to_mb = |kbps: f64| kbps * duration_secs / (8.0 * 1024.0);

    match mode {
        Mode::VideoAudio => {
            let video = kbps_to_mb(video_kbps(quality) as f64) * compression_factor(compression);
            let audio_kbps = if compression.is_active() {
                COMPRESSED_AUDIO_KBPS
            } else {
                MERGED_AUDIO_KBPS
            };
            video + kbps_to_mb(audio_kbps as f64)
        }
        Mode::VideoOnly => {
            kbps_to_mb(video_kbps(quality) as f64) * compression_factor(compression)
        }
        Mode::Mp3Audio => kbps_to_mb(audio_quality.approx_mp3_kbps() as f64),
        Mode::M4aAudio => kbps_to_mb(M4A_KBPS as f64),
    }
}

/// Render an estimate for display: "~950 KB", "~165 MB", "~1.5 GB".
pub fn format_estimate(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("~{:.1} GB", mb / 1024.0)
    } else if mb >= 1.0 {
        format!("~{:.0} MB", mb)
    } else {
        format!("~{:.0} KB", mb * 1024.0)
    }
}
