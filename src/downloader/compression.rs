// Compression planner - maps a compression level to encoder post-processing
// arguments. The CRF itself is validated at request construction; this
// module never clamps.

use serde::{Deserialize, Serialize};

use super::models::{Compression, Mode};

/// Audio bitrate applied whenever a video+audio download is re-encoded
const COMPRESSED_AUDIO_KBPS: u32 = 128;

/// Encoder arguments handed to the extractor's post-processing hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderArgs {
    args: Vec<String>,
}

impl EncoderArgs {
    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    /// Single string form for the extractor's `--ppa` value
    pub fn to_arg_string(&self) -> String {
        self.args.join(" ")
    }
}

/// Build the re-encode arguments for a request, or `None` for stream copy.
///
/// Audio-only modes never re-encode here; their conversion happens in the
/// audio-extraction directive instead.
pub fn plan_compression(mode: Mode, compression: Compression) -> Option<EncoderArgs> {
    if mode.is_audio_only() {
        return None;
    }
    let crf = compression.crf()?;

    let mut args = vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-crf".to_string(),
        crf.to_string(),
        "-preset".to_string(),
        "medium".to_string(),
    ];

    match mode {
        Mode::VideoAudio => {
            // Any active compression also drops audio to a fixed bitrate
            args.extend([
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", COMPRESSED_AUDIO_KBPS),
            ]);
        }
        Mode::VideoOnly => {}
        Mode::Mp3Audio | Mode::M4aAudio => unreachable!("audio modes return early"),
    }

    Some(EncoderArgs { args })
}
