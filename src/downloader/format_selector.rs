// FormatSelector - fallback-aware format expression builder
//
// Turns (mode, quality target) into the extractor's `-f` expression: an
// ordered list of selector alternatives joined by `/`, evaluated upstream
// until one resolves. The ladder degrades container before quality and
// quality before giving up entirely; the final alternative is always the
// unconstrained `b` clause, so the expression can never fail to resolve
// purely from an over-specific constraint.

use serde::{Deserialize, Serialize};

use super::models::{Mode, QualityTarget};

/// Preferred containers for playback compatibility (H.264/AAC family)
const VIDEO_CONTAINER: &str = "mp4";
const AUDIO_CONTAINER: &str = "m4a";

/// Ordered fallback expression handed to the extractor's `-f` flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatExpression {
    alternatives: Vec<String>,
}

impl FormatExpression {
    fn new(alternatives: Vec<String>) -> Self {
        debug_assert!(!alternatives.is_empty());
        Self { alternatives }
    }

    /// The `/`-joined selector string
    pub fn as_spec(&self) -> String {
        self.alternatives.join("/")
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// Last-resort clause; by construction always the unconstrained pick
    pub fn final_alternative(&self) -> &str {
        self.alternatives.last().map(String::as_str).unwrap_or("b")
    }
}

/// Build the fallback expression for a request.
///
/// Video modes walk an eight-step ladder (six for Best, which has no height
/// cap): preferred container + cap, degrade audio container, degrade video
/// container, drop containers, then pre-merged single streams, finally `b`.
/// Audio modes bypass the ladder: stream selection is just `ba/b` and the
/// actual conversion happens in the audio-extraction directive.
pub fn build_format_expression(mode: Mode, quality: QualityTarget) -> FormatExpression {
    match mode {
        Mode::Mp3Audio | Mode::M4aAudio => {
            FormatExpression::new(vec!["ba".to_string(), "b".to_string()])
        }
        Mode::VideoAudio => FormatExpression::new(video_ladder(quality, true)),
        Mode::VideoOnly => FormatExpression::new(video_ladder(quality, false)),
    }
}

fn video_ladder(quality: QualityTarget, with_audio: bool) -> Vec<String> {
    let cap = quality.height_cap();

    // Selector fragments, capped or not
    let capped = |sel: &str| match cap {
        Some(h) => format!("{}[height<={}]", sel, h),
        None => sel.to_string(),
    };
    let pref_audio = format!("ba[ext={}]", AUDIO_CONTAINER);

    let video_pref = format!("{}[ext={}]", capped("bv*"), VIDEO_CONTAINER);
    let video_any = capped("bv*");
    let merged_pref = format!("{}[ext={}]", capped("b"), VIDEO_CONTAINER);
    let merged_any = capped("b");

    let mut alts = Vec::new();
    if with_audio {
        alts.push(format!("{}+{}", video_pref, pref_audio));
        alts.push(format!("{}+ba", video_pref));
        alts.push(format!("{}+{}", video_any, pref_audio));
        alts.push(format!("{}+ba", video_any));
    } else {
        alts.push(video_pref);
        alts.push(video_any);
    }

    // Pre-merged fallbacks, then fully unconstrained
    if cap.is_some() {
        alts.push(merged_pref);
        alts.push(merged_any);
    }
    alts.push(format!("b[ext={}]", VIDEO_CONTAINER));
    alts.push("b".to_string());

    alts.dedup();
    alts
}
