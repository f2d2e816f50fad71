// Progress parser - turns extractor output lines into structured samples
//
// Capture contract: a line must match the percentage pattern
// `[download] <float>%` to yield a sample at all. If the same line also
// matches `<downloaded-size> of <total-size> at <speed>/s`, the sizes and
// speed are parsed and canonicalized to MB; otherwise only the percentage
// is reported. The invocation layer requests this line shape through the
// extractor's progress template; lines in other shapes degrade to
// percent-only samples rather than erroring.
// Percentages are NOT monotonic across fragment or stream boundaries -
// every sample is reported as received and callers display the latest one,
// not a running maximum.

use lazy_static::lazy_static;
use regex::Regex;

use super::models::ProgressSample;

/// ETA readings at or past this many seconds are not meaningful for display
const ETA_DISPLAY_CEILING_SECS: u64 = 3600;

lazy_static! {
    // Example: [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
    static ref PERCENT_RE: Regex =
        Regex::new(r"\[download\]\s+(\d+\.?\d*)%").unwrap();
    static ref SIZE_SPEED_RE: Regex = Regex::new(
        r"(\d+\.?\d*\s*\w+)\s+of\s+~?\s*(\d+\.?\d*\s*\w+)\s+at\s+(\d+\.?\d*\s*\w+)/s"
    )
    .unwrap();
}

/// Canonicalize a size token like "343.72MiB" or "1.5GiB" to MB.
/// Unrecognized units are assumed to be raw bytes.
pub fn canonicalize_size(token: &str) -> Option<f64> {
    let token = token.trim();
    let split = token
        .find(|c: char| c.is_alphabetic())
        .unwrap_or(token.len());
    let (number, unit) = token.split_at(split);
    let value: f64 = number.trim().parse().ok()?;

    let mb = match unit.trim() {
        "KB" | "KiB" => value / 1024.0,
        "MB" | "MiB" => value,
        "GB" | "GiB" => value * 1024.0,
        _ => value / 1_048_576.0,
    };
    Some(mb)
}

/// Canonicalize a speed token like "420.30KiB/s" to MB/s.
pub fn canonicalize_speed(token: &str) -> Option<f64> {
    canonicalize_size(token.trim().trim_end_matches("/s"))
}

/// Parse one output line into a progress sample, or `None` when the line is
/// not a progress report.
pub fn parse_progress(line: &str) -> Option<ProgressSample> {
    let percent: f32 = PERCENT_RE.captures(line)?.get(1)?.as_str().parse().ok()?;

    let mut sample = ProgressSample {
        percent,
        downloaded_mb: None,
        total_mb: None,
        speed_mb_s: None,
        eta_secs: None,
    };

    if let Some(caps) = SIZE_SPEED_RE.captures(line) {
        sample.downloaded_mb = caps.get(1).and_then(|m| canonicalize_size(m.as_str()));
        sample.total_mb = caps.get(2).and_then(|m| canonicalize_size(m.as_str()));
        sample.speed_mb_s = caps.get(3).and_then(|m| canonicalize_speed(m.as_str()));
        sample.eta_secs = derive_eta(sample.downloaded_mb, sample.total_mb, sample.speed_mb_s);
    }

    Some(sample)
}

/// ETA = remaining / speed, only when speed > 0 and remaining > 0.
/// Values past the display ceiling are suppressed, not an error.
fn derive_eta(downloaded: Option<f64>, total: Option<f64>, speed: Option<f64>) -> Option<u64> {
    let (downloaded, total, speed) = (downloaded?, total?, speed?);
    if speed <= 0.0 {
        return None;
    }
    let remaining = total - downloaded;
    if remaining <= 0.0 {
        return None;
    }
    let eta = (remaining / speed) as u64;
    if eta >= ETA_DISPLAY_CEILING_SECS {
        None
    } else {
        Some(eta)
    }
}
