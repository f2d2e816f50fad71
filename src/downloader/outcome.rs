// Outcome classifier - maps exit status plus accumulated output text onto
// one terminal result. The marker table is data, evaluated in fixed
// priority order, first match wins. Two overlapping true markers resolve
// by table position; that heuristic is inherited behavior and reordering
// it would change results for real-world logs.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::errors::{DownloadError, ErrorKind};
use super::models::{DownloadRequest, OutcomeResult};
use super::supervisor::{ExitKind, RunReport};

/// User-visible messages stay presentable below this length
const USER_MESSAGE_CAP: usize = 250;

/// Ordered marker table. Scanned case-insensitively against the full
/// accumulated output; the first matching row decides the kind.
const ERROR_MARKERS: &[(&str, ErrorKind)] = &[
    ("unsupported url", ErrorKind::UnsupportedUrl),
    ("video unavailable", ErrorKind::VideoUnavailable),
    ("requested format is not available", ErrorKind::FormatUnavailable),
    ("nsig extraction failed", ErrorKind::SignatureExtractionIssue),
    ("some formats may be missing", ErrorKind::PartialFormatsMissing),
    ("http error 403", ErrorKind::AccessDenied),
    ("private video", ErrorKind::PrivateVideo),
    ("this live event has ended", ErrorKind::LiveStreamEnded),
];

lazy_static! {
    static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
    static ref MERGE_RE: Regex =
        Regex::new(r#"\[Merger\]\s+Merging formats into\s+"(.+)""#).unwrap();
    static ref ALREADY_RE: Regex =
        Regex::new(r"\[download\]\s+(.+?)\s+has already been downloaded").unwrap();
}

/// Classify one finished run. Evaluation order: cancellation first (no text
/// inspection), then timeout, then the marker table, then success
/// extraction.
pub fn classify(report: &RunReport, request: &DownloadRequest) -> OutcomeResult {
    // A cancel request overrides everything the process printed, including
    // success-shaped output. Diagnostics are deliberately not retained.
    if report.cancelled {
        return OutcomeResult::Cancelled;
    }

    if report.exit == ExitKind::TimedOut {
        return failed(ErrorKind::Timeout, None, &report.log);
    }

    if let Some((marker, kind)) = scan_markers(&report.log) {
        debug!(marker, ?kind, "output marker matched");
        return failed(kind, None, &report.log);
    }

    match report.exit {
        ExitKind::Exited { success: true, .. } => OutcomeResult::Success {
            saved_file: extract_saved_file(&report.log, request),
        },
        ExitKind::Exited { success: false, .. } => {
            failed(ErrorKind::Unknown, first_error_line(&report.log), &report.log)
        }
        ExitKind::TimedOut => unreachable!("handled above"),
    }
}

/// Outcome for a spawn that never produced a process.
pub fn classify_spawn_failure(program: &str) -> OutcomeResult {
    failed(
        ErrorKind::ExecutableNotFound,
        Some(format!("Could not run \"{}\"", program)),
        "",
    )
}

/// Outcome for a supervision fault that prevented a proper run report
/// (lost pipe, read failure). Rare; surfaced as Unknown with the fault text.
pub fn classify_internal_failure(err: &DownloadError) -> OutcomeResult {
    failed(ErrorKind::Unknown, Some(err.to_string()), "")
}

fn failed(kind: ErrorKind, detail: Option<String>, log: &str) -> OutcomeResult {
    let message = match detail {
        Some(d) => d,
        None => kind.description().to_string(),
    };
    OutcomeResult::Failed {
        kind,
        user_message: truncate(&message, USER_MESSAGE_CAP),
        raw_diagnostics: log.to_string(),
    }
}

fn scan_markers(log: &str) -> Option<(&'static str, ErrorKind)> {
    let lower = log.to_lowercase();
    ERROR_MARKERS
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .copied()
}

/// First line carrying the extractor's error marker, surfaced verbatim for
/// unmatched failures.
fn first_error_line(log: &str) -> Option<String> {
    log.lines()
        .map(str::trim)
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| log.lines().map(str::trim).rev().find(|l| !l.is_empty()))
        .map(|line| line.to_string())
}

/// Pull the saved file name out of the log, or synthesize one from the
/// requested extension.
fn extract_saved_file(log: &str, request: &DownloadRequest) -> String {
    // The merge step names the final container; prefer it over the
    // per-stream destination lines
    for line in log.lines() {
        if let Some(caps) = MERGE_RE.captures(line) {
            if let Some(name) = caps.get(1) {
                return basename(name.as_str());
            }
        }
    }
    for line in log.lines() {
        if let Some(caps) = DEST_RE.captures(line) {
            if let Some(name) = caps.get(1) {
                return basename(name.as_str());
            }
        }
        if let Some(caps) = ALREADY_RE.captures(line) {
            if let Some(name) = caps.get(1) {
                return basename(name.as_str());
            }
        }
    }
    format!("download.{}", request.mode.output_ext())
}

fn basename(path: &str) -> String {
    std::path::Path::new(path.trim())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.trim().to_string())
}

fn truncate(s: &str, cap: usize) -> String {
    if s.chars().count() <= cap {
        s.to_string()
    } else {
        let cut: String = s.chars().take(cap.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{AudioQuality, Compression, DownloadRequest, Mode, QualityTarget};

    fn request(mode: Mode) -> DownloadRequest {
        DownloadRequest::new(
            "https://example.com/v",
            mode,
            QualityTarget::P720,
            Compression::None,
            AudioQuality::Vbr2,
            "/tmp",
        )
        .unwrap()
    }

    fn report(exit: ExitKind, log: &str, cancelled: bool) -> RunReport {
        RunReport {
            exit,
            log: log.to_string(),
            cancelled,
        }
    }

    fn clean_exit() -> ExitKind {
        ExitKind::Exited {
            success: true,
            code: Some(0),
        }
    }

    fn dirty_exit() -> ExitKind {
        ExitKind::Exited {
            success: false,
            code: Some(1),
        }
    }

    #[test]
    fn test_private_video_classified() {
        let r = report(clean_exit(), "ERROR: Private video\nSign in if you've been granted access", false);
        match classify(&r, &request(Mode::VideoAudio)) {
            OutcomeResult::Failed { kind, raw_diagnostics, .. } => {
                assert_eq!(kind, ErrorKind::PrivateVideo);
                assert!(raw_diagnostics.contains("Private video"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_overrides_failure_text() {
        let r = report(dirty_exit(), "ERROR: Private video", true);
        assert_eq!(classify(&r, &request(Mode::VideoAudio)), OutcomeResult::Cancelled);
    }

    #[test]
    fn test_cancel_overrides_success_output() {
        let log = "[download] Destination: /tmp/clip.mp4\n[download] 100.0%";
        let r = report(clean_exit(), log, true);
        assert_eq!(classify(&r, &request(Mode::VideoAudio)), OutcomeResult::Cancelled);
    }

    #[test]
    fn test_timeout_without_text_inspection() {
        let r = report(ExitKind::TimedOut, "ERROR: Private video", false);
        match classify(&r, &request(Mode::VideoAudio)) {
            OutcomeResult::Failed { kind, .. } => assert_eq!(kind, ErrorKind::Timeout),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_destination_line_names_saved_file() {
        let log = "[download] Destination: /home/u/Downloads/clip.mp4\n[download] 100.0%";
        let r = report(clean_exit(), log, false);
        assert_eq!(
            classify(&r, &request(Mode::VideoAudio)),
            OutcomeResult::Success {
                saved_file: "clip.mp4".to_string()
            }
        );
    }

    #[test]
    fn test_merge_line_beats_stream_destinations() {
        let log = "[download] Destination: /tmp/clip.f137.mp4\n\
                   [download] Destination: /tmp/clip.f140.m4a\n\
                   [Merger] Merging formats into \"/tmp/clip.mp4\"";
        let r = report(clean_exit(), log, false);
        assert_eq!(
            classify(&r, &request(Mode::VideoAudio)),
            OutcomeResult::Success {
                saved_file: "clip.mp4".to_string()
            }
        );
    }

    #[test]
    fn test_already_downloaded_line() {
        let log = "[download] /tmp/old.mp4 has already been downloaded";
        let r = report(clean_exit(), log, false);
        assert_eq!(
            classify(&r, &request(Mode::VideoAudio)),
            OutcomeResult::Success {
                saved_file: "old.mp4".to_string()
            }
        );
    }

    #[test]
    fn test_synthesized_name_per_mode() {
        let r = report(clean_exit(), "nothing recognizable", false);
        assert_eq!(
            classify(&r, &request(Mode::Mp3Audio)),
            OutcomeResult::Success {
                saved_file: "download.mp3".to_string()
            }
        );
    }

    #[test]
    fn test_live_stream_ended() {
        let r = report(dirty_exit(), "ERROR: This live event has ended", false);
        match classify(&r, &request(Mode::VideoAudio)) {
            OutcomeResult::Failed { kind, .. } => assert_eq!(kind, ErrorKind::LiveStreamEnded),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_marker_priority_first_match_wins() {
        // Format failure outranks the informational nsig warning by table order
        let log = "WARNING: nsig extraction failed\nERROR: Requested format is not available";
        let r = report(dirty_exit(), log, false);
        match classify(&r, &request(Mode::VideoAudio)) {
            OutcomeResult::Failed { kind, .. } => {
                assert_eq!(kind, ErrorKind::FormatUnavailable)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nsig_on_clean_exit_is_warning_kind() {
        let log = "WARNING: nsig extraction failed\n[download] Destination: /tmp/clip.mp4";
        let r = report(clean_exit(), log, false);
        match classify(&r, &request(Mode::VideoAudio)) {
            OutcomeResult::Failed { kind, .. } => {
                assert_eq!(kind, ErrorKind::SignatureExtractionIssue);
                assert!(kind.is_warning_only());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_surfaces_first_error_line() {
        let log = "[youtube] extracting\nERROR: something exotic went wrong\nmore noise";
        let r = report(dirty_exit(), log, false);
        match classify(&r, &request(Mode::VideoAudio)) {
            OutcomeResult::Failed {
                kind, user_message, ..
            } => {
                assert_eq!(kind, ErrorKind::Unknown);
                assert!(user_message.contains("something exotic"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_user_message_capped() {
        let long = format!("ERROR: {}", "x".repeat(500));
        let r = report(dirty_exit(), &long, false);
        match classify(&r, &request(Mode::VideoAudio)) {
            OutcomeResult::Failed { user_message, .. } => {
                assert!(user_message.chars().count() <= 250);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_spawn_failure_is_executable_not_found() {
        match classify_spawn_failure("yt-dlp") {
            OutcomeResult::Failed { kind, .. } => {
                assert_eq!(kind, ErrorKind::ExecutableNotFound)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
