// Invocation assembly - builds the full argument lists for the extraction
// executable: the main download call and the metadata-only probe.

use super::compression::plan_compression;
use super::format_selector::build_format_expression;
use super::models::{DownloadRequest, Mode, ToolPaths};

/// Progress line shape the parser's capture contract documents
const PROGRESS_TEMPLATE: &str = "[download] %(progress._percent_str)s \
     %(progress._downloaded_bytes_str)s of ~ %(progress._total_bytes_str)s \
     at %(progress._speed_str)s";

/// Socket-level timeout for the main download call, seconds
const SOCKET_TIMEOUT_SECS: u32 = 30;
/// Bounded retries for extraction and fragment downloads
const EXTRACTION_RETRIES: u32 = 5;
const FRAGMENT_RETRIES: u32 = 50;
/// Short delay between retries, seconds
const RETRY_SLEEP_SECS: u32 = 1;

fn is_youtube(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("youtube.com") || lower.contains("youtu.be")
}

/// Assemble the argument list for the main download invocation.
pub fn build_download_args(request: &DownloadRequest, tools: &ToolPaths) -> Vec<String> {
    let format = build_format_expression(request.mode, request.quality);

    let mut args = vec![
        "-f".to_string(),
        format.as_spec(),
        "--no-playlist".to_string(),
        "--newline".to_string(),
        "--no-update".to_string(),
        "--progress-template".to_string(),
        PROGRESS_TEMPLATE.to_string(),
        "--socket-timeout".to_string(),
        SOCKET_TIMEOUT_SECS.to_string(),
        "--retries".to_string(),
        EXTRACTION_RETRIES.to_string(),
        "--fragment-retries".to_string(),
        FRAGMENT_RETRIES.to_string(),
        "--retry-sleep".to_string(),
        RETRY_SLEEP_SECS.to_string(),
        "-P".to_string(),
        request.output_dir.to_string_lossy().to_string(),
        "-o".to_string(),
        request.output_template.clone(),
        "--ffmpeg-location".to_string(),
        tools.encoder.clone(),
    ];

    if is_youtube(&request.url) {
        // Multiple player clients reduce upstream restriction failures
        args.push("--extractor-args".to_string());
        args.push("youtube:player_client=web,web_safari,ios".to_string());
    }

    match request.mode {
        Mode::VideoAudio | Mode::VideoOnly => {
            // Separate streams merge into one predictable container
            args.push("--merge-output-format".to_string());
            args.push("mp4".to_string());

            let ppa = match plan_compression(request.mode, request.compression) {
                Some(encoder) => format!("Merger+ffmpeg:{}", encoder.to_arg_string()),
                // Stream copy; remux only so the container plays everywhere
                None => "Merger+ffmpeg:-c copy -movflags +faststart".to_string(),
            };
            args.push("--ppa".to_string());
            args.push(ppa);
        }
        Mode::Mp3Audio | Mode::M4aAudio => {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(request.mode.output_ext().to_string());
            args.push("--audio-quality".to_string());
            args.push(request.audio_quality.code().to_string());
        }
    }

    args.push(request.url.clone());
    args
}

/// Assemble the argument list for the metadata-only probe (JSON output).
/// Kept short and quiet; its failure never blocks the main flow.
pub fn build_probe_args(url: &str) -> Vec<String> {
    let mut args = vec![
        "--dump-json".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--socket-timeout".to_string(),
        "15".to_string(),
        "--retries".to_string(),
        "2".to_string(),
    ];
    if is_youtube(url) {
        args.push("--extractor-args".to_string());
        args.push("youtube:player_client=web,web_safari,ios".to_string());
    }
    args.push(url.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{AudioQuality, Compression, QualityTarget};

    fn tools() -> ToolPaths {
        ToolPaths {
            extractor: "yt-dlp".to_string(),
            encoder: "ffmpeg".to_string(),
        }
    }

    fn request(mode: Mode, compression: Compression) -> DownloadRequest {
        DownloadRequest::new(
            "https://youtube.com/watch?v=abc123",
            mode,
            QualityTarget::P720,
            compression,
            AudioQuality::Vbr2,
            "/tmp/out",
        )
        .unwrap()
    }

    #[test]
    fn test_video_args_include_format_and_merge() {
        let args = build_download_args(&request(Mode::VideoAudio, Compression::None), &tools());
        let fpos = args.iter().position(|a| a == "-f").unwrap();
        assert!(args[fpos + 1].ends_with("/b"));
        assert!(args.contains(&"--merge-output-format".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.iter().any(|a| a.contains("-c copy")));
        assert_eq!(args.last().unwrap(), "https://youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_compression_swaps_stream_copy_for_encode() {
        let args = build_download_args(&request(Mode::VideoAudio, Compression::Medium), &tools());
        let ppa = args.iter().find(|a| a.starts_with("Merger+ffmpeg:")).unwrap();
        assert!(ppa.contains("-crf 23"));
        assert!(ppa.contains("-b:a 128k"));
        assert!(!ppa.contains("-c copy"));
    }

    #[test]
    fn test_audio_mode_uses_extraction_directive() {
        let args = build_download_args(&request(Mode::Mp3Audio, Compression::None), &tools());
        assert!(args.contains(&"-x".to_string()));
        let fmt_pos = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[fmt_pos + 1], "mp3");
        let q_pos = args.iter().position(|a| a == "--audio-quality").unwrap();
        assert_eq!(args[q_pos + 1], "2");
        // No merge or ppa for audio extraction
        assert!(!args.contains(&"--merge-output-format".to_string()));
        assert!(!args.contains(&"--ppa".to_string()));
    }

    #[test]
    fn test_client_identities_only_for_youtube() {
        let yt = build_download_args(&request(Mode::VideoAudio, Compression::None), &tools());
        assert!(yt.iter().any(|a| a.contains("player_client")));

        let mut other = request(Mode::VideoAudio, Compression::None);
        other.url = "https://vimeo.com/12345".to_string();
        let args = build_download_args(&other, &tools());
        assert!(!args.iter().any(|a| a.contains("player_client")));
    }

    #[test]
    fn test_probe_args_are_json_and_quiet() {
        let args = build_probe_args("https://youtube.com/watch?v=abc123");
        assert!(args.contains(&"--dump-json".to_string()));
        assert!(args.contains(&"--no-warnings".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_encoder_location_forwarded() {
        let args = build_download_args(&request(Mode::VideoAudio, Compression::None), &tools());
        let pos = args.iter().position(|a| a == "--ffmpeg-location").unwrap();
        assert_eq!(args[pos + 1], "ffmpeg");
    }
}
