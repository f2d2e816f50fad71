// Metadata probe - an independent, lower-priority JSON call made ahead of
// the main download so the size estimator has a duration to work with.
// A probe failure only suppresses the estimate; it never blocks the flow.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::errors::DownloadError;
use super::invocation::build_probe_args;
use super::models::MediaMetadata;

/// The probe is short-lived by design
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the extractor in metadata-only mode and parse its JSON output.
pub async fn probe_metadata(extractor: &str, url: &str) -> Result<MediaMetadata, DownloadError> {
    let args = build_probe_args(url);
    let stdout = run_probe(extractor, &args, PROBE_TIMEOUT).await?;
    parse_metadata(&stdout)
}

async fn run_probe(
    program: &str,
    args: &[String],
    ceiling: Duration,
) -> Result<Vec<u8>, DownloadError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| DownloadError::Spawn {
            program: program.to_string(),
            source: e,
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "failed to capture stdout")
    })?;

    let reader = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf).await;
        buf
    });

    match timeout(ceiling, child.wait()).await {
        Ok(status) => {
            let status = status?;
            let stdout = reader.await.unwrap_or_default();
            if !status.success() {
                debug!(program, "metadata probe exited nonzero");
                return Err(DownloadError::Parse(
                    "metadata probe exited with an error".to_string(),
                ));
            }
            Ok(stdout)
        }
        Err(_) => {
            let _ = child.start_kill();
            reader.abort();
            Err(DownloadError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "metadata probe timed out",
            )))
        }
    }
}

/// Parse the probe's `--dump-json` output. Missing fields degrade to `None`
/// rather than failing the probe.
pub fn parse_metadata(stdout: &[u8]) -> Result<MediaMetadata, DownloadError> {
    let text = String::from_utf8_lossy(stdout);
    let json_line = text
        .lines()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| DownloadError::Parse("no JSON object in probe output".to_string()))?;

    let json: serde_json::Value = serde_json::from_str(json_line)
        .map_err(|e| DownloadError::Parse(format!("invalid JSON: {}", e)))?;

    Ok(MediaMetadata {
        title: json["title"].as_str().map(|s| s.to_string()),
        duration_secs: json["duration"].as_f64(),
        filesize_approx: json["filesize_approx"]
            .as_u64()
            .or_else(|| json["filesize"].as_u64()),
    })
}
