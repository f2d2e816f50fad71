// Process supervisor - spawns the extraction executable, streams its
// combined output, enforces the wall-clock ceiling and carries out
// cancellation. Exactly one subprocess per request; the accumulation
// buffer lives here for the lifetime of that request and is never shared
// across requests.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

use super::errors::DownloadError;
use super::progress::parse_progress;
use super::traits::ProgressObserver;

/// Hard ceiling for one extraction invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

/// After exit, buffered output is drained for at most this long. Orphaned
/// grandchildren can keep the pipes open past the kill; their output no
/// longer matters.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

struct CancelState {
    requested: AtomicBool,
    notify: Notify,
}

/// Cancellation control handed to the host. Cloneable and idempotent:
/// cancelling twice, or cancelling a process that already exited, is a
/// no-op rather than an error. The subprocess itself stays exclusively
/// owned by the supervisor task.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelState {
                requested: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Request cancellation. The first call wins; the kill is sent once and
    /// never retried.
    pub fn cancel(&self) {
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_one();
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    async fn notified(&self) {
        self.inner.notify.notified().await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// How the subprocess ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitKind {
    Exited { success: bool, code: Option<i32> },
    TimedOut,
}

/// Everything the classifier needs about one finished run
#[derive(Debug)]
pub struct RunReport {
    pub exit: ExitKind,
    /// Accumulated combined output, arrival order, stream interleaving
    /// best-effort
    pub log: String,
    /// Whether cancellation was requested at any point before classification
    pub cancelled: bool,
}

pub struct Supervisor {
    timeout: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Spawn `program` with `args`, stream output until exit, kill on
    /// timeout or cancel. A spawn failure is returned immediately without
    /// producing a report.
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        handle: &CancelHandle,
        observer: &dyn ProgressObserver,
    ) -> Result<RunReport, DownloadError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        debug!(program, "subprocess spawned");

        let stdout = child.stdout.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "failed to capture stdout")
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "failed to capture stderr")
        })?;

        // Both streams feed one channel; lines arrive in best-effort order
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let tx_err = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx_err.send(line).is_err() {
                    break;
                }
            }
        });

        let mut log = String::new();
        // Cancel may have landed before the spawn finished
        let mut kill_pending = handle.is_cancel_requested();
        let mut kill_sent = false;
        let mut timed_out = false;
        let mut lines_open = true;

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let status = loop {
            // The kill is sent exactly once, outside the select so the
            // child is not borrowed by a pending wait future
            if kill_pending && !kill_sent {
                kill_sent = true;
                let _ = child.start_kill();
            }
            tokio::select! {
                res = child.wait() => break res?,
                maybe = rx.recv(), if lines_open => {
                    match maybe {
                        Some(line) => consume_line(&mut log, &line, observer),
                        None => lines_open = false,
                    }
                }
                _ = handle.notified(), if !kill_pending => {
                    debug!(program, "cancel requested, killing subprocess");
                    kill_pending = true;
                }
                _ = &mut deadline, if !kill_pending => {
                    warn!(
                        program,
                        timeout_secs = self.timeout.as_secs(),
                        "wall clock ceiling elapsed, killing subprocess"
                    );
                    timed_out = true;
                    kill_pending = true;
                }
            }
        };

        // Drain whatever the readers still held when the process died
        if lines_open {
            let drain = async {
                while let Some(line) = rx.recv().await {
                    consume_line(&mut log, &line, observer);
                }
            };
            let _ = tokio::time::timeout(DRAIN_GRACE, drain).await;
        }

        let exit = if timed_out {
            ExitKind::TimedOut
        } else {
            ExitKind::Exited {
                success: status.success(),
                code: status.code(),
            }
        };

        Ok(RunReport {
            exit,
            log,
            cancelled: handle.is_cancel_requested(),
        })
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

fn consume_line(log: &mut String, line: &str, observer: &dyn ProgressObserver) {
    if let Some(sample) = parse_progress(line) {
        observer.on_progress(sample);
    }
    log.push_str(line);
    log.push('\n');
}
