/// Bounded, concurrent stdout/stderr collection
///
/// Each stream gets its own reader thread so a child blocked on a full pipe
/// can never deadlock the judge. Readers report over a channel, which lets
/// the caller bound how long it waits once the process has exited.
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read};
use std::thread;
use std::time::Duration;

/// Output limits configuration
#[derive(Debug, Clone)]
pub struct OutputLimits {
    /// Per-stream stdout limit (bytes)
    pub stdout_limit: usize,
    /// Per-stream stderr limit (bytes)
    pub stderr_limit: usize,
    /// Bounded wait for readers after the process exited
    pub collect_grace: Duration,
}

impl Default for OutputLimits {
    fn default() -> Self {
        OutputLimits {
            stdout_limit: 8 * 1024 * 1024, // 8 MB stdout
            stderr_limit: 2 * 1024 * 1024, // 2 MB stderr
            collect_grace: Duration::from_millis(1000),
        }
    }
}

/// Output integrity classification
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OutputIntegrity {
    #[default]
    #[serde(rename = "complete")]
    Complete,
    /// Stream exceeded its limit; the excess was drained and discarded
    #[serde(rename = "truncated_by_judge_limit")]
    TruncatedByJudgeLimit,
    /// Reader failed mid-stream
    #[serde(rename = "read_error")]
    ReadError,
    /// Reader did not report within the grace period (a descendant kept the pipe open)
    #[serde(rename = "abandoned")]
    Abandoned,
}

impl std::fmt::Display for OutputIntegrity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputIntegrity::Complete => write!(f, "complete"),
            OutputIntegrity::TruncatedByJudgeLimit => write!(f, "truncated_by_judge_limit"),
            OutputIntegrity::ReadError => write!(f, "read_error"),
            OutputIntegrity::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Bytes captured from one stream
#[derive(Debug, Clone, Default)]
pub struct StreamCapture {
    pub data: Vec<u8>,
    pub integrity: OutputIntegrity,
}

impl StreamCapture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Handle on a running reader thread
pub struct StreamCollector {
    rx: Receiver<StreamCapture>,
}

impl StreamCollector {
    /// Start a reader thread for `stream`, keeping at most `limit` bytes
    pub fn spawn<R: Read + Send + 'static>(
        stream: R,
        limit: usize,
        label: &str,
    ) -> std::io::Result<Self> {
        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name(format!("judgebox-{}", label))
            .spawn(move || collect_stream(stream, limit, tx))?;
        Ok(Self { rx })
    }

    /// Collector for a stream that was never opened
    pub fn empty() -> Self {
        let (tx, rx) = bounded(1);
        let _ = tx.send(StreamCapture::default());
        Self { rx }
    }

    /// Wait at most `grace` for the reader to finish.
    ///
    /// An `Abandoned` result leaves the reader running; once whatever holds
    /// the pipe is gone, waiting again yields everything it read.
    pub fn wait(&self, grace: Duration) -> StreamCapture {
        match self.rx.recv_timeout(grace) {
            Ok(capture) => capture,
            Err(RecvTimeoutError::Timeout) => StreamCapture {
                data: Vec::new(),
                integrity: OutputIntegrity::Abandoned,
            },
            Err(RecvTimeoutError::Disconnected) => StreamCapture {
                data: Vec::new(),
                integrity: OutputIntegrity::ReadError,
            },
        }
    }
}

/// Collect from a single stream with limit
fn collect_stream<R: Read>(stream: R, limit: usize, tx: Sender<StreamCapture>) {
    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut integrity = OutputIntegrity::Complete;

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buffer.len());
                if n > room {
                    // Keep draining so the child never blocks on a full pipe
                    buffer.extend_from_slice(&chunk[..room]);
                    integrity = OutputIntegrity::TruncatedByJudgeLimit;
                } else {
                    buffer.extend_from_slice(&chunk[..n]);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Output reader stopped: {}", e);
                integrity = OutputIntegrity::ReadError;
                break;
            }
        }
    }

    let _ = tx.send(StreamCapture {
        data: buffer,
        integrity,
    });
}
