/// Process runner shared by every execution backend
///
/// Runs one external command with a bounded lifetime: feeds stdin, captures
/// stdout/stderr concurrently, enforces the wall-clock timeout and reports a
/// structured outcome. It never decides success vs. error; backends do.
use crate::config::types::{JudgeError, Result};
use crate::exec::output::{OutputIntegrity, OutputLimits, StreamCapture, StreamCollector};
use crate::exec::terminate;
use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::process::{CommandExt, ExitStatusExt};

/// Sleep between exit polls
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// What happened to one command
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stdout: String,
    pub stderr: String,
    /// Exit code when the process exited normally
    pub exit_code: Option<i32>,
    /// Terminating signal (Unix only)
    pub signal: Option<i32>,
    /// Wall time from spawn until exit or forced termination
    pub elapsed: Duration,
    /// The timeout expired and the process tree was killed
    pub timed_out: bool,
    pub stdout_integrity: OutputIntegrity,
    pub stderr_integrity: OutputIntegrity,
}

impl RunOutcome {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    pub fn exited_cleanly(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Spawns commands under the configured output limits
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    limits: OutputLimits,
}

impl ProcessRunner {
    pub fn new(limits: OutputLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &OutputLimits {
        &self.limits
    }

    /// Run `argv` in `workdir`, killing it (and its descendants) after `timeout`.
    ///
    /// `None` or empty stdin closes the child's input immediately. Errors are
    /// returned only when the process could not be started or monitored.
    pub fn run(
        &self,
        argv: &[String],
        workdir: &Path,
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<RunOutcome> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| JudgeError::Process("Empty command provided".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group so a timeout can take down the whole tree
        #[cfg(unix)]
        cmd.process_group(0);

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| JudgeError::Process(format!("Failed to start {}: {}", program, e)))?;
        log::debug!("Spawned {} (pid {}) in {}", program, child.id(), workdir.display());

        let (stdout, stderr) = match self.start_collectors(&mut child) {
            Ok(collectors) => collectors,
            Err(e) => {
                terminate::kill_tree(&mut child);
                let _ = child.wait();
                return Err(e);
            }
        };

        feed_stdin(child.stdin.take(), stdin);

        let (status, timed_out) = match wait_with_timeout(&mut child, timeout) {
            Ok(waited) => waited,
            Err(e) => {
                terminate::kill_tree(&mut child);
                let _ = child.wait();
                return Err(e);
            }
        };
        let elapsed = start.elapsed();

        let grace = self.limits.collect_grace;
        let mut stdout_capture = stdout.wait(grace);
        let mut stderr_capture = stderr.wait(grace);
        if stdout_capture.integrity == OutputIntegrity::Abandoned
            || stderr_capture.integrity == OutputIntegrity::Abandoned
        {
            // A descendant outlived the process and still holds a pipe
            log::warn!("Output readers for pid {} did not finish; reaping stragglers", child.id());
            #[cfg(unix)]
            terminate::kill_group(child.id());

            if stdout_capture.integrity == OutputIntegrity::Abandoned {
                stdout_capture = stdout.wait(grace);
            }
            if stderr_capture.integrity == OutputIntegrity::Abandoned {
                stderr_capture = stderr.wait(grace);
            }
        }

        Ok(build_outcome(status, timed_out, elapsed, stdout_capture, stderr_capture))
    }

    fn start_collectors(&self, child: &mut Child) -> Result<(StreamCollector, StreamCollector)> {
        let stdout = match child.stdout.take() {
            Some(stream) => StreamCollector::spawn(stream, self.limits.stdout_limit, "stdout")?,
            None => StreamCollector::empty(),
        };
        let stderr = match child.stderr.take() {
            Some(stream) => StreamCollector::spawn(stream, self.limits.stderr_limit, "stderr")?,
            None => StreamCollector::empty(),
        };
        Ok((stdout, stderr))
    }
}

/// Write stdin from its own thread; dropping the handle closes the pipe
fn feed_stdin(handle: Option<ChildStdin>, data: Option<&str>) {
    let Some(mut handle) = handle else {
        return;
    };
    let data = match data {
        Some(data) if !data.is_empty() => data.to_owned(),
        _ => return,
    };

    let spawned = thread::Builder::new()
        .name("judgebox-stdin".to_string())
        .spawn(move || {
            if let Err(e) = handle.write_all(data.as_bytes()).and_then(|_| handle.flush()) {
                // The program may exit without reading its input
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    log::debug!("stdin write failed: {}", e);
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Failed to start stdin writer: {}", e);
    }
}

/// Poll for exit; on expiry kill the process tree and reap it
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, bool)> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status, false)),
            Ok(None) => {
                if Instant::now() >= deadline {
                    log::debug!("pid {} exceeded {:?}; killing process tree", child.id(), timeout);
                    terminate::kill_tree(child);
                    let status = child.wait().map_err(|e| {
                        JudgeError::Process(format!("Failed to reap timed out process: {}", e))
                    })?;
                    return Ok((status, true));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(JudgeError::Process(format!(
                    "Process monitoring error: {}",
                    e
                )))
            }
        }
    }
}

fn build_outcome(
    status: ExitStatus,
    timed_out: bool,
    elapsed: Duration,
    stdout: StreamCapture,
    stderr: StreamCapture,
) -> RunOutcome {
    #[cfg(unix)]
    let signal = status.signal();
    #[cfg(not(unix))]
    let signal = None;

    RunOutcome {
        stdout: stdout.text(),
        stderr: stderr.text(),
        exit_code: status.code(),
        signal,
        elapsed,
        timed_out,
        stdout_integrity: stdout.integrity,
        stderr_integrity: stderr.integrity,
    }
}
