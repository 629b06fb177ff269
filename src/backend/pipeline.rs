/// Compile-then-run sequencing shared by both backends
///
/// Owns language lookup, workspace lifetime, source placement and stage
/// ordering. A backend only decides how one stage is launched and how its
/// outcome is classified. Every failure is converted into an
/// `ExecutionResult` here; nothing unclassified reaches the judge service.
use crate::config::types::{ExecutionRequest, ExecutionResult, JudgeError, Result};
use crate::exec::RunOutcome;
use crate::judge::language::LanguageProfile;
use crate::judge::registry::LanguageTable;
use crate::safety::workspace::{Workspace, WorkspaceRoot};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Run,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Compile => write!(f, "compile"),
            Stage::Run => write!(f, "run"),
        }
    }
}

/// Everything a backend needs to launch one stage
pub struct StageSpec<'a> {
    pub stage: Stage,
    pub profile: &'a LanguageProfile,
    pub workspace: &'a Workspace,
    pub stdin: Option<&'a str>,
    /// Caller's limit; backends may add their own overhead allowance
    pub timeout: Duration,
    pub memory_limit_kb: u64,
}

impl StageSpec<'_> {
    /// Rendered template for this stage
    pub fn command(&self, ctx: &crate::judge::language::CommandContext<'_>) -> Result<String> {
        match self.stage {
            Stage::Compile => self.profile.compile_command(ctx).ok_or_else(|| {
                JudgeError::Config(format!("language {} has no compile step", self.profile.id))
            }),
            Stage::Run => Ok(self.profile.run_command(ctx)),
        }
    }
}

pub trait StageLauncher {
    /// Start one stage and wait for it under `spec.timeout`
    fn launch(&self, spec: &StageSpec<'_>) -> Result<RunOutcome>;

    /// Map a finished run stage onto an execution status
    fn classify_run(&self, outcome: RunOutcome) -> ExecutionResult {
        classify_exit(outcome)
    }

    /// `Some` when the compile stage failed and the run must not happen
    fn classify_compile(&self, outcome: &RunOutcome, timeout: Duration) -> Option<ExecutionResult> {
        compile_failure(outcome, timeout)
    }
}

/// Full attempt: lookup, workspace, compile, run, cleanup
pub fn execute<L: StageLauncher>(
    launcher: &L,
    languages: &LanguageTable,
    root: &WorkspaceRoot,
    compile_timeout: Duration,
    request: &ExecutionRequest,
) -> ExecutionResult {
    // Unknown languages are rejected before touching the filesystem
    let Some(profile) = languages.get(request.language_id) else {
        log::warn!("Rejected execution for unsupported language {}", request.language_id);
        return ExecutionResult::internal_error(format!(
            "Unsupported language ID: {}",
            request.language_id
        ));
    };

    let mut workspace = match root.create_workspace() {
        Ok(workspace) => workspace,
        Err(e) => {
            log::error!("Execution failed before start: {}", e);
            return ExecutionResult::internal_error(public_message(&e));
        }
    };
    log::debug!(
        "Attempt {} ({}) in {}",
        workspace.run_id(),
        profile.name,
        workspace.path().display()
    );

    let result = match run_stages(launcher, profile, &workspace, compile_timeout, request) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Execution {} failed: {}", workspace.run_id(), e);
            ExecutionResult::internal_error(public_message(&e))
        }
    };

    workspace.cleanup();
    result
}

fn run_stages<L: StageLauncher>(
    launcher: &L,
    profile: &LanguageProfile,
    workspace: &Workspace,
    compile_timeout: Duration,
    request: &ExecutionRequest,
) -> Result<ExecutionResult> {
    workspace.write_source(&profile.source_filename(), &request.source)?;

    if profile.requires_compilation() {
        let outcome = launcher.launch(&StageSpec {
            stage: Stage::Compile,
            profile,
            workspace,
            stdin: None,
            timeout: compile_timeout,
            memory_limit_kb: request.memory_limit_kb,
        })?;
        if let Some(failure) = launcher.classify_compile(&outcome, compile_timeout) {
            log::debug!("Compile stage failed for {}: {}", workspace.run_id(), failure.status);
            return Ok(failure);
        }
    }

    let outcome = launcher.launch(&StageSpec {
        stage: Stage::Run,
        profile,
        workspace,
        stdin: Some(request.stdin.as_str()),
        timeout: Duration::from_millis(request.time_limit_ms),
        memory_limit_kb: request.memory_limit_kb,
    })?;
    Ok(launcher.classify_run(outcome))
}

/// Exit-code based classification: 0 is success, anything else a runtime error.
///
/// stderr text is carried as diagnostics only, never used to decide.
pub fn classify_exit(outcome: RunOutcome) -> ExecutionResult {
    let elapsed_ms = outcome.elapsed_ms();
    if outcome.timed_out {
        return ExecutionResult::time_limit_exceeded(elapsed_ms);
    }
    match (outcome.exit_code, outcome.signal) {
        (Some(0), _) => ExecutionResult::success(outcome.stdout, outcome.stderr, elapsed_ms),
        (None, Some(signal)) => {
            let stderr = if outcome.stderr.trim().is_empty() {
                format!("Terminated by signal {}", signal)
            } else {
                outcome.stderr
            };
            ExecutionResult::runtime_error(stderr, None, elapsed_ms)
        }
        (code, _) => ExecutionResult::runtime_error(outcome.stderr, code, elapsed_ms),
    }
}

/// Compile timeout or non-zero exit is a compilation error
pub fn compile_failure(outcome: &RunOutcome, timeout: Duration) -> Option<ExecutionResult> {
    if outcome.timed_out {
        return Some(ExecutionResult::compilation_error(format!(
            "Compilation timed out after {} ms",
            timeout.as_millis()
        )));
    }
    if outcome.exit_code == Some(0) {
        return None;
    }
    // Some toolchains print diagnostics on stdout
    let diagnostics = if outcome.stderr.trim().is_empty() {
        outcome.stdout.clone()
    } else {
        outcome.stderr.clone()
    };
    Some(ExecutionResult::compilation_error(diagnostics))
}

/// Caller-facing text for an infrastructure failure; details stay in the log
fn public_message(error: &JudgeError) -> String {
    match error {
        JudgeError::Workspace(_) | JudgeError::Io(_) => {
            "Execution failed: could not prepare workspace".to_string()
        }
        JudgeError::Process(_) => "Execution failed: could not start process".to_string(),
        JudgeError::UnsupportedLanguage(id) => format!("Unsupported language ID: {}", id),
        JudgeError::Config(_) => "Execution failed: language is misconfigured".to_string(),
        _ => "Execution failed: internal error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ExecutionStatus;
    use crate::exec::output::OutputIntegrity;

    fn outcome(exit_code: Option<i32>, signal: Option<i32>, stderr: &str) -> RunOutcome {
        RunOutcome {
            stdout: "out".to_string(),
            stderr: stderr.to_string(),
            exit_code,
            signal,
            elapsed: Duration::from_millis(40),
            timed_out: false,
            stdout_integrity: OutputIntegrity::Complete,
            stderr_integrity: OutputIntegrity::Complete,
        }
    }

    #[test]
    fn test_exit_code_drives_classification() {
        assert_eq!(classify_exit(outcome(Some(0), None, "warning")).status, ExecutionStatus::Success);

        // No error marker in stderr, still a runtime error
        let re = classify_exit(outcome(Some(1), None, ""));
        assert_eq!(re.status, ExecutionStatus::RuntimeError);
        assert_eq!(re.exit_code, Some(1));
        assert_eq!(re.elapsed_ms, 40);
    }

    #[test]
    fn test_signal_without_stderr_gets_message() {
        let re = classify_exit(outcome(None, Some(11), ""));
        assert_eq!(re.status, ExecutionStatus::RuntimeError);
        assert_eq!(re.stderr, "Terminated by signal 11");
    }

    #[test]
    fn test_timeout_wins_over_exit_status() {
        let mut timed_out = outcome(None, Some(9), "");
        timed_out.timed_out = true;
        let tle = classify_exit(timed_out);
        assert_eq!(tle.status, ExecutionStatus::TimeLimitExceeded);
        assert!(tle.stdout.is_empty());
    }

    #[test]
    fn test_compile_failure_prefers_stderr() {
        let timeout = Duration::from_secs(30);
        assert!(compile_failure(&outcome(Some(0), None, ""), timeout).is_none());

        let ce = compile_failure(&outcome(Some(1), None, "error: expected ';'"), timeout).unwrap();
        assert_eq!(ce.status, ExecutionStatus::CompilationError);
        assert_eq!(ce.stderr, "error: expected ';'");

        let ce = compile_failure(&outcome(Some(2), None, ""), timeout).unwrap();
        assert_eq!(ce.stderr, "out");
    }

    #[test]
    fn test_compile_timeout_is_compilation_error() {
        let mut slow = outcome(None, Some(9), "");
        slow.timed_out = true;
        let ce = compile_failure(&slow, Duration::from_millis(500)).unwrap();
        assert_eq!(ce.status, ExecutionStatus::CompilationError);
        assert_eq!(ce.stderr, "Compilation timed out after 500 ms");
    }
}
