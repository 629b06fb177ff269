/// Unsandboxed backend: compile and run as ordinary child processes.
///
/// Lowest overhead. No network or memory containment; only the wall-clock
/// limit is enforced.
use crate::backend::pipeline::{self, StageLauncher, StageSpec};
use crate::backend::toolchain::{self, Toolchain};
use crate::backend::ExecutionBackend;
use crate::config::loader::{ExecutorMode, JudgeConfig};
use crate::config::types::{ExecutionRequest, ExecutionResult, Result};
use crate::exec::output::OutputLimits;
use crate::exec::{ProcessRunner, RunOutcome};
use crate::judge::language::CommandContext;
use crate::judge::registry::LanguageTable;
use crate::safety::workspace::WorkspaceRoot;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct LocalBackend {
    languages: Arc<LanguageTable>,
    root: WorkspaceRoot,
    runner: ProcessRunner,
    compile_timeout: Duration,
    toolchain: &'static Toolchain,
}

impl LocalBackend {
    pub fn new(
        languages: Arc<LanguageTable>,
        root: WorkspaceRoot,
        runner: ProcessRunner,
        compile_timeout: Duration,
    ) -> Self {
        Self {
            languages,
            root,
            runner,
            compile_timeout,
            toolchain: &*toolchain::HOST,
        }
    }

    pub fn from_config(config: &JudgeConfig, languages: Arc<LanguageTable>) -> Self {
        let limits = OutputLimits {
            stdout_limit: config.executor.stdout_limit_bytes,
            stderr_limit: config.executor.stderr_limit_bytes,
            collect_grace: config.collect_grace(),
        };
        Self::new(
            languages,
            WorkspaceRoot::new(config.temp_root()),
            ProcessRunner::new(limits),
            config.compile_timeout(),
        )
    }
}

impl StageLauncher for LocalBackend {
    fn launch(&self, spec: &StageSpec<'_>) -> Result<RunOutcome> {
        let dir = spec.workspace.path();
        let file = shell_quote(&dir.join(spec.profile.source_filename()));
        let exe = shell_quote(&dir.join(&self.toolchain.exe_name));
        let dir_arg = shell_quote(dir);
        let ctx = CommandContext {
            file: &file,
            dir: &dir_arg,
            exe: &exe,
            toolchain: self.toolchain,
        };

        let command = spec.command(&ctx)?;
        log::debug!("local {} stage: {}", spec.stage, command);
        let argv = self.toolchain.shell_command(&command);
        self.runner.run(&argv, dir, spec.stdin, spec.timeout)
    }
}

impl ExecutionBackend for LocalBackend {
    fn kind(&self) -> ExecutorMode {
        ExecutorMode::Local
    }

    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        pipeline::execute(
            self,
            &self.languages,
            &self.root,
            self.compile_timeout,
            request,
        )
    }
}

/// Quote a host path for the platform shell
#[cfg(not(windows))]
fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let safe = raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | ':' | '+'));
    if safe {
        raw.into_owned()
    } else {
        format!("'{}'", raw.replace('\'', "'\\''"))
    }
}

#[cfg(windows)]
fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if raw.contains(' ') {
        format!("\"{}\"", raw)
    } else {
        raw.into_owned()
    }
}
