/// Isolated backend: every compile and run stage executes in a fresh,
/// disposable docker container.
///
/// Containers get no network, bounded memory (swap disabled), a bounded CPU
/// share and a pids cap. The workspace is bind-mounted read-write at `/code`
/// and the container is removed automatically on exit.
use crate::backend::pipeline::{self, StageLauncher, StageSpec};
use crate::backend::toolchain::Toolchain;
use crate::backend::ExecutionBackend;
use crate::config::loader::{DockerConfig, ExecutorMode, JudgeConfig};
use crate::config::types::{ExecutionRequest, ExecutionResult, JudgeError, Result};
use crate::exec::output::OutputLimits;
use crate::exec::{ProcessRunner, RunOutcome};
use crate::judge::language::CommandContext;
use crate::judge::registry::LanguageTable;
use crate::safety::workspace::WorkspaceRoot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Mount point of the workspace inside the container
const CONTAINER_WORKDIR: &str = "/code";

/// `docker run` itself failed (daemon error, missing image, bad flags)
const EXIT_RUNTIME_FAILURE: i32 = 125;

/// 128 + SIGKILL, what the runtime reports for an OOM-killed entrypoint
const EXIT_KILLED: i32 = 137;

const SIGKILL: i32 = 9;

const CLEANUP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DockerBackend {
    languages: Arc<LanguageTable>,
    root: WorkspaceRoot,
    runner: ProcessRunner,
    compile_timeout: Duration,
    settings: DockerConfig,
    toolchain: Toolchain,
}

impl DockerBackend {
    pub fn new(
        languages: Arc<LanguageTable>,
        root: WorkspaceRoot,
        runner: ProcessRunner,
        compile_timeout: Duration,
        settings: DockerConfig,
    ) -> Self {
        Self {
            languages,
            root,
            runner,
            compile_timeout,
            settings,
            toolchain: Toolchain::container(),
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
            config.docker.clone(),
        )
    }

    /// Memory cap in MB, never below the configured floor
    pub fn memory_mb(&self, memory_limit_kb: u64) -> u64 {
        (memory_limit_kb / 1024).max(self.settings.min_memory_mb)
    }

    /// argv for one `docker run` invocation
    pub fn run_args(
        &self,
        container_name: &str,
        image: &str,
        host_dir: &Path,
        memory_limit_kb: u64,
        command: &str,
    ) -> Vec<String> {
        let memory = format!("{}m", self.memory_mb(memory_limit_kb));
        let mut argv = vec![
            self.settings.binary.clone(),
            "run".to_string(),
            "--rm".to_string(),
            "-i".to_string(),
            "--name".to_string(),
            container_name.to_string(),
            "--network".to_string(),
            "none".to_string(),
            "--memory".to_string(),
            memory.clone(),
            // Equal to --memory: no swap headroom
            "--memory-swap".to_string(),
            memory,
            "--cpus".to_string(),
            self.settings.cpus.to_string(),
            "--pids-limit".to_string(),
            self.settings.pids_limit.to_string(),
            "-v".to_string(),
            format!("{}:{}:rw", host_dir.display(), CONTAINER_WORKDIR),
            "-w".to_string(),
            CONTAINER_WORKDIR.to_string(),
            image.to_string(),
        ];
        argv.extend(self.toolchain.shell_command(command));
        argv
    }

    /// Stop and remove a container that may still be running
    fn remove_container(&self, container_name: &str) {
        for action in [&["kill"][..], &["rm", "-f"][..]] {
            let mut argv = vec![self.settings.binary.clone()];
            argv.extend(action.iter().map(|a| a.to_string()));
            argv.push(container_name.to_string());

            match self
                .runner
                .run(&argv, &std::env::temp_dir(), None, CLEANUP_TIMEOUT)
            {
                Ok(outcome) if outcome.exited_cleanly() => {
                    log::debug!("docker {} {} done", action.join(" "), container_name)
                }
                // Usually "no such container": --rm already took it
                Ok(outcome) => log::debug!(
                    "docker {} {} exited with {:?}: {}",
                    action.join(" "),
                    container_name,
                    outcome.exit_code,
                    outcome.stderr.trim()
                ),
                Err(e) => log::warn!(
                    "docker {} {} failed: {}",
                    action.join(" "),
                    container_name,
                    e
                ),
            }
        }
    }
}

/// Best-effort OOM detection.
///
/// Docker reports an OOM-killed entrypoint as exit 137; the shell wrapper may
/// instead print "Killed". Without the runtime's accounting API this cannot
/// tell an OOM kill from any other SIGKILL.
pub fn looks_out_of_memory(outcome: &RunOutcome) -> bool {
    if outcome.exit_code == Some(EXIT_KILLED) || outcome.signal == Some(SIGKILL) {
        return true;
    }
    outcome.exit_code != Some(0) && outcome.stderr.contains("Killed")
}

impl StageLauncher for DockerBackend {
    fn launch(&self, spec: &StageSpec<'_>) -> Result<RunOutcome> {
        let image = spec.profile.image.as_deref().ok_or_else(|| {
            JudgeError::Config(format!(
                "language {} has no container image",
                spec.profile.id
            ))
        })?;

        let file = format!("{}/{}", CONTAINER_WORKDIR, spec.profile.source_filename());
        let exe = format!("{}/{}", CONTAINER_WORKDIR, self.toolchain.exe_name);
        let ctx = CommandContext {
            file: &file,
            dir: CONTAINER_WORKDIR,
            exe: &exe,
            toolchain: &self.toolchain,
        };
        let command = spec.command(&ctx)?;

        // The daemon needs an absolute, resolved host path for the bind mount
        let host_dir: PathBuf = spec
            .workspace
            .path()
            .canonicalize()
            .unwrap_or_else(|_| spec.workspace.path().to_path_buf());
        let container_name = format!("judgebox-{}", Uuid::new_v4().simple());
        let argv = self.run_args(
            &container_name,
            image,
            &host_dir,
            spec.memory_limit_kb,
            &command,
        );

        // Container start-up is not the submission's fault
        let timeout = spec.timeout + Duration::from_millis(self.settings.grace_ms);
        log::debug!(
            "docker {} stage in {} ({}): {}",
            spec.stage,
            container_name,
            image,
            command
        );
        let outcome = self
            .runner
            .run(&argv, spec.workspace.path(), spec.stdin, timeout)?;

        if outcome.timed_out {
            // Killing the client does not stop the container
            self.remove_container(&container_name);
        }
        Ok(outcome)
    }

    fn classify_run(&self, outcome: RunOutcome) -> ExecutionResult {
        if outcome.timed_out {
            return ExecutionResult::time_limit_exceeded(outcome.elapsed_ms());
        }
        if outcome.exit_code == Some(EXIT_RUNTIME_FAILURE) {
            log::error!("Container runtime failed to start: {}", outcome.stderr.trim());
            return ExecutionResult::internal_error("Container runtime failed to start the program");
        }
        if looks_out_of_memory(&outcome) {
            return ExecutionResult::memory_limit_exceeded(outcome.exit_code, outcome.elapsed_ms());
        }
        pipeline::classify_exit(outcome)
    }

    fn classify_compile(&self, outcome: &RunOutcome, timeout: Duration) -> Option<ExecutionResult> {
        if !outcome.timed_out && outcome.exit_code == Some(EXIT_RUNTIME_FAILURE) {
            log::error!("Container runtime failed to start compiler: {}", outcome.stderr.trim());
            return Some(ExecutionResult::internal_error(
                "Container runtime failed to start the compiler",
            ));
        }
        pipeline::compile_failure(outcome, timeout)
    }
}

impl ExecutionBackend for DockerBackend {
    fn kind(&self) -> ExecutorMode {
        ExecutorMode::Docker
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

    /// Whether the daemon answers `docker info` in time
    fn is_available(&self) -> bool {
        let argv = vec![self.settings.binary.clone(), "info".to_string()];
        let timeout = Duration::from_millis(self.settings.availability_timeout_ms);
        match self.runner.run(&argv, &std::env::temp_dir(), None, timeout) {
            Ok(outcome) if outcome.exited_cleanly() => true,
            Ok(outcome) => {
                log::warn!(
                    "Container runtime is not available (exit {:?}, timed out: {})",
                    outcome.exit_code,
                    outcome.timed_out
                );
                false
            }
            Err(e) => {
                log::warn!("Container runtime is not available: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets;
    use crate::config::types::ExecutionStatus;
    use crate::exec::output::OutputIntegrity;

    fn backend(settings: DockerConfig) -> DockerBackend {
        DockerBackend::new(
            Arc::new(LanguageTable::new(presets::default_languages()).unwrap()),
            WorkspaceRoot::new(std::env::temp_dir().join("judgebox_docker_test")),
            ProcessRunner::default(),
            Duration::from_secs(30),
            settings,
        )
    }

    fn outcome(exit_code: Option<i32>, stderr: &str) -> RunOutcome {
        RunOutcome {
            stdout: "partial".to_string(),
            stderr: stderr.to_string(),
            exit_code,
            signal: None,
            elapsed: Duration::from_millis(120),
            timed_out: false,
            stdout_integrity: OutputIntegrity::Complete,
            stderr_integrity: OutputIntegrity::Complete,
        }
    }

    #[test]
    fn test_run_args_isolate_the_container() {
        let argv = backend(DockerConfig::default()).run_args(
            "judgebox-abc",
            "python:3.9-slim",
            Path::new("/tmp/ws"),
            262_144,
            "python3 /code/solution.py",
        );
        let joined = argv.join(" ");
        assert_eq!(argv[0], "docker");
        assert!(joined.contains("run --rm -i --name judgebox-abc"));
        assert!(joined.contains("--network none"));
        assert!(joined.contains("--memory 256m --memory-swap 256m"));
        assert!(joined.contains("--cpus 0.5"));
        assert!(joined.contains("-v /tmp/ws:/code:rw -w /code"));
        assert_eq!(
            &argv[argv.len() - 4..],
            &["python:3.9-slim", "sh", "-c", "python3 /code/solution.py"]
        );
    }

    #[test]
    fn test_memory_floor() {
        let backend = backend(DockerConfig::default());
        assert_eq!(backend.memory_mb(1024), 32);
        assert_eq!(backend.memory_mb(512 * 1024), 512);
    }

    #[test]
    fn test_oom_detection() {
        assert!(looks_out_of_memory(&outcome(Some(137), "")));
        let mut killed = outcome(None, "");
        killed.signal = Some(9);
        assert!(looks_out_of_memory(&killed));
        assert!(looks_out_of_memory(&outcome(Some(1), "sh: 1: Killed")));
        assert!(!looks_out_of_memory(&outcome(Some(0), "Killed")));
        assert!(!looks_out_of_memory(&outcome(Some(1), "Traceback")));
    }

    #[test]
    fn test_classify_run() {
        let backend = backend(DockerConfig::default());
        let mle = backend.classify_run(outcome(Some(137), ""));
        assert_eq!(mle.status, ExecutionStatus::MemoryLimitExceeded);
        assert!(mle.stdout.is_empty());

        let ie = backend.classify_run(outcome(Some(125), "Unable to find image"));
        assert_eq!(ie.status, ExecutionStatus::InternalError);

        let re = backend.classify_run(outcome(Some(1), "ZeroDivisionError"));
        assert_eq!(re.status, ExecutionStatus::RuntimeError);
        assert_eq!(re.stderr, "ZeroDivisionError");

        let ok = backend.classify_run(outcome(Some(0), ""));
        assert_eq!(ok.status, ExecutionStatus::Success);
        assert_eq!(ok.stdout, "partial");
    }

    #[test]
    fn test_classify_compile_runtime_failure_is_internal() {
        let backend = backend(DockerConfig::default());
        let ie = backend
            .classify_compile(&outcome(Some(125), "daemon error"), Duration::from_secs(30))
            .unwrap();
        assert_eq!(ie.status, ExecutionStatus::InternalError);

        let ce = backend
            .classify_compile(&outcome(Some(1), "error: x"), Duration::from_secs(30))
            .unwrap();
        assert_eq!(ce.status, ExecutionStatus::CompilationError);
    }

    #[test]
    fn test_missing_runtime_is_unavailable() {
        let settings = DockerConfig {
            binary: "/nonexistent/judgebox-docker".to_string(),
            ..DockerConfig::default()
        };
        assert!(!backend(settings).is_available());
    }
}
