/// Configuration loading from judge.json
use crate::config::presets;
use crate::config::types::{JudgeError, Result};
use crate::judge::language::LanguageProfile;
use crate::judge::registry::LanguageTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "judge.json";

/// Which execution backend is bound for the process lifetime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// Ordinary child processes, no isolation
    Local,
    /// Disposable docker container per compile/run step
    Docker,
}

impl std::fmt::Display for ExecutorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorMode::Local => write!(f, "local"),
            ExecutorMode::Docker => write!(f, "docker"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub mode: ExecutorMode,
    /// Root under which every attempt gets its own workspace
    pub temp_root: Option<PathBuf>,
    /// Compile step budget, independent of the problem's time limit
    pub compile_timeout_ms: u64,
    pub stdout_limit_bytes: usize,
    pub stderr_limit_bytes: usize,
    /// How long to wait for output readers once the process has exited
    pub collect_grace_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: ExecutorMode::Local,
            temp_root: None,
            compile_timeout_ms: 30_000,
            stdout_limit_bytes: 8 * 1024 * 1024,
            stderr_limit_bytes: 2 * 1024 * 1024,
            collect_grace_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Container runtime CLI
    pub binary: String,
    /// CPU share passed as `--cpus`
    pub cpus: f64,
    /// Added to the wall limit to absorb container start overhead
    pub grace_ms: u64,
    pub min_memory_mb: u64,
    pub pids_limit: u32,
    pub availability_timeout_ms: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            cpus: 0.5,
            grace_ms: 2_000,
            min_memory_mb: 32,
            pids_limit: 64,
            availability_timeout_ms: 5_000,
        }
    }
}

/// Full judge.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub executor: ExecutorConfig,
    pub docker: DockerConfig,
    /// Replaces the built-in language table when present
    pub languages: Option<Vec<LanguageProfile>>,
}

impl JudgeConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            JudgeError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: JudgeConfig = serde_json::from_str(&content)
            .map_err(|e| JudgeError::Config(format!("Failed to parse config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load ./judge.json, or fall back to built-in defaults when it is absent
    pub fn load_default() -> Result<Self> {
        let config_path = std::env::current_dir()
            .map_err(|e| JudgeError::Config(format!("Failed to get current directory: {}", e)))?
            .join(DEFAULT_CONFIG_FILE);

        if !config_path.exists() {
            log::info!("{} not found, using built-in defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        Self::load_from_file(config_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.executor.compile_timeout_ms == 0 {
            return Err(JudgeError::Config(
                "executor.compile_timeout_ms must be positive".to_string(),
            ));
        }
        if self.executor.collect_grace_ms == 0 {
            return Err(JudgeError::Config(
                "executor.collect_grace_ms must be positive".to_string(),
            ));
        }
        if self.executor.stdout_limit_bytes == 0 || self.executor.stderr_limit_bytes == 0 {
            return Err(JudgeError::Config(
                "executor output limits must be positive".to_string(),
            ));
        }
        if self.docker.cpus.is_nan() || self.docker.cpus <= 0.0 {
            return Err(JudgeError::Config("docker.cpus must be positive".to_string()));
        }
        if self.docker.binary.trim().is_empty() {
            return Err(JudgeError::Config("docker.binary must not be empty".to_string()));
        }
        if self.docker.availability_timeout_ms == 0 {
            return Err(JudgeError::Config(
                "docker.availability_timeout_ms must be positive".to_string(),
            ));
        }
        if let Some(languages) = &self.languages {
            // Builds the table, which rejects duplicates and empty templates
            LanguageTable::new(languages.clone())?;
        }
        Ok(())
    }

    /// Language table this deployment serves
    pub fn language_table(&self) -> Result<LanguageTable> {
        match &self.languages {
            Some(languages) => LanguageTable::new(languages.clone()),
            None => LanguageTable::new(presets::default_languages()),
        }
    }

    /// Workspace root, scoped by effective UID so different users never share it
    pub fn temp_root(&self) -> PathBuf {
        self.executor
            .temp_root
            .clone()
            .unwrap_or_else(default_temp_root)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.executor.compile_timeout_ms)
    }

    pub fn collect_grace(&self) -> Duration {
        Duration::from_millis(self.executor.collect_grace_ms)
    }
}

#[cfg(unix)]
fn default_temp_root() -> PathBuf {
    let euid = nix::unistd::geteuid();
    std::env::temp_dir().join(format!("judgebox-uid-{}", euid))
}

#[cfg(not(unix))]
fn default_temp_root() -> PathBuf {
    std::env::temp_dir().join("judgebox")
}
