/// Core types shared by the runner, the backends and the judge service
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric language identifier (Judge0 numbering, e.g. 71 = Python 3)
pub type LanguageId = u32;

/// Problem identifier owned by the persistence layer
pub type ProblemId = u64;

/// One execution attempt: a submission run against a single input
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Source code text as submitted
    pub source: String,
    /// Language to compile/run the source with
    pub language_id: LanguageId,
    /// Data fed to the program's stdin (empty closes stdin immediately)
    pub stdin: String,
    /// Wall-clock limit for the run step
    pub time_limit_ms: u64,
    /// Memory limit; enforced only by the isolated backend
    pub memory_limit_kb: u64,
}

impl ExecutionRequest {
    pub fn new(
        source: impl Into<String>,
        language_id: LanguageId,
        stdin: impl Into<String>,
        time_limit_ms: u64,
        memory_limit_kb: u64,
    ) -> Self {
        Self {
            source: source.into(),
            language_id,
            stdin: stdin.into(),
            time_limit_ms,
            memory_limit_kb,
        }
    }
}

/// Status of one execution attempt - closed set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    /// Program ran to completion with exit code 0
    #[serde(rename = "SUCCESS")]
    Success,
    /// Compile step failed; the run step was never attempted
    #[serde(rename = "COMPILATION_ERROR")]
    CompilationError,
    /// Non-zero exit or fatal signal
    #[serde(rename = "RUNTIME_ERROR")]
    RuntimeError,
    /// Wall-clock limit expired and the process tree was killed
    #[serde(rename = "TIME_LIMIT_EXCEEDED")]
    TimeLimitExceeded,
    /// Out-of-memory kill detected (isolated backend only)
    #[serde(rename = "MEMORY_LIMIT_EXCEEDED")]
    MemoryLimitExceeded,
    /// Judge infrastructure failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Success => write!(f, "SUCCESS"),
            ExecutionStatus::CompilationError => write!(f, "COMPILATION_ERROR"),
            ExecutionStatus::RuntimeError => write!(f, "RUNTIME_ERROR"),
            ExecutionStatus::TimeLimitExceeded => write!(f, "TIME_LIMIT_EXCEEDED"),
            ExecutionStatus::MemoryLimitExceeded => write!(f, "MEMORY_LIMIT_EXCEEDED"),
            ExecutionStatus::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Structured outcome of one execution attempt
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    /// Standard output of the run step
    pub stdout: String,
    /// Standard error of the failing step (compiler diagnostics on compile errors)
    pub stderr: String,
    /// Exit code, when the process exited normally
    pub exit_code: Option<i32>,
    /// Wall time of the run step in milliseconds
    pub elapsed_ms: u64,
    pub status: ExecutionStatus,
    /// Human readable detail for non-success statuses
    pub message: Option<String>,
}

impl ExecutionResult {
    pub fn success(stdout: String, stderr: String, elapsed_ms: u64) -> Self {
        Self {
            stdout,
            stderr,
            exit_code: Some(0),
            elapsed_ms,
            status: ExecutionStatus::Success,
            message: None,
        }
    }

    pub fn compilation_error(diagnostics: String) -> Self {
        Self {
            stdout: String::new(),
            stderr: diagnostics,
            exit_code: None,
            elapsed_ms: 0,
            status: ExecutionStatus::CompilationError,
            message: Some("Compilation failed".to_string()),
        }
    }

    pub fn runtime_error(stderr: String, exit_code: Option<i32>, elapsed_ms: u64) -> Self {
        let message = match exit_code {
            Some(code) => format!("Process exited with code {}", code),
            None => "Process terminated abnormally".to_string(),
        };
        Self {
            stdout: String::new(),
            stderr,
            exit_code,
            elapsed_ms,
            status: ExecutionStatus::RuntimeError,
            message: Some(message),
        }
    }

    /// Program output is suppressed for limit violations
    pub fn time_limit_exceeded(elapsed_ms: u64) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            elapsed_ms,
            status: ExecutionStatus::TimeLimitExceeded,
            message: Some("Time Limit Exceeded".to_string()),
        }
    }

    pub fn memory_limit_exceeded(exit_code: Option<i32>, elapsed_ms: u64) -> Self {
        Self {
            stdout: String::new(),
            stderr: "Memory limit exceeded".to_string(),
            exit_code,
            elapsed_ms,
            status: ExecutionStatus::MemoryLimitExceeded,
            message: Some("Memory Limit Exceeded".to_string()),
        }
    }

    /// `message` reaches the caller; keep host paths and internals out of it
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            elapsed_ms: 0,
            status: ExecutionStatus::InternalError,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Custom error types for judgebox
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Unsupported language ID: {0}")]
    UnsupportedLanguage(LanguageId),

    #[error("Problem not found: {0}")]
    ProblemNotFound(ProblemId),

    #[error("Repository error: {0}")]
    Repository(String),
}

pub type Result<T> = std::result::Result<T, JudgeError>;
