/// Execution backends
///
/// A backend turns one `ExecutionRequest` into one `ExecutionResult` and
/// never returns an error: infrastructure failures come back as
/// `InternalError` results. Exactly one backend is bound per process,
/// selected by `executor.mode`.
pub mod container;
pub mod local;
pub mod pipeline;
pub mod toolchain;

use crate::config::loader::{ExecutorMode, JudgeConfig};
use crate::config::types::{ExecutionRequest, ExecutionResult};
use crate::judge::registry::LanguageTable;
use std::sync::Arc;

pub use container::DockerBackend;
pub use local::LocalBackend;

pub trait ExecutionBackend: Send + Sync {
    fn kind(&self) -> ExecutorMode;

    /// Compile (when needed) and run one submission against one input
    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult;

    /// Whether the backend can currently accept work
    fn is_available(&self) -> bool {
        true
    }
}

/// Build the backend selected by `executor.mode`
pub fn from_config(config: &JudgeConfig, languages: Arc<LanguageTable>) -> Arc<dyn ExecutionBackend> {
    log::info!("Using {} execution backend", config.executor.mode);
    match config.executor.mode {
        ExecutorMode::Local => Arc::new(LocalBackend::from_config(config, languages)),
        ExecutorMode::Docker => Arc::new(DockerBackend::from_config(config, languages)),
    }
}
