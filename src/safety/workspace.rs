/// Disposable per-attempt workspaces
///
/// Every execution attempt gets `<root>/<uuid>`; attempts never share a
/// directory, so concurrent submissions need no locking.
use crate::config::types::{JudgeError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Workspace for one execution attempt, removed on drop
#[derive(Debug)]
pub struct Workspace {
    /// Unique run ID
    run_id: String,
    /// Run-specific workspace directory
    run_dir: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a uniquely named directory under `root`
    pub fn create(root: &Path) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let run_dir = root.join(&run_id);

        fs::create_dir_all(&run_dir).map_err(|e| {
            JudgeError::Workspace(format!(
                "Failed to create workspace directory {}: {}",
                run_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            run_id,
            run_dir,
            removed: false,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.run_dir
    }

    /// Write the submission under its canonical file name
    pub fn write_source(&self, filename: &str, content: &str) -> Result<PathBuf> {
        let source_path = self.run_dir.join(filename);
        fs::write(&source_path, content).map_err(|e| {
            JudgeError::Workspace(format!(
                "Failed to write source file {}: {}",
                source_path.display(),
                e
            ))
        })?;
        Ok(source_path)
    }

    /// Remove the workspace (idempotent). Failures are logged, never surfaced.
    pub fn cleanup(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        if let Err(e) = fs::remove_dir_all(&self.run_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "Failed to remove workspace {}: {}",
                    self.run_dir.display(),
                    e
                );
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Process-wide root that holds all workspaces
#[derive(Debug, Clone)]
pub struct WorkspaceRoot {
    base_dir: PathBuf,
}

impl WorkspaceRoot {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }

    pub fn create_workspace(&self) -> Result<Workspace> {
        Workspace::create(&self.base_dir)
    }

    /// Remove workspaces left behind by a crashed process (older than `max_age`)
    pub fn sweep_stale(&self, max_age: Duration) -> Result<usize> {
        if !self.base_dir.exists() {
            return Ok(0);
        }

        let now = SystemTime::now();
        let mut cleaned = 0;
        let entries = fs::read_dir(&self.base_dir).map_err(|e| {
            JudgeError::Workspace(format!(
                "Failed to read workspace root {}: {}",
                self.base_dir.display(),
                e
            ))
        })?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let age = match entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified))
            {
                Ok(Ok(age)) => age,
                // Unreadable metadata or a future timestamp
                _ => continue,
            };

            if age > max_age {
                log::info!("Cleaning up stale workspace: {}", path.display());
                match fs::remove_dir_all(&path) {
                    Ok(()) => cleaned += 1,
                    Err(e) => log::warn!("Failed to remove stale workspace {}: {}", path.display(), e),
                }
            }
        }

        Ok(cleaned)
    }
}
