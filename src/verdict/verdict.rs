/// Submission verdict
///
/// A submission starts `Pending` and moves exactly once to one of the
/// terminal states; once terminal no further test case is attempted.
use crate::config::types::ExecutionStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    #[default]
    Pending,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompilationError,
    InternalError,
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::Pending)
    }

    /// Verdict implied by a failed attempt; `None` for `Success`, which is
    /// decided by output comparison instead
    pub fn from_status(status: ExecutionStatus) -> Option<Self> {
        match status {
            ExecutionStatus::Success => None,
            ExecutionStatus::CompilationError => Some(Verdict::CompilationError),
            ExecutionStatus::RuntimeError => Some(Verdict::RuntimeError),
            ExecutionStatus::TimeLimitExceeded => Some(Verdict::TimeLimitExceeded),
            ExecutionStatus::MemoryLimitExceeded => Some(Verdict::MemoryLimitExceeded),
            ExecutionStatus::InternalError => Some(Verdict::InternalError),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pending => "PENDING",
            Verdict::Accepted => "ACCEPTED",
            Verdict::WrongAnswer => "WRONG_ANSWER",
            Verdict::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Verdict::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Verdict::RuntimeError => "RUNTIME_ERROR",
            Verdict::CompilationError => "COMPILATION_ERROR",
            Verdict::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_open() {
        assert!(!Verdict::Pending.is_terminal());
        assert!(Verdict::Accepted.is_terminal());
        assert!(Verdict::WrongAnswer.is_terminal());
        assert!(Verdict::InternalError.is_terminal());
        assert_eq!(Verdict::default(), Verdict::Pending);
    }

    #[test]
    fn test_from_status() {
        assert_eq!(Verdict::from_status(ExecutionStatus::Success), None);
        assert_eq!(
            Verdict::from_status(ExecutionStatus::TimeLimitExceeded),
            Some(Verdict::TimeLimitExceeded)
        );
        assert_eq!(
            Verdict::from_status(ExecutionStatus::CompilationError),
            Some(Verdict::CompilationError)
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Verdict::WrongAnswer).unwrap(), "\"WRONG_ANSWER\"");
        let parsed: Verdict = serde_json::from_str("\"MEMORY_LIMIT_EXCEEDED\"").unwrap();
        assert_eq!(parsed, Verdict::MemoryLimitExceeded);
        assert_eq!(Verdict::Accepted.to_string(), "ACCEPTED");
    }
}
