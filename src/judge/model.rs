/// Problem, test case and submission records exchanged with the persistence layer
use crate::config::types::{LanguageId, ProblemId};
use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stand-in for actual and expected text of hidden test cases
pub const HIDDEN_PLACEHOLDER: &str = "[Hidden]";

pub type SubmissionId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    #[serde(default)]
    pub title: String,
    pub time_limit_ms: u64,
    pub memory_limit_kb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub order_index: i32,
}

/// Outcome of one attempted test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// 1-based position in the ordered test list
    pub test_number: usize,
    pub passed: bool,
    pub actual_output: String,
    pub expected_output: String,
    pub execution_time_seconds: f64,
    pub hidden: bool,
}

/// Submission record; `id` is assigned by the repository on save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Option<SubmissionId>,
    pub problem_id: ProblemId,
    pub language_id: LanguageId,
    pub language_name: String,
    pub source_code: String,
    pub verdict: Verdict,
    /// Maximum elapsed time over all attempts, in seconds
    pub execution_time_seconds: f64,
    pub output: Option<String>,
    pub compile_output: Option<String>,
    pub error_message: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn pending(
        problem_id: ProblemId,
        language_id: LanguageId,
        language_name: impl Into<String>,
        source_code: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            problem_id,
            language_id,
            language_name: language_name.into(),
            source_code: source_code.into(),
            verdict: Verdict::Pending,
            execution_time_seconds: 0.0,
            output: None,
            compile_output: None,
            error_message: None,
            submitted_at: Utc::now(),
        }
    }
}

/// What `submit_code` hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub submission_id: Option<SubmissionId>,
    pub problem_id: ProblemId,
    pub problem_title: String,
    pub language_id: LanguageId,
    pub language_name: String,
    pub verdict: Verdict,
    pub execution_time_seconds: f64,
    pub output: Option<String>,
    pub compile_output: Option<String>,
    pub error_message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub test_case_results: Vec<TestCaseResult>,
}

impl SubmissionReport {
    pub fn new(submission: &Submission, problem: &Problem, results: Vec<TestCaseResult>) -> Self {
        Self {
            submission_id: submission.id,
            problem_id: problem.id,
            problem_title: problem.title.clone(),
            language_id: submission.language_id,
            language_name: submission.language_name.clone(),
            verdict: submission.verdict,
            execution_time_seconds: submission.execution_time_seconds,
            output: submission.output.clone(),
            compile_output: submission.compile_output.clone(),
            error_message: submission.error_message.clone(),
            submitted_at: submission.submitted_at,
            test_case_results: results,
        }
    }
}
