/// Judge service: runs a submission through a problem's test cases
///
/// Test cases execute strictly one after another. The first attempt that is
/// not a passing `Success` fixes the verdict and nothing after it runs.
/// Infrastructure failures never retry; they end the submission with
/// `InternalError` and a message safe to show the submitter.
use crate::backend::ExecutionBackend;
use crate::config::types::{
    ExecutionRequest, ExecutionResult, ExecutionStatus, JudgeError, LanguageId, ProblemId, Result,
};
use crate::judge::model::{
    Problem, Submission, SubmissionReport, TestCase, TestCaseResult, HIDDEN_PLACEHOLDER,
};
use crate::judge::registry::LanguageTable;
use crate::judge::repository::JudgeRepository;
use crate::verdict::{normalize_output, Verdict};
use std::sync::Arc;

pub struct JudgeService {
    backend: Arc<dyn ExecutionBackend>,
    languages: Arc<LanguageTable>,
    repository: Arc<dyn JudgeRepository>,
}

impl JudgeService {
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        languages: Arc<LanguageTable>,
        repository: Arc<dyn JudgeRepository>,
    ) -> Self {
        log::info!("Judge service initialized with {} executor", backend.kind());
        Self {
            backend,
            languages,
            repository,
        }
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    /// Judge `source_code` against every test case of `problem_id`.
    ///
    /// Only a missing problem (or a storage failure) is an `Err`; every other
    /// outcome is a report carrying a terminal verdict, persisted once.
    pub fn submit_code(
        &self,
        problem_id: ProblemId,
        language_id: LanguageId,
        source_code: &str,
    ) -> Result<SubmissionReport> {
        let problem = self
            .repository
            .problem(problem_id)?
            .ok_or(JudgeError::ProblemNotFound(problem_id))?;

        let language_name = self.languages.display_name(language_id).unwrap_or("Unknown");
        let mut submission = Submission::pending(problem_id, language_id, language_name, source_code);

        let results = self.judge(&problem, &mut submission);
        debug_assert!(submission.verdict.is_terminal());

        let saved = self.repository.save_submission(submission)?;
        log::info!(
            "Submission {:?} for problem {} ({}): {} in {:.3}s after {} test case(s)",
            saved.id,
            problem.id,
            saved.language_name,
            saved.verdict,
            saved.execution_time_seconds,
            results.len()
        );
        Ok(SubmissionReport::new(&saved, &problem, results))
    }

    /// Drive the verdict state machine; leaves `submission` terminal
    fn judge(&self, problem: &Problem, submission: &mut Submission) -> Vec<TestCaseResult> {
        let mut results = Vec::new();

        if !self.languages.contains(submission.language_id) {
            let supported = self
                .languages
                .iter()
                .map(|p| p.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            fail(
                submission,
                format!(
                    "Unsupported language ID: {}. Supported: {}",
                    submission.language_id, supported
                ),
            );
            return results;
        }

        let mut test_cases = match self.repository.test_cases(problem.id) {
            Ok(cases) => cases,
            Err(e) => {
                log::error!("Failed to load test cases for problem {}: {}", problem.id, e);
                fail(submission, "Failed to load test cases for this problem");
                return results;
            }
        };
        if test_cases.is_empty() {
            fail(submission, "No test cases found for this problem");
            return results;
        }
        // Stable: equal indices keep storage order
        test_cases.sort_by_key(|case| case.order_index);

        if !self.backend.is_available() {
            fail(submission, "Execution backend is not available");
            return results;
        }

        let mut max_elapsed_ms: u64 = 0;
        for (index, case) in test_cases.iter().enumerate() {
            let test_number = index + 1;
            let request = ExecutionRequest::new(
                submission.source_code.as_str(),
                submission.language_id,
                case.input.as_str(),
                problem.time_limit_ms,
                problem.memory_limit_kb,
            );
            let result = self.backend.execute(&request);

            max_elapsed_ms = max_elapsed_ms.max(result.elapsed_ms);
            submission.execution_time_seconds = max_elapsed_ms as f64 / 1000.0;
            log::debug!(
                "Problem {} test {}/{}: {} in {} ms",
                problem.id,
                test_number,
                test_cases.len(),
                result.status,
                result.elapsed_ms
            );

            match result.status {
                ExecutionStatus::CompilationError => {
                    submission.verdict = Verdict::CompilationError;
                    submission.compile_output = Some(result.stderr);
                    return results;
                }
                ExecutionStatus::InternalError => {
                    let message = result
                        .message
                        .unwrap_or_else(|| "Execution failed: internal error".to_string());
                    log::error!(
                        "Internal error on problem {} test {}: {}",
                        problem.id,
                        test_number,
                        message
                    );
                    submission.verdict = Verdict::InternalError;
                    submission.error_message = Some(message);
                    return results;
                }
                ExecutionStatus::TimeLimitExceeded
                | ExecutionStatus::MemoryLimitExceeded
                | ExecutionStatus::RuntimeError => {
                    if result.status == ExecutionStatus::RuntimeError {
                        submission.error_message = Some(if case.is_hidden {
                            log::debug!(
                                "Runtime error on hidden test {} of problem {}: {}",
                                test_number,
                                problem.id,
                                result.stderr
                            );
                            format!("Runtime error on hidden test case {}", test_number)
                        } else {
                            result.stderr.clone()
                        });
                    }
                    let actual = result.stderr.clone();
                    record(&mut results, submission, test_number, false, actual, case, &result);
                    submission.verdict =
                        Verdict::from_status(result.status).unwrap_or(Verdict::InternalError);
                    return results;
                }
                ExecutionStatus::Success => {
                    let actual = normalize_output(&result.stdout);
                    let passed = actual == normalize_output(&case.expected_output);
                    record(&mut results, submission, test_number, passed, actual, case, &result);
                    if !passed {
                        submission.verdict = Verdict::WrongAnswer;
                        return results;
                    }
                }
            }
        }

        submission.verdict = Verdict::Accepted;
        results
    }
}

fn fail(submission: &mut Submission, message: impl Into<String>) {
    let message = message.into();
    log::error!(
        "Submission for problem {} failed before execution: {}",
        submission.problem_id,
        message
    );
    submission.verdict = Verdict::InternalError;
    submission.error_message = Some(message);
}

/// Append a per-test entry; hidden cases never carry real text
fn record(
    results: &mut Vec<TestCaseResult>,
    submission: &mut Submission,
    test_number: usize,
    passed: bool,
    actual_output: String,
    case: &TestCase,
    result: &ExecutionResult,
) {
    let (actual_output, expected_output) = if case.is_hidden {
        (HIDDEN_PLACEHOLDER.to_string(), HIDDEN_PLACEHOLDER.to_string())
    } else {
        submission.output = Some(actual_output.clone());
        (actual_output, case.expected_output.clone())
    };
    results.push(TestCaseResult {
        test_number,
        passed,
        actual_output,
        expected_output,
        execution_time_seconds: result.elapsed_ms as f64 / 1000.0,
        hidden: case.is_hidden,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::ExecutorMode;
    use crate::config::presets;
    use crate::judge::repository::InMemoryRepository;
    use std::sync::Mutex;

    /// Replays canned results and counts calls
    struct Scripted {
        results: Mutex<Vec<ExecutionResult>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(mut results: Vec<ExecutionResult>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(0),
            }
        }
    }

    impl ExecutionBackend for Scripted {
        fn kind(&self) -> ExecutorMode {
            ExecutorMode::Local
        }

        fn execute(&self, _request: &ExecutionRequest) -> ExecutionResult {
            *self.calls.lock().unwrap() += 1;
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| ExecutionResult::internal_error("script exhausted"))
        }
    }

    fn case(input: &str, expected: &str, order_index: i32) -> TestCase {
        TestCase {
            input: input.to_string(),
            expected_output: expected.to_string(),
            is_hidden: false,
            order_index,
        }
    }

    fn service(backend: Arc<Scripted>, cases: Vec<TestCase>) -> (JudgeService, Arc<InMemoryRepository>) {
        let repository = Arc::new(InMemoryRepository::new());
        repository
            .insert_problem(
                Problem {
                    id: 1,
                    title: "Sum".to_string(),
                    time_limit_ms: 1000,
                    memory_limit_kb: 65_536,
                },
                cases,
            )
            .unwrap();
        let languages = Arc::new(LanguageTable::new(presets::default_languages()).unwrap());
        let service = JudgeService::new(backend, languages, repository.clone());
        (service, repository)
    }

    fn ok(stdout: &str, elapsed_ms: u64) -> ExecutionResult {
        ExecutionResult::success(stdout.to_string(), String::new(), elapsed_ms)
    }

    #[test]
    fn test_wrong_answer_stops_the_run() {
        let backend = Arc::new(Scripted::new(vec![ok("8", 10), ok("7", 20), ok("1", 5)]));
        let (service, _) = service(
            backend.clone(),
            vec![case("3 5", "8", 0), case("4 4", "9", 1), case("0 1", "1", 2)],
        );

        let report = service.submit_code(1, presets::PYTHON3, "print(8)").unwrap();
        assert_eq!(report.verdict, Verdict::WrongAnswer);
        assert_eq!(*backend.calls.lock().unwrap(), 2);
        assert_eq!(report.test_case_results.len(), 2);
        assert!(report.test_case_results[0].passed);
        assert!(!report.test_case_results[1].passed);
        assert_eq!(report.output.as_deref(), Some("7"));
        assert_eq!(report.execution_time_seconds, 0.02);
    }

    #[test]
    fn test_runs_in_order_index_order() {
        let backend = Arc::new(Scripted::new(vec![ok("first", 1), ok("second", 1)]));
        let (service, _) = service(
            backend,
            vec![case("b", "second", 5), case("a", "first", 2)],
        );
        let report = service.submit_code(1, presets::PYTHON3, "x").unwrap();
        assert_eq!(report.verdict, Verdict::Accepted);
        assert_eq!(report.test_case_results[0].expected_output, "first");
    }

    #[test]
    fn test_runtime_error_records_stderr() {
        let backend = Arc::new(Scripted::new(vec![ExecutionResult::runtime_error(
            "ZeroDivisionError".to_string(),
            Some(1),
            15,
        )]));
        let (service, _) = service(backend, vec![case("1", "1", 0)]);
        let report = service.submit_code(1, presets::PYTHON3, "1/0").unwrap();
        assert_eq!(report.verdict, Verdict::RuntimeError);
        assert_eq!(report.error_message.as_deref(), Some("ZeroDivisionError"));
        assert_eq!(report.test_case_results[0].actual_output, "ZeroDivisionError");
    }

    #[test]
    fn test_hidden_runtime_error_is_redacted() {
        let backend = Arc::new(Scripted::new(vec![
            ok("2", 1),
            ExecutionResult::runtime_error("SECRET-4711\n".to_string(), Some(1), 3),
        ]));
        let mut hidden = case("SECRET-4711", "4711", 1);
        hidden.is_hidden = true;
        let (service, repository) = service(backend, vec![case("1 1", "2", 0), hidden]);

        let report = service.submit_code(1, presets::PYTHON3, "x").unwrap();
        assert_eq!(report.verdict, Verdict::RuntimeError);
        assert_eq!(
            report.error_message.as_deref(),
            Some("Runtime error on hidden test case 2")
        );
        assert!(!serde_json::to_string(&report).unwrap().contains("SECRET"));

        let stored = repository.submissions().unwrap();
        assert_eq!(stored[0].error_message, report.error_message);
    }

    #[test]
    fn test_internal_error_adds_no_entry() {
        let backend = Arc::new(Scripted::new(vec![ExecutionResult::internal_error(
            "Execution failed: could not prepare workspace",
        )]));
        let (service, repository) = service(backend, vec![case("1", "1", 0)]);
        let report = service.submit_code(1, presets::PYTHON3, "x").unwrap();
        assert_eq!(report.verdict, Verdict::InternalError);
        assert!(report.test_case_results.is_empty());
        assert_eq!(repository.submissions().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_test_list_is_internal_error() {
        let backend = Arc::new(Scripted::new(Vec::new()));
        let (service, _) = service(backend.clone(), Vec::new());
        let report = service.submit_code(1, presets::PYTHON3, "x").unwrap();
        assert_eq!(report.verdict, Verdict::InternalError);
        assert_eq!(
            report.error_message.as_deref(),
            Some("No test cases found for this problem")
        );
        assert_eq!(*backend.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_unknown_problem_is_an_error() {
        let backend = Arc::new(Scripted::new(Vec::new()));
        let (service, repository) = service(backend, vec![case("1", "1", 0)]);
        let err = service.submit_code(99, presets::PYTHON3, "x").unwrap_err();
        assert!(matches!(err, JudgeError::ProblemNotFound(99)));
        assert!(repository.submissions().unwrap().is_empty());
    }
}
