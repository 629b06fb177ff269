/// Persistence seam consumed by the judge service
///
/// The service only needs three things from storage: the problem's limits,
/// its test cases, and a place to put the finished submission.
use crate::config::types::{JudgeError, ProblemId, Result};
use crate::judge::model::{Problem, Submission, SubmissionId, TestCase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub trait JudgeRepository: Send + Sync {
    fn problem(&self, id: ProblemId) -> Result<Option<Problem>>;

    /// Test cases of a problem, in any order
    fn test_cases(&self, problem_id: ProblemId) -> Result<Vec<TestCase>>;

    /// Store a finished submission and return it with its assigned id
    fn save_submission(&self, submission: Submission) -> Result<Submission>;
}

/// Problem plus its test cases, as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemFile {
    pub problem: Problem,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl ProblemFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            JudgeError::Repository(format!("Failed to read problem file {}: {}", path.display(), e))
        })?;
        let file: ProblemFile = serde_json::from_str(&content)?;
        if file.problem.time_limit_ms == 0 {
            return Err(JudgeError::Repository(format!(
                "Problem {} has a zero time limit",
                file.problem.id
            )));
        }
        Ok(file)
    }
}

#[derive(Default)]
struct Store {
    problems: HashMap<ProblemId, (Problem, Vec<TestCase>)>,
    submissions: Vec<Submission>,
    next_id: SubmissionId,
}

/// Mutex-guarded in-process store
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| JudgeError::Repository("repository lock poisoned".to_string()))
    }

    /// Add or replace a problem with its test cases
    pub fn insert_problem(&self, problem: Problem, test_cases: Vec<TestCase>) -> Result<()> {
        let mut store = self.store()?;
        store.problems.insert(problem.id, (problem, test_cases));
        Ok(())
    }

    pub fn insert_problem_file(&self, file: ProblemFile) -> Result<ProblemId> {
        let id = file.problem.id;
        self.insert_problem(file.problem, file.test_cases)?;
        Ok(id)
    }

    /// All stored submissions in save order
    pub fn submissions(&self) -> Result<Vec<Submission>> {
        Ok(self.store()?.submissions.clone())
    }

    pub fn submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        Ok(self
            .store()?
            .submissions
            .iter()
            .find(|s| s.id == Some(id))
            .cloned())
    }

    /// Submissions for one problem, newest first
    pub fn submissions_for_problem(&self, problem_id: ProblemId) -> Result<Vec<Submission>> {
        let store = self.store()?;
        let mut found: Vec<Submission> = store
            .submissions
            .iter()
            .filter(|s| s.problem_id == problem_id)
            .cloned()
            .collect();
        sort_newest_first(&mut found);
        Ok(found)
    }

    /// The `limit` most recent submissions across all problems
    pub fn recent(&self, limit: usize) -> Result<Vec<Submission>> {
        let mut all = self.submissions()?;
        sort_newest_first(&mut all);
        all.truncate(limit);
        Ok(all)
    }
}

// Later ids win timestamp ties
fn sort_newest_first(submissions: &mut [Submission]) {
    submissions.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl JudgeRepository for InMemoryRepository {
    fn problem(&self, id: ProblemId) -> Result<Option<Problem>> {
        Ok(self.store()?.problems.get(&id).map(|(p, _)| p.clone()))
    }

    fn test_cases(&self, problem_id: ProblemId) -> Result<Vec<TestCase>> {
        Ok(self
            .store()?
            .problems
            .get(&problem_id)
            .map(|(_, cases)| cases.clone())
            .unwrap_or_default())
    }

    fn save_submission(&self, mut submission: Submission) -> Result<Submission> {
        let mut store = self.store()?;
        store.next_id += 1;
        submission.id = Some(store.next_id);
        store.submissions.push(submission.clone());
        Ok(submission)
    }
}
