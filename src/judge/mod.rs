//! Judging.
//!
//! The language table describes how each supported language is compiled and
//! run; the judge service drives a submission through a problem's test cases
//! and persists the verdict through the repository seam.

pub mod language;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod repository;

pub use model::{Problem, Submission, SubmissionReport, TestCase, TestCaseResult};
pub use orchestrator::JudgeService;
pub use registry::LanguageTable;
pub use repository::{InMemoryRepository, JudgeRepository, ProblemFile};
