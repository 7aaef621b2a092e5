//! Job outcome models
//!
//! Defines the result of running one job and its test counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::job::JobState;

/// Error message prefix distinguishing a timeout from other failures
const TIMEOUT_MESSAGE_PREFIX: &str = "timed out after";

/// Outcome of running one job.
///
/// Created once when the worker process exits and never mutated afterwards.
/// `job_id` is a back-reference to the originating job, not ownership.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub success: bool,
    pub duration_secs: f64,
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub error_message: Option<String>,
}

impl JobResult {
    pub fn success(job_id: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            job_id: job_id.into(),
            success: true,
            duration_secs,
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            error_message: None,
        }
    }

    pub fn failure(
        job_id: impl Into<String>,
        duration_secs: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            success: false,
            duration_secs,
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            error_message: Some(message.into()),
        }
    }

    pub fn timeout(job_id: impl Into<String>, timeout_secs: u64) -> Self {
        Self::failure(
            job_id,
            timeout_secs as f64,
            format!("{TIMEOUT_MESSAGE_PREFIX} {timeout_secs}s"),
        )
    }

    /// Attach test counts parsed from the runner's summary artifact.
    ///
    /// Counts claiming more passes and failures than tests are discarded
    /// with a warning, like any other malformed artifact.
    pub fn with_counts(mut self, total: u64, passed: u64, failed: u64) -> Self {
        if passed.saturating_add(failed) > total {
            warn!(
                "Discarding inconsistent test counts for {}: {passed} passed + {failed} failed > {total} total",
                self.job_id
            );
            return self;
        }
        self.total_tests = total;
        self.passed_tests = passed;
        self.failed_tests = failed;
        self
    }

    /// Terminal state this result represents
    pub fn state(&self) -> JobState {
        if self.success {
            JobState::Completed
        } else if self
            .error_message
            .as_deref()
            .is_some_and(|m| m.starts_with(TIMEOUT_MESSAGE_PREFIX))
        {
            JobState::TimedOut
        } else {
            JobState::Failed
        }
    }

    pub fn status_symbol(&self) -> &'static str {
        if self.success {
            "✓"
        } else {
            "✗"
        }
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{:.1}s] {}/{} passed",
            self.status_symbol(),
            self.job_id,
            self.duration_secs,
            self.passed_tests,
            self.total_tests
        )?;
        if let Some(msg) = &self.error_message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result = JobResult::success("tag_0_smoke", 12.5).with_counts(10, 10, 0);
        assert!(result.success);
        assert!(result.error_message.is_none());
        assert_eq!(result.total_tests, 10);
        assert!(result.passed_tests + result.failed_tests <= result.total_tests);
    }

    #[test]
    fn test_failure_carries_message() {
        let result = JobResult::failure("tag_1_waf", 3.0, "exited with code 1");
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("exited with code 1"));
    }

    #[test]
    fn test_timeout_result() {
        let result = JobResult::timeout("spec_0_a", 300);
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("timed out"));
    }

    #[test]
    fn test_result_terminal_state() {
        assert_eq!(JobResult::success("a", 1.0).state(), JobState::Completed);
        assert_eq!(
            JobResult::failure("b", 1.0, "exit 1").state(),
            JobState::Failed
        );
        assert_eq!(JobResult::timeout("c", 300).state(), JobState::TimedOut);
    }

    #[test]
    fn test_inconsistent_counts_discarded() {
        let result = JobResult::success("tag_0_smoke", 1.0).with_counts(5, 4, 3);
        assert_eq!(result.total_tests, 0);
        assert_eq!(result.passed_tests, 0);
        assert_eq!(result.failed_tests, 0);

        // Consistent counts still land
        let result = JobResult::success("tag_0_smoke", 1.0).with_counts(5, 4, 1);
        assert_eq!(result.total_tests, 5);
    }
}
