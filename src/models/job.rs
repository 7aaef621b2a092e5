//! Job models for parallel test execution
//!
//! Defines jobs, partition strategies, and the job lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to partition a test suite into jobs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionStrategy {
    /// One job per API context (a directory of spec files)
    Context,
    /// One job per test tag
    Tag,
    /// One job per individual spec file
    Spec,
}

impl PartitionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionStrategy::Context => "context",
            PartitionStrategy::Tag => "tag",
            PartitionStrategy::Spec => "spec",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<PartitionStrategy> {
        match s.to_lowercase().as_str() {
            "context" => Some(PartitionStrategy::Context),
            "tag" => Some(PartitionStrategy::Tag),
            "spec" => Some(PartitionStrategy::Spec),
            _ => None,
        }
    }

    /// Get all partition strategies
    pub fn all() -> Vec<PartitionStrategy> {
        vec![
            PartitionStrategy::Context,
            PartitionStrategy::Tag,
            PartitionStrategy::Spec,
        ]
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Selection criterion for one job. The variants are mutually exclusive;
/// a job targets exactly one of a context, a tag, or a spec path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobTarget {
    Context(String),
    Tag(String),
    Spec(String),
}

impl JobTarget {
    pub fn strategy(&self) -> PartitionStrategy {
        match self {
            JobTarget::Context(_) => PartitionStrategy::Context,
            JobTarget::Tag(_) => PartitionStrategy::Tag,
            JobTarget::Spec(_) => PartitionStrategy::Spec,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            JobTarget::Context(v) | JobTarget::Tag(v) | JobTarget::Spec(v) => v,
        }
    }
}

impl fmt::Display for JobTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy(), self.value())
    }
}

/// A unit of work: one invocation of the external test runner.
///
/// Created once per run when the suite is partitioned; immutable thereafter
/// and consumed by exactly one worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    /// Deterministic id, stable across reruns: `{strategy}_{index}_{target}`
    pub id: String,

    /// Human-readable label
    pub name: String,

    /// Selection criterion
    pub target: JobTarget,

    /// Derived arguments for the test runner binary
    pub command: Vec<String>,
}

impl Job {
    /// Directory name for this job's report artifacts.
    ///
    /// Spec paths can contain separators, so the id is flattened before it
    /// becomes a path component.
    pub fn artifact_dir_name(&self) -> String {
        let sanitized: String = self
            .id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("job_{sanitized}")
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

/// Create one job per target for the given partition strategy.
///
/// Job ids are deterministic across reruns so log lines and report artifacts
/// can be correlated between runs. An empty target list produces zero jobs.
pub fn create_jobs(strategy: PartitionStrategy, targets: &[String]) -> Vec<Job> {
    targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            let job_target = match strategy {
                PartitionStrategy::Context => JobTarget::Context(target.clone()),
                PartitionStrategy::Tag => JobTarget::Tag(target.clone()),
                PartitionStrategy::Spec => JobTarget::Spec(target.clone()),
            };

            Job {
                id: format!("{strategy}_{index}_{target}"),
                name: job_target.to_string(),
                command: runner_args(&job_target),
                target: job_target,
            }
        })
        .collect()
}

/// Derive the runner's selection arguments for a target
fn runner_args(target: &JobTarget) -> Vec<String> {
    match target {
        JobTarget::Context(ctx) => vec![
            "--spec".to_string(),
            format!("cypress/e2e/{ctx}/**/*.cy.js"),
        ],
        JobTarget::Tag(tag) => vec!["--env".to_string(), format!("grepTags={tag}")],
        JobTarget::Spec(path) => vec!["--spec".to_string(), path.clone()],
    }
}

/// Job lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl JobState {
    /// Terminal states never transition; re-execution means a new job
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::TimedOut
        )
    }

    /// Check whether a transition is legal
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
                | (JobState::Running, JobState::TimedOut)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "PENDING"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_roundtrip() {
        assert_eq!(
            PartitionStrategy::from_str("context"),
            Some(PartitionStrategy::Context)
        );
        assert_eq!(
            PartitionStrategy::from_str("TAG"),
            Some(PartitionStrategy::Tag)
        );
        assert_eq!(PartitionStrategy::from_str("unknown"), None);
        assert_eq!(PartitionStrategy::all().len(), 3);
    }

    #[test]
    fn test_create_jobs_deterministic_ids() {
        let targets = vec!["accounts".to_string(), "domains".to_string()];
        let jobs = create_jobs(PartitionStrategy::Context, &targets);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "context_0_accounts");
        assert_eq!(jobs[1].id, "context_1_domains");

        // Same inputs produce the same ids
        let again = create_jobs(PartitionStrategy::Context, &targets);
        assert_eq!(jobs[0].id, again[0].id);
        assert_eq!(jobs[1].id, again[1].id);
    }

    #[test]
    fn test_create_jobs_empty_targets() {
        let jobs = create_jobs(PartitionStrategy::Tag, &[]);
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_runner_args_per_strategy() {
        let jobs = create_jobs(PartitionStrategy::Tag, &["smoke".to_string()]);
        assert_eq!(jobs[0].command, vec!["--env", "grepTags=smoke"]);

        let jobs = create_jobs(
            PartitionStrategy::Spec,
            &["cypress/e2e/purge/purge.cy.js".to_string()],
        );
        assert_eq!(
            jobs[0].command,
            vec!["--spec", "cypress/e2e/purge/purge.cy.js"]
        );
    }

    #[test]
    fn test_artifact_dir_name_sanitized() {
        let jobs = create_jobs(
            PartitionStrategy::Spec,
            &["cypress/e2e/waf.cy.js".to_string()],
        );
        let dir = jobs[0].artifact_dir_name();
        assert!(dir.starts_with("job_"));
        assert!(!dir.contains('/'));
        assert!(!dir.contains('.'));
    }

    #[test]
    fn test_state_machine_transitions() {
        assert!(JobState::Pending.can_transition_to(JobState::Running));
        assert!(JobState::Running.can_transition_to(JobState::Completed));
        assert!(JobState::Running.can_transition_to(JobState::TimedOut));

        // No way back to pending, and terminal states are final
        assert!(!JobState::Running.can_transition_to(JobState::Pending));
        assert!(!JobState::Completed.can_transition_to(JobState::Running));
        assert!(!JobState::TimedOut.can_transition_to(JobState::Pending));
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Pending.is_terminal());
    }
}
