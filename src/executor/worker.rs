//! Worker processes
//!
//! Runs one job as a subprocess of the external test runner and turns its
//! exit into a `JobResult`.

use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::models::{Job, JobResult};

/// Configuration for subprocess workers
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Test runner binary to invoke
    pub runner_bin: String,

    /// Base directory for per-job report artifacts
    pub output_dir: PathBuf,

    /// Per-job timeout; the process is killed when it elapses
    pub timeout: Duration,

    /// Stream subprocess output live instead of capturing it
    pub verbose: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            runner_bin: "cypress".to_string(),
            output_dir: PathBuf::from("apitest-results"),
            timeout: Duration::from_secs(300),
            verbose: false,
        }
    }
}

impl WorkerConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn runner_bin(mut self, bin: impl Into<String>) -> Self {
        self.runner_bin = bin.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Execution seam for the parallel runner.
///
/// The production implementation spawns subprocesses; tests inject a fake so
/// the chunking and aggregation logic runs without any real processes.
pub trait Worker: Clone + Send + Sync + 'static {
    fn run_job(&self, job: Job) -> impl Future<Output = JobResult> + Send;
}

/// Subprocess-backed worker
#[derive(Clone, Debug)]
pub struct ProcessWorker {
    config: WorkerConfig,
}

impl ProcessWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Full argument list for one job: the job's selection arguments plus a
    /// JSON reporter writing the summary artifact into the job's directory.
    fn build_args(&self, job: &Job, summary_path: &Path) -> Vec<String> {
        let mut args = vec!["run".to_string()];
        args.extend(job.command.iter().cloned());
        args.push("--reporter".to_string());
        args.push("json".to_string());
        args.push("--reporter-options".to_string());
        args.push(format!("output={}", summary_path.display()));
        args
    }
}

impl Worker for ProcessWorker {
    async fn run_job(&self, job: Job) -> JobResult {
        let job_dir = self.config.output_dir.join(job.artifact_dir_name());
        if let Err(e) = std::fs::create_dir_all(&job_dir) {
            return JobResult::failure(
                &job.id,
                0.0,
                format!("failed to create artifact dir {}: {e}", job_dir.display()),
            );
        }

        let summary_path = job_dir.join("summary.json");
        let args = self.build_args(&job, &summary_path);

        debug!("Spawning {} {}", self.config.runner_bin, args.join(" "));

        let mut cmd = Command::new(&self.config.runner_bin);
        cmd.args(&args);
        cmd.kill_on_drop(true);

        if self.config.verbose {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let start = Instant::now();

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return JobResult::failure(
                    &job.id,
                    0.0,
                    format!("failed to spawn {}: {e}", self.config.runner_bin),
                );
            }
        };

        let output = match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return JobResult::failure(
                    &job.id,
                    start.elapsed().as_secs_f64(),
                    format!("failed waiting for runner: {e}"),
                );
            }
            // Timeout drops the wait future; kill_on_drop reaps the child
            Err(_) => return JobResult::timeout(&job.id, self.config.timeout.as_secs()),
        };

        let duration_secs = start.elapsed().as_secs_f64();
        let counts = read_summary(&summary_path);

        let result = if output.status.success() {
            JobResult::success(&job.id, duration_secs)
        } else {
            let mut message = match output.status.code() {
                Some(code) => format!("runner exited with status {code}"),
                None => "runner killed by signal".to_string(),
            };
            if !self.config.verbose {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if let Some(line) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                    message.push_str(&format!(": {}", line.trim()));
                }
            }
            JobResult::failure(&job.id, duration_secs, message)
        };

        match counts {
            Some(stats) => result.with_counts(stats.tests, stats.passes, stats.failures),
            None => result,
        }
    }
}

/// Summary artifact the runner's JSON reporter writes
#[derive(Debug, Deserialize)]
struct RunnerSummary {
    stats: SummaryStats,
}

/// Pass/fail counts from the summary artifact
#[derive(Debug, Deserialize)]
pub struct SummaryStats {
    pub tests: u64,
    pub passes: u64,
    pub failures: u64,
}

/// Read the runner's summary artifact.
///
/// A missing or unparsable artifact is a soft failure: the counts fall back
/// to zero and a warning is logged, without failing the run.
pub fn read_summary(path: &Path) -> Option<SummaryStats> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Missing report artifact {}: {e}", path.display());
            return None;
        }
    };

    match serde_json::from_str::<RunnerSummary>(&content) {
        Ok(summary) => Some(summary.stats),
        Err(e) => {
            warn!("Unparsable report artifact {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{create_jobs, PartitionStrategy};

    #[test]
    fn test_build_args_includes_reporter() {
        let worker = ProcessWorker::new(WorkerConfig::new("/tmp/out"));
        let jobs = create_jobs(PartitionStrategy::Tag, &["smoke".to_string()]);
        let args = worker.build_args(&jobs[0], Path::new("/tmp/out/job_x/summary.json"));

        assert_eq!(args[0], "run");
        assert!(args.contains(&"--env".to_string()));
        assert!(args.contains(&"grepTags=smoke".to_string()));
        assert!(args.contains(&"--reporter".to_string()));
        assert!(args
            .iter()
            .any(|a| a == "output=/tmp/out/job_x/summary.json"));
    }

    #[test]
    fn test_read_summary_missing_file() {
        assert!(read_summary(Path::new("/nonexistent/summary.json")).is_none());
    }

    #[test]
    fn test_read_summary_parses_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        std::fs::write(&path, r#"{"stats":{"tests":12,"passes":10,"failures":2}}"#).unwrap();

        let stats = read_summary(&path).unwrap();
        assert_eq!(stats.tests, 12);
        assert_eq!(stats.passes, 10);
        assert_eq!(stats.failures, 2);
    }

    #[test]
    fn test_read_summary_unparsable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(read_summary(&path).is_none());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerConfig::new(dir.path()).runner_bin("/nonexistent/runner-binary");
        let worker = ProcessWorker::new(config);
        let jobs = create_jobs(PartitionStrategy::Tag, &["smoke".to_string()]);

        let result = worker.run_job(jobs[0].clone()).await;
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("failed to spawn"));
    }
}
