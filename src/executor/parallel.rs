//! Parallel job execution
//!
//! Fans jobs out across a bounded pool of workers, chunk by chunk, and
//! collects results as they complete.

use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::worker::Worker;
use crate::models::{Job, JobResult, JobState};

/// Fatal errors raised before any subprocess is spawned
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("at least one worker is required")]
    ZeroWorkers,

    #[error("duplicate job id: {0}")]
    DuplicateJobId(String),
}

/// Bounded parallel job runner.
///
/// Jobs run in consecutive chunks of `max_workers`; a chunk fully completes
/// before the next starts, so no more than `max_workers` subprocesses exist
/// at any instant. Failures are contained at the job boundary: one job's
/// failure never cancels its siblings.
pub struct ParallelRunner {
    max_workers: usize,
}

impl ParallelRunner {
    pub fn new(max_workers: usize) -> Self {
        Self { max_workers }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Execute all jobs and return one result per job.
    ///
    /// Results within a chunk arrive in completion order; chunks themselves
    /// are strictly ordered.
    pub async fn execute<W: Worker>(
        &self,
        jobs: Vec<Job>,
        worker: &W,
    ) -> Result<Vec<JobResult>, RunnerError> {
        if self.max_workers == 0 {
            return Err(RunnerError::ZeroWorkers);
        }

        let mut seen = HashSet::new();
        for job in &jobs {
            if !seen.insert(job.id.clone()) {
                return Err(RunnerError::DuplicateJobId(job.id.clone()));
            }
        }

        info!(
            "Executing {} job(s) with up to {} worker(s)",
            jobs.len(),
            self.max_workers
        );

        let start = Instant::now();
        let total_chunks = jobs.len().div_ceil(self.max_workers);
        let mut results = Vec::with_capacity(jobs.len());

        for (chunk_index, chunk) in jobs.chunks(self.max_workers).enumerate() {
            info!(
                "Chunk {}/{}: launching {} job(s)",
                chunk_index + 1,
                total_chunks,
                chunk.len()
            );

            let mut set = JoinSet::new();
            for job in chunk {
                let worker = worker.clone();
                let job = job.clone();
                let name = job.name.clone();
                set.spawn(async move {
                    let result = worker.run_job(job).await;
                    (name, result)
                });
            }

            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((name, result)) => {
                        // Every collected result must be a terminal state
                        // reachable from a running job
                        debug_assert!(result.state().is_terminal());
                        debug_assert!(JobState::Running.can_transition_to(result.state()));
                        info!(
                            "{} {:30} {:9} [{:.1}s]",
                            result.status_symbol(),
                            name,
                            result.state().to_string(),
                            result.duration_secs
                        );
                        results.push(result);
                    }
                    Err(e) => {
                        warn!("Worker task failed to join: {e}");
                    }
                }
            }
        }

        info!(
            "All jobs completed in {:.1}s - {}/{} succeeded",
            start.elapsed().as_secs_f64(),
            results.iter().filter(|r| r.success).count(),
            results.len()
        );

        Ok(results)
    }
}

impl Default for ParallelRunner {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
