//! Data models for parallel API test orchestration
//!
//! This module contains all data structures used throughout the application.

mod job;
mod job_result;

pub use job::{create_jobs, Job, JobState, JobTarget, PartitionStrategy};
pub use job_result::JobResult;
