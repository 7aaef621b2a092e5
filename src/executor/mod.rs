//! Job execution engine
//!
//! Provides the bounded parallel runner and the subprocess worker seam.

mod parallel;
mod worker;

pub use parallel::{ParallelRunner, RunnerError};
pub use worker::{read_summary, ProcessWorker, Worker, WorkerConfig};
