//! Report aggregation and persistence

mod report;
mod storage;

pub use report::{generate_report, AggregateReport, JobTiming, TestSummary};
pub use storage::ReportStorage;
