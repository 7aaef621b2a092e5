//! Aggregate report generation
//!
//! Pure summarization over a collection of job results. Every rate is
//! recomputed from the result list at generation time so the report stays
//! internally consistent no matter what order results arrived in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::JobResult;

/// Duration extremes across the run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobTiming {
    pub job_id: String,
    pub duration_secs: f64,
}

/// Test count totals across all jobs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestSummary {
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    /// Percentage, 100 * passed / total
    pub success_rate: f64,
}

/// Summary over all job results in a run.
///
/// Derived entirely from the `JobResult` list; nothing here is cached or
/// incrementally updated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateReport {
    pub generated_at: DateTime<Utc>,
    pub total_jobs: usize,
    pub successful_jobs: usize,
    pub failed_jobs: usize,
    /// Percentage, 100 * successful / total
    pub job_success_rate: f64,
    pub test_summary: TestSummary,
    pub total_duration_secs: f64,
    pub fastest_job: Option<JobTiming>,
    pub slowest_job: Option<JobTiming>,
    pub results: Vec<JobResult>,
}

impl AggregateReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed_jobs == 0
    }
}

fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Build an aggregate report from job results.
///
/// Pure function: calling it twice on the same slice yields identical
/// output (modulo the generation timestamp). Fastest/slowest are found by
/// linear scan; job counts are in the tens to low hundreds.
pub fn generate_report(results: &[JobResult]) -> AggregateReport {
    let total_jobs = results.len();
    let successful_jobs = results.iter().filter(|r| r.success).count();
    let failed_jobs = total_jobs - successful_jobs;

    let total_tests: u64 = results.iter().map(|r| r.total_tests).sum();
    let passed_tests: u64 = results.iter().map(|r| r.passed_tests).sum();
    let failed_tests: u64 = results.iter().map(|r| r.failed_tests).sum();

    let total_duration_secs: f64 = results.iter().map(|r| r.duration_secs).sum();

    let fastest_job = results
        .iter()
        .min_by(|a, b| a.duration_secs.total_cmp(&b.duration_secs))
        .map(|r| JobTiming {
            job_id: r.job_id.clone(),
            duration_secs: r.duration_secs,
        });

    let slowest_job = results
        .iter()
        .max_by(|a, b| a.duration_secs.total_cmp(&b.duration_secs))
        .map(|r| JobTiming {
            job_id: r.job_id.clone(),
            duration_secs: r.duration_secs,
        });

    AggregateReport {
        generated_at: Utc::now(),
        total_jobs,
        successful_jobs,
        failed_jobs,
        job_success_rate: rate(successful_jobs as u64, total_jobs as u64),
        test_summary: TestSummary {
            total_tests,
            passed_tests,
            failed_tests,
            success_rate: rate(passed_tests, total_tests),
        },
        total_duration_secs,
        fastest_job,
        slowest_job,
        results: results.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<JobResult> {
        vec![
            JobResult::success("context_0_accounts", 10.0).with_counts(20, 20, 0),
            JobResult::success("context_1_domains", 4.0).with_counts(10, 9, 1),
            JobResult::failure("context_2_waf", 7.5, "exit 1").with_counts(10, 5, 5),
        ]
    }

    #[test]
    fn test_report_matches_hand_computed_rates() {
        let report = generate_report(&fixture());

        assert_eq!(report.total_jobs, 3);
        assert_eq!(report.successful_jobs, 2);
        assert_eq!(report.failed_jobs, 1);
        assert!((report.job_success_rate - 200.0 / 3.0).abs() < 1e-9);

        assert_eq!(report.test_summary.total_tests, 40);
        assert_eq!(report.test_summary.passed_tests, 34);
        assert_eq!(report.test_summary.success_rate, 100.0 * 34.0 / 40.0);
        assert_eq!(report.total_duration_secs, 21.5);
    }

    #[test]
    fn test_fastest_and_slowest_jobs() {
        let report = generate_report(&fixture());
        assert_eq!(report.fastest_job.unwrap().job_id, "context_1_domains");
        assert_eq!(report.slowest_job.unwrap().job_id, "context_0_accounts");
    }

    #[test]
    fn test_report_is_idempotent() {
        let results = fixture();
        let a = generate_report(&results);
        let b = generate_report(&results);

        assert_eq!(a.total_jobs, b.total_jobs);
        assert_eq!(a.job_success_rate, b.job_success_rate);
        assert_eq!(a.test_summary.success_rate, b.test_summary.success_rate);
        assert_eq!(a.total_duration_secs, b.total_duration_secs);
    }

    #[test]
    fn test_empty_results() {
        let report = generate_report(&[]);
        assert_eq!(report.total_jobs, 0);
        assert_eq!(report.job_success_rate, 0.0);
        assert_eq!(report.test_summary.success_rate, 0.0);
        assert!(report.fastest_job.is_none());
        assert!(report.slowest_job.is_none());
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_report_order_independent() {
        let mut results = fixture();
        let a = generate_report(&results);
        results.reverse();
        let b = generate_report(&results);

        assert_eq!(a.job_success_rate, b.job_success_rate);
        assert_eq!(a.test_summary.total_tests, b.test_summary.total_tests);
        assert_eq!(
            a.fastest_job.unwrap().job_id,
            b.fastest_job.unwrap().job_id
        );
    }
}
