//! Output formatters for job results and aggregate reports
//!
//! Provides Table, JSON, CSV, and summary output formats.

use crate::models::JobResult;
use crate::results::AggregateReport;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Report formatter
pub struct ReportFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format a single job result
    pub fn format_result(&self, result: &JobResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Csv => self.format_result_csv(result),
            _ => self.format_result_line(result),
        }
    }

    fn status_label(&self, success: bool) -> String {
        let plain = if success { "✓ PASS" } else { "✗ FAIL" };
        if !self.colorize {
            return plain.to_string();
        }
        if success {
            format!("\x1b[32m{plain}\x1b[0m")
        } else {
            format!("\x1b[31m{plain}\x1b[0m")
        }
    }

    fn format_result_line(&self, result: &JobResult) -> String {
        format!(
            "{:40} {} [{:>7.1}s] {:>4}/{:<4} tests",
            result.job_id,
            self.status_label(result.success),
            result.duration_secs,
            result.passed_tests,
            result.total_tests
        )
    }

    fn format_result_csv(&self, result: &JobResult) -> String {
        format!(
            "{},{},{:.3},{},{},{},\"{}\"",
            result.job_id,
            result.success,
            result.duration_secs,
            result.total_tests,
            result.passed_tests,
            result.failed_tests,
            result
                .error_message
                .as_deref()
                .unwrap_or("")
                .replace('"', "\"\"")
        )
    }

    /// Format the aggregate report
    pub fn format_report(&self, report: &AggregateReport) -> String {
        match self.format {
            OutputFormat::Table => self.format_report_table(report),
            OutputFormat::Json => serde_json::to_string(report).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Csv => self.format_report_csv(report),
            OutputFormat::Summary => self.format_report_brief(report),
        }
    }

    fn format_report_table(&self, report: &AggregateReport) -> String {
        let mut out = String::new();

        out.push_str("\n┌──────────────────────────────────────────────────────────────────────┐\n");
        out.push_str("│ Parallel Execution Report                                            │\n");
        out.push_str("├──────────────────────────────────────────────────────────────────────┤\n");

        for result in &report.results {
            let error = result
                .error_message
                .as_deref()
                .map(|m| format!(" - {m}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "│ {} {:40} {:>6.1}s {:>4}/{:<4}{error}\n",
                result.status_symbol(),
                result.job_id,
                result.duration_secs,
                result.passed_tests,
                result.total_tests
            ));
        }

        out.push_str("├──────────────────────────────────────────────────────────────────────┤\n");
        out.push_str(&format!(
            "│ Jobs: {} | Succeeded: {} | Failed: {} | Job Success: {:.1}%\n",
            report.total_jobs,
            report.successful_jobs,
            report.failed_jobs,
            report.job_success_rate
        ));
        out.push_str(&format!(
            "│ Tests: {} | Passed: {} | Failed: {} | Test Success: {:.1}%\n",
            report.test_summary.total_tests,
            report.test_summary.passed_tests,
            report.test_summary.failed_tests,
            report.test_summary.success_rate
        ));
        out.push_str(&format!(
            "│ Total Duration: {:.1}s\n",
            report.total_duration_secs
        ));

        if let Some(fastest) = &report.fastest_job {
            out.push_str(&format!(
                "│ Fastest: {} ({:.1}s)\n",
                fastest.job_id, fastest.duration_secs
            ));
        }
        if let Some(slowest) = &report.slowest_job {
            out.push_str(&format!(
                "│ Slowest: {} ({:.1}s)\n",
                slowest.job_id, slowest.duration_secs
            ));
        }

        out.push_str("└──────────────────────────────────────────────────────────────────────┘\n");
        out
    }

    fn format_report_csv(&self, report: &AggregateReport) -> String {
        let mut out = String::from(
            "job_id,success,duration_secs,total_tests,passed_tests,failed_tests,error\n",
        );
        for result in &report.results {
            out.push_str(&self.format_result_csv(result));
            out.push('\n');
        }
        out
    }

    fn format_report_brief(&self, report: &AggregateReport) -> String {
        format!(
            "{}/{} jobs succeeded ({:.1}%), {}/{} tests passed ({:.1}%) in {:.1}s",
            report.successful_jobs,
            report.total_jobs,
            report.job_success_rate,
            report.test_summary.passed_tests,
            report.test_summary.total_tests,
            report.test_summary.success_rate,
            report.total_duration_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::generate_report;

    fn fixture() -> AggregateReport {
        generate_report(&[
            JobResult::success("context_0_accounts", 10.0).with_counts(20, 20, 0),
            JobResult::failure("context_1_waf", 4.0, "exit 1").with_counts(10, 6, 4),
        ])
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("table"), Some(OutputFormat::Table));
        assert_eq!(
            OutputFormat::from_str("json-pretty"),
            Some(OutputFormat::JsonPretty)
        );
        assert_eq!(OutputFormat::from_str("nope"), None);
    }

    #[test]
    fn test_table_contains_totals() {
        let formatter = ReportFormatter::new(OutputFormat::Table).no_color();
        let table = formatter.format_report(&fixture());

        assert!(table.contains("context_0_accounts"));
        assert!(table.contains("Jobs: 2"));
        assert!(table.contains("Fastest: context_1_waf"));
        assert!(table.contains("Slowest: context_0_accounts"));
    }

    #[test]
    fn test_json_roundtrip() {
        let formatter = ReportFormatter::new(OutputFormat::Json);
        let json = formatter.format_report(&fixture());
        let parsed: AggregateReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.total_jobs, 2);
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let formatter = ReportFormatter::new(OutputFormat::Csv);
        let result = JobResult::failure("a", 1.0, "bad \"quote\"");
        let line = formatter.format_result(&result);
        assert!(line.contains("\"bad \"\"quote\"\"\""));
    }

    #[test]
    fn test_brief_summary() {
        let formatter = ReportFormatter::new(OutputFormat::Summary);
        let brief = formatter.format_report(&fixture());
        assert!(brief.contains("1/2 jobs succeeded"));
        assert!(brief.contains("26/30 tests passed"));
    }
}
