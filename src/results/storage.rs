//! Report persistence
//!
//! Writes aggregate reports as timestamped JSON files and reloads them for
//! the `report` subcommand.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::report::AggregateReport;

/// Filename prefix for persisted aggregate reports
const REPORT_PREFIX: &str = "parallel-execution-report-";

/// Report storage rooted at the run's output directory
pub struct ReportStorage {
    base_dir: PathBuf,
}

impl ReportStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Persist a report as `parallel-execution-report-<timestamp>.json`.
    ///
    /// A random suffix keeps two runs started within the same second from
    /// colliding.
    pub fn save(&self, report: &AggregateReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!("Failed to create report dir: {}", self.base_dir.display())
        })?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let suffix: u32 = rand::random::<u32>() % 10000;
        let path = self
            .base_dir
            .join(format!("{REPORT_PREFIX}{timestamp}_{suffix:04}.json"));

        let file = File::create(&path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report).context("Failed to write report")?;

        info!("Saved aggregate report to {}", path.display());
        Ok(path)
    }

    /// Load a report from a specific path
    pub fn load(&self, path: &Path) -> Result<AggregateReport> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open report: {}", path.display()))?;
        let reader = BufReader::new(file);
        let report =
            serde_json::from_reader(reader).context("Failed to parse aggregate report")?;
        debug!("Loaded aggregate report from {}", path.display());
        Ok(report)
    }

    /// List persisted report paths, newest first
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            let is_report = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(REPORT_PREFIX) && n.ends_with(".json"))
                .unwrap_or(false);
            if is_report {
                paths.push(path);
            }
        }

        // Timestamped names sort chronologically
        paths.sort();
        paths.reverse();
        Ok(paths)
    }

    /// Load the most recent report, if any
    pub fn latest(&self) -> Result<Option<AggregateReport>> {
        match self.list()?.first() {
            Some(path) => Ok(Some(self.load(path)?)),
            None => Ok(None),
        }
    }

    /// Export a report's per-job rows as CSV
    pub fn export_csv(&self, report: &AggregateReport, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

        writer.write_record([
            "job_id",
            "success",
            "duration_secs",
            "total_tests",
            "passed_tests",
            "failed_tests",
            "error",
        ])?;

        for result in &report.results {
            writer.write_record([
                result.job_id.clone(),
                result.success.to_string(),
                format!("{:.3}", result.duration_secs),
                result.total_tests.to_string(),
                result.passed_tests.to_string(),
                result.failed_tests.to_string(),
                result.error_message.clone().unwrap_or_default(),
            ])?;
        }

        writer.flush()?;
        info!("Exported report CSV to {}", path.display());
        Ok(())
    }
}
