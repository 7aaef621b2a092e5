//! Configuration handling
//!
//! Typed configuration passed explicitly into each component; no ambient
//! global state. Precedence: CLI flags > environment variables > config
//! file > built-in defaults.

pub mod env;
mod file;

pub use env::EnvConfig;
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};

/// Application-level settings for the job runner
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upper bound on concurrently running jobs
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-job timeout in seconds
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,

    /// Directory for report artifacts and the aggregate report
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// External test runner binary
    #[serde(default = "default_runner_bin")]
    pub runner_bin: String,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_max_workers() -> usize {
    num_cpus::get()
}

fn default_job_timeout() -> u64 {
    300
}

fn default_output_dir() -> String {
    "apitest-results".to_string()
}

fn default_runner_bin() -> String {
    "cypress".to_string()
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            job_timeout_secs: default_job_timeout(),
            output_dir: default_output_dir(),
            runner_bin: default_runner_bin(),
            format: default_format(),
        }
    }
}

/// Settings for the retrying request executor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Base URL of the API under test
    #[serde(default)]
    pub base_url: Option<String>,

    /// Additional attempts after the first
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Account id used for `{accountId}` placeholders
    #[serde(default)]
    pub account_id: Option<String>,

    /// Client id used for `{clientId}` placeholders
    #[serde(default)]
    pub client_id: Option<String>,

    /// Environment name used for `{environment}` placeholders
    #[serde(default)]
    pub environment: Option<String>,
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_request_timeout(),
            account_id: None,
            client_id: None,
            environment: None,
        }
    }
}

impl RequestSettings {
    /// URL builder seeded with the allow-listed placeholder defaults
    pub fn url_builder(&self) -> crate::http::UrlBuilder {
        let mut builder = crate::http::UrlBuilder::new();
        if let Some(account_id) = &self.account_id {
            builder = builder.with_default("accountId", account_id);
        }
        if let Some(client_id) = &self.client_id {
            builder = builder.with_default("clientId", client_id);
        }
        if let Some(environment) = &self.environment {
            builder = builder.with_default("environment", environment);
        }
        builder
    }
}
