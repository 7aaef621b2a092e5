//! CLI argument parsing
//!
//! Defines the command-line interface using clap.

use clap::{Parser, Subcommand};

/// Parallel API test orchestration tool
#[derive(Parser, Debug)]
#[command(name = "apitest-runner")]
#[command(version = "0.1.0")]
#[command(about = "Run API test jobs in parallel and aggregate their reports")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Partition the suite into jobs and run them in parallel
    Run(RunArgs),

    /// Issue a single API request through the retry layer
    Request(RequestArgs),

    /// View the latest aggregate report
    Report(ReportArgs),

    /// List partition strategies
    List(ListArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Partition strategy (context, tag, spec; default: context)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Targets for the chosen strategy (repeatable)
    #[arg(short, long = "target")]
    pub targets: Vec<String>,

    /// Maximum concurrent jobs (default: CPU count)
    #[arg(short, long)]
    pub max_workers: Option<usize>,

    /// Per-job timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory for report artifacts
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Test runner binary to invoke
    #[arg(long)]
    pub runner_bin: Option<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,
}

/// Arguments for the request command
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Endpoint path template, e.g. /accounts/{accountId}/domains
    pub endpoint: String,

    /// JSON request body
    #[arg(short, long)]
    pub body: Option<String>,

    /// API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Retry bound for transient failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Base backoff delay in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Acceptable status codes (repeatable; default: any 2xx)
    #[arg(long = "expect")]
    pub expected_statuses: Vec<u16>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Directory containing persisted reports
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Export per-job rows as CSV to this path
    #[arg(short, long)]
    pub export: Option<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show partition strategies
    #[arg(short, long)]
    pub strategies: bool,
}

/// Arguments for config management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./apitest-runner.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show effective configuration
    Show {
        /// Show environment variable overrides instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// Path to validate (default: discovered location)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Set a configuration value
    Set {
        /// Key, e.g. app.max_workers
        key: String,

        /// Value
        value: String,

        /// Configuration file to modify
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Get a configuration value
    Get {
        /// Key, e.g. app.max_workers
        key: String,

        /// Configuration file to read
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Show environment variable help
    Env,
}
