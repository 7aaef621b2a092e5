//! apitest-runner - Parallel API Test Orchestration Tool
//!
//! A CLI tool that partitions an API test suite into independent jobs,
//! runs them as parallel subprocesses with bounded concurrency, and
//! aggregates per-job JSON summaries into a single report.
//!
//! ## Usage
//!
//! ```bash
//! # Run suites for two contexts on 4 workers
//! apitest-runner run --strategy context --target accounts --target domains --max-workers 4
//!
//! # Run by grep tag
//! apitest-runner run --strategy tag --target smoke
//!
//! # Issue a single request through the retry layer
//! apitest-runner request GET /accounts/{accountId}/domains
//!
//! # Show the latest aggregate report
//! apitest-runner report
//!
//! # List partition strategies
//! apitest-runner list --strategies
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod executor;
mod http;
mod models;
mod output;
mod results;
mod utils;

use cli::Args;
use config::{AppConfig, ConfigFile, EnvConfig, RequestSettings};
use executor::{ParallelRunner, ProcessWorker, WorkerConfig};
use http::{HttpClient, HttpRequest, RequestExecutor, RetryPolicy};
use models::{create_jobs, PartitionStrategy};
use output::{OutputFormat, ReportFormatter};
use results::{generate_report, ReportStorage};
use utils::{init_logger, LogLevel, Timer};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_config = EnvConfig::load();
    let verbose = args.verbose || env_config.verbose.unwrap_or(false);
    init_logger(if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match args.command {
        cli::Command::Run(run_args) => {
            run_jobs(run_args, &env_config, verbose).await?;
        }
        cli::Command::Request(request_args) => {
            run_request(request_args, &env_config).await?;
        }
        cli::Command::Report(report_args) => {
            show_report(report_args, &env_config)?;
        }
        cli::Command::List(list_args) => {
            list_strategies(list_args);
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
    }

    Ok(())
}

/// Load the config file (explicit path from the environment, discovered
/// location, or built-in defaults) and layer environment overrides on top.
fn effective_app_config(env_config: &EnvConfig) -> Result<AppConfig> {
    let file = match &env_config.config_file {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let mut app = file.app;
    if let Some(max_workers) = env_config.max_workers {
        app.max_workers = max_workers;
    }
    if let Some(timeout) = env_config.timeout {
        app.job_timeout_secs = timeout;
    }
    if let Some(output_dir) = &env_config.output_dir {
        app.output_dir = output_dir.clone();
    }
    if let Some(runner_bin) = &env_config.runner_bin {
        app.runner_bin = runner_bin.clone();
    }
    if let Some(format) = &env_config.format {
        app.format = format.clone();
    }
    Ok(app)
}

fn effective_request_settings(env_config: &EnvConfig) -> Result<RequestSettings> {
    let file = match &env_config.config_file {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let mut request = file.request;
    if let Some(base_url) = &env_config.base_url {
        request.base_url = Some(base_url.clone());
    }
    if let Some(retries) = env_config.retries {
        request.retries = retries;
    }
    if let Some(retry_delay_ms) = env_config.retry_delay_ms {
        request.retry_delay_ms = retry_delay_ms;
    }
    if let Some(account_id) = &env_config.account_id {
        request.account_id = Some(account_id.clone());
    }
    if let Some(client_id) = &env_config.client_id {
        request.client_id = Some(client_id.clone());
    }
    if let Some(environment) = &env_config.environment {
        request.environment = Some(environment.clone());
    }
    Ok(request)
}

/// An explicit CLI flag always wins over the environment; with neither set,
/// partition by context.
fn resolve_strategy(cli: Option<String>, env: Option<String>) -> String {
    cli.or(env).unwrap_or_else(|| "context".to_string())
}

async fn run_jobs(args: cli::RunArgs, env_config: &EnvConfig, verbose: bool) -> Result<()> {
    let mut app = effective_app_config(env_config)?;

    // CLI flags win over environment and config file
    if let Some(max_workers) = args.max_workers {
        app.max_workers = max_workers;
    }
    if let Some(timeout) = args.timeout {
        app.job_timeout_secs = timeout;
    }
    if let Some(output_dir) = args.output_dir {
        app.output_dir = output_dir;
    }
    if let Some(runner_bin) = args.runner_bin {
        app.runner_bin = runner_bin;
    }
    if let Some(format) = args.format {
        app.format = format;
    }

    let strategy_name = resolve_strategy(args.strategy, env_config.strategy.clone());
    let strategy = PartitionStrategy::from_str(&strategy_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown partition strategy: {strategy_name}"))?;

    if args.targets.is_empty() {
        anyhow::bail!("No targets given. Use --target at least once.");
    }

    let jobs = create_jobs(strategy, &args.targets);

    info!(
        "Partitioned {} target(s) into {} job(s) using '{}' strategy",
        args.targets.len(),
        jobs.len(),
        strategy.as_str()
    );

    let worker_config = WorkerConfig::new(&app.output_dir)
        .runner_bin(&app.runner_bin)
        .timeout(Duration::from_secs(app.job_timeout_secs))
        .verbose(verbose);
    let worker = ProcessWorker::new(worker_config);

    let runner = ParallelRunner::new(app.max_workers);
    let timer = Timer::start("parallel execution");
    let job_results = runner.execute(jobs, &worker).await?;
    timer.stop();

    let report = generate_report(&job_results);

    let format = OutputFormat::from_str(&app.format).unwrap_or(OutputFormat::Table);
    let formatter = ReportFormatter::new(format);
    println!("{}", formatter.format_report(&report));

    let storage = ReportStorage::new(&app.output_dir);
    match storage.save(&report) {
        Ok(path) => println!("✓ Report saved to: {}", path.display()),
        Err(e) => println!("✗ Failed to save report: {e}"),
    }

    if !report.all_succeeded() {
        std::process::exit(1);
    }

    Ok(())
}

async fn run_request(args: cli::RequestArgs, env_config: &EnvConfig) -> Result<()> {
    let mut settings = effective_request_settings(env_config)?;

    if let Some(base_url) = args.base_url {
        settings.base_url = Some(base_url);
    }
    if let Some(retries) = args.retries {
        settings.retries = retries;
    }
    if let Some(retry_delay_ms) = args.retry_delay_ms {
        settings.retry_delay_ms = retry_delay_ms;
    }
    if let Some(timeout) = args.timeout {
        settings.timeout_secs = timeout;
    }

    if !http::is_valid_endpoint(&args.endpoint) {
        anyhow::bail!("Invalid endpoint template: {}", args.endpoint);
    }

    let url = settings
        .url_builder()
        .build(&args.endpoint, &BTreeMap::new(), &[]);

    let mut client = HttpClient::with_timeout(settings.timeout_secs)?;
    if let Some(base_url) = &settings.base_url {
        client = client.base_url(base_url);
    }
    if let Some(token) = &env_config.token {
        client = client.default_header("Authorization", format!("Bearer {token}"))?;
    }

    let mut policy = RetryPolicy::new()
        .retries(settings.retries)
        .retry_delay(Duration::from_millis(settings.retry_delay_ms));
    if !args.expected_statuses.is_empty() {
        policy = policy.expect_statuses(args.expected_statuses);
    }

    let executor = RequestExecutor::new(client, policy);

    let mut request = HttpRequest::new(&args.method, &url);
    if let Some(body) = args.body {
        request = request
            .header("Content-Type", "application/json")
            .body(body);
    }

    info!("{} {}", args.method.to_uppercase(), url);

    let response = executor.execute(request).await?;

    let symbol = if response.is_success() { "✓" } else { "✗" };
    println!(
        "{} {} ({} ms)",
        symbol, response.status_code, response.duration_ms
    );
    if !response.body.is_empty() {
        // Pretty-print JSON bodies, pass anything else through as-is
        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(_) => println!("{}", response.body),
        }
    }

    if !response.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

fn show_report(args: cli::ReportArgs, env_config: &EnvConfig) -> Result<()> {
    let app = effective_app_config(env_config)?;
    let output_dir = args.output_dir.unwrap_or(app.output_dir);

    let storage = ReportStorage::new(&output_dir);
    let report = match storage.latest()? {
        Some(report) => report,
        None => {
            println!("\n📭 No stored reports found in {output_dir}.");
            println!("   Run jobs first: apitest-runner run --strategy context --target <name>");
            return Ok(());
        }
    };

    let format = OutputFormat::from_str(&args.format).unwrap_or(OutputFormat::Table);
    let formatter = ReportFormatter::new(format);
    println!("{}", formatter.format_report(&report));

    if let Some(export_path) = args.export {
        let path = std::path::PathBuf::from(&export_path);
        storage.export_csv(&report, &path)?;
        println!("✓ CSV exported to: {export_path}");
    }

    Ok(())
}

fn list_strategies(_args: cli::ListArgs) {
    println!("\nPartition Strategies\n");
    println!("──────────────────────────────────────────────────────────────────────");

    for strategy in PartitionStrategy::all() {
        let description = match strategy {
            PartitionStrategy::Context => "one job per API context directory",
            PartitionStrategy::Tag => "one job per grep tag",
            PartitionStrategy::Spec => "one job per spec file path",
        };
        println!("  {:10} - {}", strategy.as_str(), description);
    }

    println!("──────────────────────────────────────────────────────────────────────\n");
    println!("Example: apitest-runner run --strategy context --target accounts --target domains\n");
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    use std::path::Path;

    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            let config = ConfigFile::example();
            config.save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                let env_config = EnvConfig::load();
                env_config.print_summary();
            } else {
                let config = ConfigFile::load_default()?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file.unwrap_or_else(|| {
                ConfigFile::find()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| "./apitest-runner.yaml".to_string())
            });

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Set { key, value, file } => {
            let path = file.unwrap_or_else(|| "./apitest-runner.yaml".to_string());
            let mut config = if Path::new(&path).exists() {
                ConfigFile::load(&path)?
            } else {
                ConfigFile::new()
            };

            let value_display = value.clone();

            match key.as_str() {
                "app.max_workers" => config.app.max_workers = value.parse()?,
                "app.job_timeout_secs" => config.app.job_timeout_secs = value.parse()?,
                "app.output_dir" => config.app.output_dir = value,
                "app.runner_bin" => config.app.runner_bin = value,
                "app.format" => config.app.format = value,
                "request.base_url" => config.request.base_url = Some(value),
                "request.retries" => config.request.retries = value.parse()?,
                "request.retry_delay_ms" => config.request.retry_delay_ms = value.parse()?,
                "request.timeout_secs" => config.request.timeout_secs = value.parse()?,
                _ => {
                    anyhow::bail!("Unknown configuration key: {key}");
                }
            }

            config.validate()?;
            config.save(&path)?;
            println!("✓ Set {key} = {value_display} in {path}");
        }

        cli::ConfigAction::Get { key, file } => {
            let config = if let Some(path) = file {
                ConfigFile::load(&path)?
            } else {
                ConfigFile::load_default()?
            };

            let value = match key.as_str() {
                "app.max_workers" => config.app.max_workers.to_string(),
                "app.job_timeout_secs" => config.app.job_timeout_secs.to_string(),
                "app.output_dir" => config.app.output_dir.clone(),
                "app.runner_bin" => config.app.runner_bin.clone(),
                "app.format" => config.app.format.clone(),
                "request.base_url" => config.request.base_url.clone().unwrap_or_default(),
                "request.retries" => config.request.retries.to_string(),
                "request.retry_delay_ms" => config.request.retry_delay_ms.to_string(),
                "request.timeout_secs" => config.request.timeout_secs.to_string(),
                _ => {
                    anyhow::bail!("Unknown configuration key: {key}");
                }
            };

            println!("{value}");
        }

        cli::ConfigAction::Env => {
            config::env::print_env_help();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_strategy_wins_over_environment() {
        // An explicit --strategy context must not be overridden by the env
        let resolved = resolve_strategy(Some("context".to_string()), Some("tag".to_string()));
        assert_eq!(resolved, "context");

        let resolved = resolve_strategy(Some("spec".to_string()), Some("tag".to_string()));
        assert_eq!(resolved, "spec");
    }

    #[test]
    fn test_environment_strategy_used_when_flag_absent() {
        assert_eq!(resolve_strategy(None, Some("tag".to_string())), "tag");
        assert_eq!(resolve_strategy(None, None), "context");
    }
}
