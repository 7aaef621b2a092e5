//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "APITEST";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Worker bound from APITEST_MAX_WORKERS
    pub max_workers: Option<usize>,
    /// Partition strategy from APITEST_STRATEGY
    pub strategy: Option<String>,
    /// Per-job timeout from APITEST_TIMEOUT
    pub timeout: Option<u64>,
    /// Output directory from APITEST_OUTPUT_DIR
    pub output_dir: Option<String>,
    /// Runner binary from APITEST_RUNNER_BIN
    pub runner_bin: Option<String>,
    /// Verbose from APITEST_VERBOSE
    pub verbose: Option<bool>,
    /// Output format from APITEST_FORMAT
    pub format: Option<String>,
    /// API base URL from APITEST_BASE_URL
    pub base_url: Option<String>,
    /// API token from APITEST_TOKEN
    pub token: Option<String>,
    /// Account id from APITEST_ACCOUNT_ID
    pub account_id: Option<String>,
    /// Client id from APITEST_CLIENT_ID
    pub client_id: Option<String>,
    /// Environment name from APITEST_ENVIRONMENT
    pub environment: Option<String>,
    /// Retries from APITEST_RETRIES
    pub retries: Option<u32>,
    /// Backoff base delay from APITEST_RETRY_DELAY_MS
    pub retry_delay_ms: Option<u64>,
    /// Config file from APITEST_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            max_workers: get_env_parse("MAX_WORKERS"),
            strategy: get_env("STRATEGY"),
            timeout: get_env_parse("TIMEOUT"),
            output_dir: get_env("OUTPUT_DIR"),
            runner_bin: get_env("RUNNER_BIN"),
            verbose: get_env_bool("VERBOSE"),
            format: get_env("FORMAT"),
            base_url: get_env("BASE_URL"),
            token: get_env("TOKEN"),
            account_id: get_env("ACCOUNT_ID"),
            client_id: get_env("CLIENT_ID"),
            environment: get_env("ENVIRONMENT"),
            retries: get_env_parse("RETRIES"),
            retry_delay_ms: get_env_parse("RETRY_DELAY_MS"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.max_workers.is_some()
            || self.strategy.is_some()
            || self.timeout.is_some()
            || self.output_dir.is_some()
            || self.runner_bin.is_some()
            || self.verbose.is_some()
            || self.format.is_some()
            || self.base_url.is_some()
            || self.token.is_some()
            || self.account_id.is_some()
            || self.client_id.is_some()
            || self.environment.is_some()
            || self.retries.is_some()
            || self.retry_delay_ms.is_some()
            || self.config_file.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_MAX_WORKERS:    {:?}", ENV_PREFIX, self.max_workers);
        println!("  {}_STRATEGY:       {:?}", ENV_PREFIX, self.strategy);
        println!("  {}_TIMEOUT:        {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_OUTPUT_DIR:     {:?}", ENV_PREFIX, self.output_dir);
        println!("  {}_RUNNER_BIN:     {:?}", ENV_PREFIX, self.runner_bin);
        println!("  {}_VERBOSE:        {:?}", ENV_PREFIX, self.verbose);
        println!("  {}_FORMAT:         {:?}", ENV_PREFIX, self.format);
        println!("  {}_BASE_URL:       {:?}", ENV_PREFIX, self.base_url);
        println!(
            "  {}_TOKEN:          {}",
            ENV_PREFIX,
            if self.token.is_some() { "<set>" } else { "None" }
        );
        println!("  {}_ACCOUNT_ID:     {:?}", ENV_PREFIX, self.account_id);
        println!("  {}_CLIENT_ID:      {:?}", ENV_PREFIX, self.client_id);
        println!("  {}_ENVIRONMENT:    {:?}", ENV_PREFIX, self.environment);
        println!("  {}_RETRIES:        {:?}", ENV_PREFIX, self.retries);
        println!("  {}_RETRY_DELAY_MS: {:?}", ENV_PREFIX, self.retry_delay_ms);
        println!("  {}_CONFIG:         {:?}", ENV_PREFIX, self.config_file);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set worker bound
    pub fn max_workers(mut self, n: usize) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_MAX_WORKERS"), n.to_string()));
        self
    }

    /// Set partition strategy
    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_STRATEGY"), strategy.into()));
        self
    }

    /// Set per-job timeout
    pub fn timeout(mut self, secs: u64) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_TIMEOUT"), secs.to_string()));
        self
    }

    /// Set base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_BASE_URL"), url.into()));
        self
    }

    /// Set account id
    pub fn account_id(mut self, id: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_ACCOUNT_ID"), id.into()));
        self
    }

    /// Set verbose
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_VERBOSE"), verbose.to_string()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

#[cfg(test)]
impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all APITEST environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_MAX_WORKERS     Upper bound on concurrent jobs");
    println!("  {ENV_PREFIX}_STRATEGY        Partition strategy (context, tag, spec)");
    println!("  {ENV_PREFIX}_TIMEOUT         Per-job timeout in seconds");
    println!("  {ENV_PREFIX}_OUTPUT_DIR      Directory for report artifacts");
    println!("  {ENV_PREFIX}_RUNNER_BIN      Test runner binary");
    println!("  {ENV_PREFIX}_VERBOSE         Stream subprocess output (true/false)");
    println!("  {ENV_PREFIX}_FORMAT          Output format (table, json, csv, summary)");
    println!("  {ENV_PREFIX}_BASE_URL        API base URL");
    println!("  {ENV_PREFIX}_TOKEN           API authorization token");
    println!("  {ENV_PREFIX}_ACCOUNT_ID      Default for {{accountId}} placeholders");
    println!("  {ENV_PREFIX}_CLIENT_ID       Default for {{clientId}} placeholders");
    println!("  {ENV_PREFIX}_ENVIRONMENT     Default for {{environment}} placeholders");
    println!("  {ENV_PREFIX}_RETRIES         Request retry bound");
    println!("  {ENV_PREFIX}_RETRY_DELAY_MS  Base backoff delay");
    println!("  {ENV_PREFIX}_CONFIG          Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_BASE_URL=https://api.example.com");
    println!("  export {ENV_PREFIX}_MAX_WORKERS=4");
    println!("  apitest-runner run --strategy context --target accounts --target domains");
}
