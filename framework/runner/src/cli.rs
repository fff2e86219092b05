use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::ConfigOverrides;

#[derive(Parser, Debug, Clone, Default)]
#[command(about, long_about = None)]
pub struct BookwindCli {
    /// Base URL of the API under test, for example `http://localhost:8084/api`.
    ///
    /// Takes precedence over `--env`.
    #[clap(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Named target environment, one of `dev`, `staging` or `prod`.
    ///
    /// An unrecognised name falls back to `dev` with a warning.
    #[clap(long = "env", env = "ENV")]
    pub target_env: Option<String>,

    /// Add a header to every request, in the format `name:value`. May be given multiple times.
    #[clap(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Highest fraction of failed checks, between 0 and 1, for the run to pass.
    #[clap(long)]
    pub max_error_rate: Option<f64>,

    /// Highest 95th percentile request latency, in milliseconds, for the run to pass.
    #[clap(long)]
    pub max_p95_ms: Option<u64>,

    /// Highest fraction of requests that may end with a status of 400 or above, between 0 and 1.
    #[clap(long)]
    pub max_http_failure_rate: Option<f64>,

    /// Per-request timeout in seconds. Defaults to 30.
    #[clap(long)]
    pub timeout_s: Option<u64>,

    /// Pause between scenarios in milliseconds. Defaults to 100.
    #[clap(long)]
    pub pacing_ms: Option<u64>,

    /// Only run the named scenario. May be given multiple times.
    #[clap(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Append a JSON summary of the run to this file.
    #[clap(long)]
    pub summary_file: Option<PathBuf>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}

impl BookwindCli {
    /// The configuration inputs given on the command line or through the environment.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            environment: self.target_env.clone(),
            headers: self.headers.clone(),
            max_p95_latency_ms: self.max_p95_ms,
            max_error_rate: self.max_error_rate,
            max_http_failure_rate: self.max_http_failure_rate,
            request_timeout: self.timeout_s.map(Duration::from_secs),
            pacing: self.pacing_ms.map(Duration::from_millis),
        }
    }
}

fn parse_header(s: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = s
        .split_once(':')
        .ok_or(anyhow::anyhow!("Header must be in the format `name:value`, got [{}]", s))?;

    Ok((name.trim().to_string(), value.trim().to_string()))
}
