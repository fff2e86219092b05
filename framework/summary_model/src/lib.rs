use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the suite that was run
    pub suite_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The base URL of the API under test
    pub base_url: String,
    /// The named environment the base URL was resolved from
    pub environment: String,
    /// One entry per scenario that ran, in execution order
    pub scenarios: Vec<ScenarioSummary>,
    /// Total number of checks evaluated across all scenarios
    pub total_checks: u64,
    /// Number of checks that failed
    pub error_count: u64,
    /// Number of HTTP requests made
    pub request_count: usize,
    /// Fraction of HTTP requests that got a status of 400 or above, or no response
    pub http_failure_rate: f64,
    /// 95th percentile request latency, if any request was made
    pub p95_latency_ms: Option<f64>,
    /// Whether the run met all of its thresholds
    pub passed: bool,
    /// Environment variables set for the run
    ///
    /// Only the ones that the runner or the suite is aware of.
    pub env: HashMap<String, String>,
    /// The version of Bookwind that produced this summary
    pub bookwind_version: String,
}

/// Result of a single scenario within a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSummary {
    pub name: String,
    pub passed: bool,
    pub total_checks: usize,
    pub failed_checks: Vec<String>,
    /// Informational observations, such as cache timing, that never affect `passed`
    pub advisories: Vec<String>,
}

impl RunSummary {
    /// Create a new run summary with no scenarios
    pub fn new(
        run_id: String,
        suite_name: String,
        started_at: i64,
        base_url: String,
        environment: String,
        bookwind_version: String,
    ) -> Self {
        Self {
            run_id,
            suite_name,
            started_at,
            base_url,
            environment,
            scenarios: Vec::new(),
            total_checks: 0,
            error_count: 0,
            request_count: 0,
            http_failure_rate: 0.0,
            p95_latency_ms: None,
            passed: false,
            env: HashMap::with_capacity(0),
            bookwind_version,
        }
    }

    /// Add an environment variable
    pub fn add_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint identifies the configuration the suite was run with, so that runs of the
    /// same suite against the same target can be compared. It uses the
    ///     - Suite name
    ///     - Base URL
    ///     - Scenario names
    ///     - Selected environment variables
    ///     - Bookwind version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.suite_name.as_bytes());
        Digest::update(&mut hasher, self.base_url.as_bytes());
        self.scenarios
            .iter()
            .map(|s| s.name.as_str())
            .sorted()
            .for_each(|name| Digest::update(&mut hasher, name.as_bytes()));
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.bookwind_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: PathBuf) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all("\n".as_bytes())?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: PathBuf) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(run_id: &str) -> RunSummary {
        let mut summary = RunSummary::new(
            run_id.to_string(),
            "book_system".to_string(),
            1_760_000_000,
            "http://localhost:8084/api".to_string(),
            "dev".to_string(),
            "0.1.0".to_string(),
        );
        summary.scenarios.push(ScenarioSummary {
            name: "testBookNotFoundScenario".to_string(),
            passed: true,
            total_checks: 1,
            failed_checks: vec![],
            advisories: vec![],
        });
        summary.add_env("BOOK_ISBN".to_string(), "9782826012092".to_string());
        summary
    }

    #[test]
    fn fingerprint_ignores_run_specific_fields() {
        let a = sample("a");
        let mut b = sample("b");
        b.started_at += 60;
        b.passed = true;

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_target() {
        let a = sample("a");
        let mut b = sample("a");
        b.base_url = "http://localhost:8085/api".to_string();

        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn append_then_load_all_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.jsonl");

        append_run_summary(&sample("first"), path.clone()).unwrap();
        append_run_summary(&sample("second"), path.clone()).unwrap();

        let runs = load_summary_runs(path).unwrap();
        assert_eq!(2, runs.len());
        assert_eq!("first", runs[0].run_id);
        assert_eq!(sample("second"), runs[1]);
    }
}
