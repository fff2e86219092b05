use std::time::Duration;

use bookwind_instruments::OperationTotals;

use crate::check::CheckResult;
use crate::config::Thresholds;

/// Everything recorded by one scenario. Built once the scenario has finished and never changed
/// after that.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub checks: Vec<CheckResult>,
    /// Informational messages, such as cache timing. These never affect `overall_passed`.
    pub advisories: Vec<String>,
    pub overall_passed: bool,
}

impl ScenarioOutcome {
    pub fn new(name: impl Into<String>, checks: Vec<CheckResult>, advisories: Vec<String>) -> Self {
        let overall_passed = checks.iter().all(|c| c.passed);
        Self {
            name: name.into(),
            checks,
            advisories,
            overall_passed,
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Check counters for a whole run. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMetrics {
    pub error_count: u64,
    pub total_checks: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, check: &CheckResult) {
        self.total_checks += 1;
        if !check.passed {
            self.error_count += 1;
        }
    }

    pub fn record_outcome(&mut self, outcome: &ScenarioOutcome) {
        for check in &outcome.checks {
            self.record(check);
        }
    }

    /// Fraction of checks that failed. Zero when no check ran.
    pub fn error_rate(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            self.error_count as f64 / self.total_checks as f64
        }
    }
}

/// The comparison of a finished run against its [Thresholds].
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdVerdict {
    pub error_rate: f64,
    pub max_error_rate: f64,
    pub p95_latency_ms: Option<f64>,
    pub max_p95_latency_ms: u64,
    pub http_failure_rate: f64,
    pub max_http_failure_rate: Option<f64>,
}

impl ThresholdVerdict {
    pub fn evaluate(metrics: &RunMetrics, totals: &OperationTotals, thresholds: &Thresholds) -> Self {
        Self::from_parts(metrics, totals.p95(), totals.failure_rate(), thresholds)
    }

    pub fn from_parts(
        metrics: &RunMetrics,
        p95: Option<Duration>,
        http_failure_rate: f64,
        thresholds: &Thresholds,
    ) -> Self {
        Self {
            error_rate: metrics.error_rate(),
            max_error_rate: thresholds.max_error_rate,
            p95_latency_ms: p95.map(|d| d.as_micros() as f64 / 1000.0),
            max_p95_latency_ms: thresholds.max_p95_latency_ms,
            http_failure_rate,
            max_http_failure_rate: thresholds.max_http_failure_rate,
        }
    }

    pub fn error_rate_passed(&self) -> bool {
        self.error_rate <= self.max_error_rate
    }

    /// Passes when no request was made.
    pub fn latency_passed(&self) -> bool {
        self.p95_latency_ms
            .map_or(true, |p95| p95 <= self.max_p95_latency_ms as f64)
    }

    pub fn http_failure_rate_passed(&self) -> bool {
        self.max_http_failure_rate
            .map_or(true, |max| self.http_failure_rate <= max)
    }

    pub fn passed(&self) -> bool {
        self.error_rate_passed() && self.latency_passed() && self.http_failure_rate_passed()
    }
}
