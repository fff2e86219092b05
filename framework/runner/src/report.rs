use std::process::ExitCode;

use bookwind_summary_model::{RunSummary, ScenarioSummary};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::outcome::{RunMetrics, ScenarioOutcome, ThresholdVerdict};

/// The result of a whole run, as returned by [crate::prelude::run].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_id: String,
    pub suite_name: String,
    /// Unix timestamp in seconds.
    pub started_at: i64,
    pub base_url: String,
    pub environment: String,
    pub outcomes: Vec<ScenarioOutcome>,
    pub metrics: RunMetrics,
    pub verdict: ThresholdVerdict,
    pub request_count: usize,
    /// Set when the run was stopped by a shutdown signal before every scenario had run.
    pub interrupted: bool,
}

impl RunReport {
    /// An interrupted run never passes.
    pub fn passed(&self) -> bool {
        !self.interrupted && self.verdict.passed()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    pub fn outcome(&self, scenario_name: &str) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.name == scenario_name)
    }

    pub fn to_run_summary(&self, bookwind_version: &str) -> RunSummary {
        let mut summary = RunSummary::new(
            self.run_id.clone(),
            self.suite_name.clone(),
            self.started_at,
            self.base_url.clone(),
            self.environment.clone(),
            bookwind_version.to_string(),
        );
        summary.scenarios = self
            .outcomes
            .iter()
            .map(|outcome| ScenarioSummary {
                name: outcome.name.clone(),
                passed: outcome.overall_passed,
                total_checks: outcome.checks.len(),
                failed_checks: outcome.failed_checks().map(|c| c.name.clone()).collect(),
                advisories: outcome.advisories.clone(),
            })
            .collect();
        summary.total_checks = self.metrics.total_checks;
        summary.error_count = self.metrics.error_count;
        summary.request_count = self.request_count;
        summary.http_failure_rate = self.verdict.http_failure_rate;
        summary.p95_latency_ms = self.verdict.p95_latency_ms;
        summary.passed = self.passed();

        summary
    }

    pub(crate) fn check_rows(&self) -> Vec<CheckRow> {
        self.outcomes
            .iter()
            .flat_map(|outcome| {
                // A scenario that recorded nothing, such as an inconclusive cache probe, still
                // gets a row.
                if outcome.checks.is_empty() {
                    return vec![CheckRow {
                        scenario: outcome.name.clone(),
                        check: "-".to_string(),
                        result: "no checks".to_string(),
                        detail: outcome.advisories.join("; "),
                    }];
                }

                outcome
                    .checks
                    .iter()
                    .map(|check| CheckRow {
                        scenario: outcome.name.clone(),
                        check: check.name.clone(),
                        result: if check.passed { "pass" } else { "FAIL" }.to_string(),
                        detail: check.detail.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .collect()
    }

    pub fn print(&self) {
        println!("\nChecks for {} against {}", self.suite_name, self.base_url);
        let mut table = Table::new(self.check_rows());
        table.with(Style::modern());
        println!("{table}");

        let advisories = self
            .outcomes
            .iter()
            .flat_map(|o| o.advisories.iter().map(move |a| (o.name.as_str(), a)))
            .collect::<Vec<_>>();
        if !advisories.is_empty() {
            println!("\nAdvisories");
            for (scenario, advisory) in advisories {
                println!("  [{scenario}] {advisory}");
            }
        }

        let scenarios_passed = self.outcomes.iter().filter(|o| o.overall_passed).count();
        println!(
            "\nScenarios: {}/{} passed, checks: {} of {} failed, requests: {}",
            scenarios_passed,
            self.outcomes.len(),
            self.metrics.error_count,
            self.metrics.total_checks,
            self.request_count
        );

        let verdict = &self.verdict;
        println!(
            "  error rate          {:.3} <= {:.3}  {}",
            verdict.error_rate,
            verdict.max_error_rate,
            mark(verdict.error_rate_passed())
        );
        match verdict.p95_latency_ms {
            Some(p95) => println!(
                "  p95 latency         {:.2}ms <= {}ms  {}",
                p95,
                verdict.max_p95_latency_ms,
                mark(verdict.latency_passed())
            ),
            None => println!("  p95 latency         no requests  {}", mark(true)),
        }
        if let Some(max) = verdict.max_http_failure_rate {
            println!(
                "  http failure rate   {:.3} <= {:.3}  {}",
                verdict.http_failure_rate,
                max,
                mark(verdict.http_failure_rate_passed())
            );
        }
        if self.interrupted {
            println!("  run was interrupted before all scenarios completed");
        }

        println!("\n{}", if self.passed() { "PASSED" } else { "FAILED" });
    }
}

fn mark(passed: bool) -> &'static str {
    if passed {
        "ok"
    } else {
        "exceeded"
    }
}

#[derive(Debug, Tabled)]
pub(crate) struct CheckRow {
    pub scenario: String,
    pub check: String,
    pub result: String,
    pub detail: String,
}
