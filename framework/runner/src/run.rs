use std::sync::Arc;

use anyhow::Context;
use bookwind_core::prelude::ShutdownSignalError;
use bookwind_http_client::prelude::HttpClientInstrumented;
use bookwind_instruments::ReportConfig;
use bookwind_summary_model::append_run_summary;

use crate::progress::ScenarioProgress;
use crate::report::RunReport;
use crate::{
    context::{RunnerContext, ScenarioContext, UserValuesConstraint},
    definition::ScenarioDefinitionBuilder,
    executor::Executor,
    outcome::{RunMetrics, ThresholdVerdict},
    shutdown::start_shutdown_listener,
};

/// Environment variables the runner itself reads, recorded in every run summary when set.
const RUNNER_ENV: [&str; 2] = ["BASE_URL", "ENV"];

/// Run every scenario of a suite in order and judge the run against its thresholds.
///
/// Returns an error only when the run could not start: an invalid configuration or a failed setup
/// hook. Failed checks and aborted scenarios are part of the returned [RunReport].
pub fn run<RV: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<RV>,
) -> anyhow::Result<RunReport> {
    let definition = definition.build()?;
    let config = definition.config.clone();

    log::info!(
        "Running suite {} against {} ({})",
        definition.name,
        config.base_url(),
        config.environment()
    );

    let run_id = nanoid::nanoid!();
    let started_at = chrono::Utc::now().timestamp();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime)?;
    let reporter = Arc::new(ReportConfig::default().enable_summary().init());
    let client = {
        let _guard = runtime.enter();
        HttpClientInstrumented::new(
            reporter.clone(),
            config.request_timeout(),
            config.headers().to_vec(),
        )?
    };
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));
    let mut runner_context = RunnerContext::new(
        executor.clone(),
        client,
        config.clone(),
        shutdown_handle.clone(),
    );

    if let Some(setup_fn) = &definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    let runner_context = Arc::new(runner_context);

    // Between scenarios, to stop starting new ones once a shutdown is requested.
    let mut shutdown_listener = shutdown_handle.new_listener();
    let progress = ScenarioProgress::start(definition.scenarios.len(), !definition.no_progress);

    let mut metrics = RunMetrics::new();
    let mut outcomes = Vec::with_capacity(definition.scenarios.len());
    let mut interrupted = false;

    for (index, (name, scenario)) in definition.scenarios.iter().enumerate() {
        if shutdown_listener.should_shutdown() {
            log::info!("Shutdown requested, skipping remaining scenarios");
            interrupted = true;
            break;
        }

        progress.scenario_started(name);
        log::info!("Scenario {}", name);

        let mut context = ScenarioContext::new(runner_context.clone(), name.as_str());
        match scenario(&mut context) {
            Ok(()) => {}
            Err(e) => {
                if e.is::<ShutdownSignalError>() {
                    interrupted = true;
                }
                context.record_abort(&e);
            }
        }

        let outcome = context.into_outcome();
        metrics.record_outcome(&outcome);
        if outcome.overall_passed {
            log::info!("Scenario {} passed", outcome.name);
        } else {
            log::warn!(
                "Scenario {} failed {} of {} checks",
                outcome.name,
                outcome.failed_checks().count(),
                outcome.checks.len()
            );
        }
        outcomes.push(outcome);
        progress.scenario_finished();

        if interrupted {
            break;
        }

        if index + 1 < definition.scenarios.len() {
            if let Err(e) = executor.pause(config.pacing()) {
                log::debug!("Pacing interrupted: {e:?}");
                interrupted = e.is::<ShutdownSignalError>();
                if interrupted {
                    break;
                }
            }
        }
    }

    progress.finish();

    if let Some(teardown_fn) = definition.teardown_fn {
        // Don't crash the runner if the teardown fails. We still want the reporting to happen.
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {:?}", e);
        }
    }

    reporter.finalize();

    let totals = reporter.totals();
    let report = RunReport {
        run_id,
        suite_name: definition.name.clone(),
        started_at,
        base_url: config.base_url().to_string(),
        environment: config.environment().to_string(),
        outcomes,
        metrics,
        verdict: ThresholdVerdict::evaluate(&metrics, &totals, config.thresholds()),
        request_count: totals.total,
        interrupted,
    };
    report.print();

    if let Some(summary_file) = &definition.summary_file {
        let mut summary = report.to_run_summary(env!("CARGO_PKG_VERSION"));
        for key in RUNNER_ENV
            .iter()
            .copied()
            .chain(definition.capture_env.iter().map(String::as_str))
        {
            if let Ok(value) = std::env::var(key) {
                summary.add_env(key.to_string(), value);
            }
        }

        if let Err(e) = append_run_summary(&summary, summary_file.clone()) {
            log::error!(
                "Failed to write run summary to {}: {:?}",
                summary_file.display(),
                e
            );
        }
    }

    Ok(report)
}
