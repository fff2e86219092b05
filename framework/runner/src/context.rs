use std::{fmt::Debug, sync::Arc, time::Duration};

use bookwind_core::prelude::ShutdownHandle;
use bookwind_http_client::prelude::{HttpClientInstrumented, HttpRequest, ResponseDescriptor};
use serde::Serialize;

use crate::check::{Check, CheckResult, IntoCheckOutcome};
use crate::config::RunConfig;
use crate::executor::Executor;
use crate::outcome::ScenarioOutcome;

pub trait UserValuesConstraint: Default + Debug + Send + Sync + 'static {}

/// State shared by every scenario of a run.
///
/// The setup hook gets mutable access to populate the suite's own values, after which the context
/// is frozen and shared.
#[derive(Debug)]
pub struct RunnerContext<RV: UserValuesConstraint> {
    executor: Arc<Executor>,
    client: HttpClientInstrumented,
    config: RunConfig,
    shutdown_handle: ShutdownHandle,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub(crate) fn new(
        executor: Arc<Executor>,
        client: HttpClientInstrumented,
        config: RunConfig,
        shutdown_handle: ShutdownHandle,
    ) -> Self {
        Self {
            executor,
            client,
            config,
            shutdown_handle,
            value: Default::default(),
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn client(&self) -> &HttpClientInstrumented {
        &self.client
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Stop the run after the current scenario. In-flight requests are cancelled.
    pub fn force_stop_run(&self) {
        self.shutdown_handle.shutdown();
    }

    pub fn get_mut(&mut self) -> &mut RV {
        &mut self.value
    }

    pub fn get(&self) -> &RV {
        &self.value
    }
}

/// Handed to each scenario hook. Collects the checks and advisories of that one scenario.
pub struct ScenarioContext<RV: UserValuesConstraint> {
    runner_context: Arc<RunnerContext<RV>>,
    scenario_name: String,
    checks: Vec<CheckResult>,
    advisories: Vec<String>,
}

impl<RV: UserValuesConstraint> ScenarioContext<RV> {
    pub(crate) fn new(runner_context: Arc<RunnerContext<RV>>, scenario_name: impl Into<String>) -> Self {
        Self {
            runner_context,
            scenario_name: scenario_name.into(),
            checks: Vec::new(),
            advisories: Vec::new(),
        }
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Shortcut for the suite's values on the [RunnerContext].
    pub fn get(&self) -> &RV {
        self.runner_context.get()
    }

    /// The full URL for `path` on the API under test.
    pub fn url(&self, path: &str) -> String {
        self.runner_context.config().url(path)
    }

    /// Send a request and wait for the response.
    ///
    /// Any HTTP status is a response. An `Err` here is a
    /// [TransportError](bookwind_core::prelude::TransportError) or a shutdown, and should be
    /// propagated with `?` so that the runner records the scenario as aborted.
    pub fn execute(&mut self, request: HttpRequest) -> anyhow::Result<ResponseDescriptor> {
        let client = self.runner_context.client().clone();
        self.runner_context
            .executor()
            .execute_in_place(async move { client.execute(request).await.map_err(anyhow::Error::from) })
    }

    pub fn http_get(&mut self, path: &str) -> anyhow::Result<ResponseDescriptor> {
        let url = self.url(path);
        self.execute(HttpRequest::get(url))
    }

    pub fn http_get_with_query(
        &mut self,
        path: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<ResponseDescriptor> {
        let url = self.runner_context.config().url_with_query(path, query);
        self.execute(HttpRequest::get(url))
    }

    pub fn http_post_json<T: Serialize + ?Sized>(
        &mut self,
        path: &str,
        payload: &T,
    ) -> anyhow::Result<ResponseDescriptor> {
        let request = HttpRequest::post(self.url(path)).with_json_body(payload)?;
        self.execute(request)
    }

    /// Record a check with a single predicate. Returns whether it passed.
    pub fn check<P, O>(&mut self, response: &ResponseDescriptor, name: &str, predicate: P) -> bool
    where
        P: Fn(&ResponseDescriptor) -> O,
        O: IntoCheckOutcome,
    {
        self.evaluate(response, Check::new(name).with(predicate))
    }

    /// Record a check made of several predicates. Returns whether it passed.
    pub fn evaluate(&mut self, response: &ResponseDescriptor, check: Check<'_>) -> bool {
        let result = check.evaluate(response);
        if !result.passed {
            log::error!(
                "[{}] check failed: {} ({})",
                self.scenario_name,
                result.name,
                result.detail.as_deref().unwrap_or("no detail")
            );
        }

        let passed = result.passed;
        self.checks.push(result);
        passed
    }

    /// Record an observation that is reported but never fails the scenario.
    pub fn advise(&mut self, level: log::Level, message: impl Into<String>) {
        let message = message.into();
        log::log!(level, "[{}] {}", self.scenario_name, message);
        self.advisories.push(message);
    }

    pub fn pause(&self, duration: Duration) -> anyhow::Result<()> {
        self.runner_context.executor().pause(duration)
    }

    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    pub fn advisories(&self) -> &[String] {
        &self.advisories
    }

    pub(crate) fn record_abort(&mut self, error: &anyhow::Error) {
        log::error!("[{}] scenario aborted: {:?}", self.scenario_name, error);
        self.checks
            .push(CheckResult::failed("scenario completed", error.to_string()));
    }

    pub(crate) fn into_outcome(self) -> ScenarioOutcome {
        ScenarioOutcome::new(self.scenario_name, self.checks, self.advisories)
    }
}
