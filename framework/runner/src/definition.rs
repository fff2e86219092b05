use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use bookwind_core::prelude::ConfigurationError;

use crate::cli::BookwindCli;
use crate::config::{RunConfig, Thresholds};
use crate::context::{RunnerContext, ScenarioContext, UserValuesConstraint};

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type ScenarioHook<RV> = fn(&mut ScenarioContext<RV>) -> HookResult;

/// The builder for a suite definition.
///
/// This must be used at the start of a suite binary to define the scenarios that you want to run.
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint> {
    /// The name of the suite.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// This value is initialised for you and you cannot change it.
    #[doc(hidden)]
    cli: BookwindCli,
    /// Thresholds the suite is judged against unless the CLI overrides them.
    default_thresholds: Thresholds,
    /// Environment variables to record in the run summary.
    capture_env: Vec<String>,
    /// Global setup hook for this suite. It will be run once, before any scenario runs.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// The scenarios, in the order they will run.
    scenarios: Vec<(String, ScenarioHook<RV>)>,
    /// Global teardown hook for this suite. It will be run once, after every scenario has run.
    ///
    /// This is best effort. A failure is logged and does not change the run result.
    teardown_fn: Option<GlobalHook<RV>>,
}

pub(crate) struct ScenarioDefinition<RV: UserValuesConstraint> {
    pub name: String,
    pub config: RunConfig,
    pub capture_env: Vec<String>,
    pub setup_fn: Option<GlobalHookMut<RV>>,
    pub scenarios: Vec<(String, ScenarioHook<RV>)>,
    pub teardown_fn: Option<GlobalHook<RV>>,
    pub no_progress: bool,
    pub summary_file: Option<PathBuf>,
}

impl<RV: UserValuesConstraint> ScenarioDefinitionBuilder<RV> {
    /// Create a suite definition from already parsed command line arguments.
    pub fn new(name: &str, cli: BookwindCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_thresholds: Thresholds::default(),
            capture_env: Vec::new(),
            setup_fn: None,
            scenarios: Vec::new(),
            teardown_fn: None,
        }
    }

    /// Initialise logging, parse the command line and create a suite definition.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, crate::init::init())
    }

    /// Set the thresholds this suite is judged against when the CLI does not override them.
    pub fn with_default_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.default_thresholds = thresholds;
        self
    }

    /// Record the value of the environment variable `key` in the run summary.
    pub fn add_capture_env(mut self, key: &str) -> Self {
        self.capture_env.push(key.to_string());
        self
    }

    /// Set the global setup hook [ScenarioDefinitionBuilder::setup_fn] for this suite.
    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    /// Add a named scenario. Scenarios run in the order they are added.
    pub fn use_scenario(mut self, name: &str, scenario: ScenarioHook<RV>) -> Self {
        if self.scenarios.iter().any(|(existing, _)| existing == name) {
            panic!("Scenario [{}] is already defined", name);
        }

        self.scenarios.push((name.to_string(), scenario));
        self
    }

    /// Set the global teardown hook [ScenarioDefinitionBuilder::teardown_fn] for this suite.
    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition<RV>> {
        let config = RunConfig::resolve(&self.cli.overrides(), self.default_thresholds)?;

        let mut scenarios = self.scenarios;
        if !self.cli.scenarios.is_empty() {
            let known = scenarios
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<HashSet<_>>();
            if let Some(unknown) = self
                .cli
                .scenarios
                .iter()
                .find(|requested| !known.contains(requested.as_str()))
            {
                return Err(ConfigurationError::new(format!(
                    "unknown scenario [{}], available: {}",
                    unknown,
                    scenarios
                        .iter()
                        .map(|(name, _)| name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
                .into());
            }

            scenarios.retain(|(name, _)| self.cli.scenarios.contains(name));
        }

        Ok(ScenarioDefinition {
            name: self.name,
            config,
            capture_env: self.capture_env,
            setup_fn: self.setup_fn,
            scenarios,
            teardown_fn: self.teardown_fn,
            no_progress: self.cli.no_progress,
            summary_file: self.cli.summary_file,
        })
    }
}
