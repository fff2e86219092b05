mod check;
mod cli;
mod config;
mod context;
mod definition;
mod executor;
mod init;
mod outcome;
mod probe;
mod progress;
mod report;
mod run;
mod shutdown;
mod types;

pub mod prelude {
    pub use crate::check::{expect, Check, CheckResult, IntoCheckOutcome};
    pub use crate::cli::BookwindCli;
    pub use crate::config::{ConfigOverrides, RunConfig, TargetEnvironment, Thresholds};
    pub use crate::context::UserValuesConstraint;
    pub use crate::context::{RunnerContext, ScenarioContext};
    pub use crate::definition::{HookResult, ScenarioDefinitionBuilder};
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::outcome::{RunMetrics, ScenarioOutcome, ThresholdVerdict};
    pub use crate::probe::{CacheProbe, ProbeVerdict, SpeedUp};
    pub use crate::report::RunReport;
    pub use crate::run::run;
    pub use crate::types::BookwindResult;
}
