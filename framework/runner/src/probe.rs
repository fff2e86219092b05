//! Infer from the outside whether repeated reads of an endpoint are served by a cache.
//!
//! The same GET is issued three times. Content and status must not change between calls, and
//! those are the only things checked. Latency is compared too, but only reported as an advisory
//! because timing in a shared environment is too noisy to fail on.

use std::time::Duration;

use bookwind_http_client::prelude::ResponseDescriptor;

use crate::check::{expect, Check};
use crate::context::{ScenarioContext, UserValuesConstraint};

/// Later calls faster than this fraction of the first call count as an improvement.
pub const DEFAULT_IMPROVEMENT_RATIO: f64 = 0.8;

/// Timing of one repeated call relative to the first call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedUp {
    /// 2 or 3.
    pub call: u8,
    pub first: Duration,
    pub later: Duration,
    /// `later / first`. Below 1.0 means the repeated call was faster.
    pub ratio: f64,
}

impl SpeedUp {
    pub fn measure(call: u8, first: Duration, later: Duration) -> Self {
        let ratio = if first.is_zero() {
            1.0
        } else {
            later.as_secs_f64() / first.as_secs_f64()
        };

        Self {
            call,
            first,
            later,
            ratio,
        }
    }

    pub fn is_improvement(&self, improvement_ratio: f64) -> bool {
        self.ratio < improvement_ratio
    }

    /// How much faster the repeated call was, rounded to a whole percentage.
    pub fn improvement_percent(&self) -> i64 {
        ((1.0 - self.ratio) * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeVerdict {
    /// The first call found nothing to cache. Not a failure.
    Inconclusive { status: u16 },
    /// The first call failed with something other than not-found. Recorded as a failed check.
    UnexpectedStatus { status: u16 },
    /// Repeated calls returned the same status and body as the first.
    Consistent { speedups: Vec<SpeedUp> },
    /// A repeated call changed status or content.
    Inconsistent { speedups: Vec<SpeedUp> },
}

/// A cache probe against one path of the API under test.
#[derive(Debug, Clone)]
pub struct CacheProbe {
    path: String,
    quiescence: Duration,
    improvement_ratio: f64,
}

impl CacheProbe {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            quiescence: Duration::from_millis(100),
            improvement_ratio: DEFAULT_IMPROVEMENT_RATIO,
        }
    }

    /// Delay before each repeated call, so an asynchronous cache write can land.
    pub fn with_quiescence(mut self, quiescence: Duration) -> Self {
        self.quiescence = quiescence;
        self
    }

    pub fn with_improvement_ratio(mut self, improvement_ratio: f64) -> Self {
        self.improvement_ratio = improvement_ratio;
        self
    }

    pub fn run<RV: UserValuesConstraint>(
        &self,
        ctx: &mut ScenarioContext<RV>,
    ) -> anyhow::Result<ProbeVerdict> {
        let first = ctx.http_get(&self.path)?;
        log::debug!("Cache probe {}: call 1 -> {} in {}ms", self.path, first.status, first.elapsed_ms());

        if first.is_not_found() {
            ctx.advise(
                log::Level::Warn,
                format!(
                    "{} returned 404, no data available to cache. Probe inconclusive",
                    self.path
                ),
            );
            return Ok(ProbeVerdict::Inconclusive {
                status: first.status,
            });
        }

        if !ctx.check(&first, "first call status is success", expect::success()) {
            return Ok(ProbeVerdict::UnexpectedStatus {
                status: first.status,
            });
        }

        let mut consistent = true;
        let mut speedups = Vec::with_capacity(2);
        for call in [2u8, 3] {
            ctx.pause(self.quiescence)?;
            let repeated = ctx.http_get(&self.path)?;
            log::debug!(
                "Cache probe {}: call {} -> {} in {}ms",
                self.path,
                call,
                repeated.status,
                repeated.elapsed_ms()
            );

            consistent &= self.check_repeated(ctx, call, &first, &repeated);
            speedups.push(SpeedUp::measure(call, first.elapsed, repeated.elapsed));
        }

        for speedup in &speedups {
            self.advise_timing(ctx, speedup);
        }

        if consistent {
            Ok(ProbeVerdict::Consistent { speedups })
        } else {
            Ok(ProbeVerdict::Inconsistent { speedups })
        }
    }

    fn check_repeated<RV: UserValuesConstraint>(
        &self,
        ctx: &mut ScenarioContext<RV>,
        call: u8,
        first: &ResponseDescriptor,
        repeated: &ResponseDescriptor,
    ) -> bool {
        let ordinal = if call == 2 { "second" } else { "third" };

        let same_status = ctx.evaluate(
            repeated,
            Check::new(format!("{ordinal} call has the same status"))
                .with(expect::same_status_as(first)),
        );
        let same_data = ctx.evaluate(
            repeated,
            Check::new(format!("{ordinal} call returns the same data"))
                .with(expect::same_body_as(first)),
        );

        same_status && same_data
    }

    fn advise_timing<RV: UserValuesConstraint>(&self, ctx: &mut ScenarioContext<RV>, speedup: &SpeedUp) {
        if speedup.is_improvement(self.improvement_ratio) {
            ctx.advise(
                log::Level::Info,
                format!(
                    "Cache performance improvement detected: {}% faster on call {} ({}ms vs {}ms)",
                    speedup.improvement_percent(),
                    speedup.call,
                    speedup.later.as_millis(),
                    speedup.first.as_millis()
                ),
            );
        } else {
            ctx.advise(
                log::Level::Warn,
                format!(
                    "Call {} ({}ms) not significantly faster than call 1 ({}ms)",
                    speedup.call,
                    speedup.later.as_millis(),
                    speedup.first.as_millis()
                ),
            );
        }
    }
}
