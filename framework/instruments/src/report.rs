mod summary_report;

use std::time::Duration;

use parking_lot::Mutex;

use crate::stats::percentile;
use crate::OperationRecord;

pub use summary_report::SummaryReportCollector;

pub trait ReportCollector: Send {
    fn add_operation(&mut self, operation_record: &OperationRecord);

    fn finalize(&self);
}

/// Choose which collectors the [Reporter] feeds.
#[derive(Debug, Default)]
pub struct ReportConfig {
    enable_summary: bool,
}

impl ReportConfig {
    /// Print a per-operation latency table when the run is finalized.
    pub fn enable_summary(mut self) -> Self {
        self.enable_summary = true;
        self
    }

    pub fn init(self) -> Reporter {
        let mut collectors: Vec<Mutex<Box<dyn ReportCollector>>> = Vec::new();
        if self.enable_summary {
            collectors.push(Mutex::new(Box::new(SummaryReportCollector::new())));
        }

        Reporter {
            collectors,
            totals: Mutex::new(OperationTotals::default()),
        }
    }
}

/// Receives every [OperationRecord] of a run.
///
/// Totals needed for threshold evaluation are always kept, whichever collectors are enabled.
pub struct Reporter {
    collectors: Vec<Mutex<Box<dyn ReportCollector>>>,
    totals: Mutex<OperationTotals>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("collectors", &self.collectors.len())
            .field("totals", &*self.totals.lock())
            .finish()
    }
}

impl Reporter {
    pub fn add_operation(&self, operation_record: OperationRecord) {
        for collector in &self.collectors {
            collector.lock().add_operation(&operation_record);
        }

        self.totals.lock().add(&operation_record);
    }

    /// A snapshot of the totals recorded so far.
    pub fn totals(&self) -> OperationTotals {
        self.totals.lock().clone()
    }

    pub fn finalize(&self) {
        log::debug!(
            "Finalizing {} report collectors after {} operations",
            self.collectors.len(),
            self.totals.lock().total
        );
        for collector in &self.collectors {
            collector.lock().finalize();
        }
    }
}

/// Run-wide request counts and durations.
#[derive(Debug, Default, Clone)]
pub struct OperationTotals {
    durations: Vec<Duration>,
    pub total: usize,
    pub failed: usize,
}

impl OperationTotals {
    fn add(&mut self, operation_record: &OperationRecord) {
        self.total += 1;
        if operation_record.is_error {
            self.failed += 1;
        }
        if let Some(elapsed) = operation_record.duration() {
            self.durations.push(elapsed);
        }
    }

    /// Fraction of requests that failed. Zero when nothing was requested.
    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failed as f64 / self.total as f64
        }
    }

    pub fn p95(&self) -> Option<Duration> {
        percentile(&self.durations, 95.0)
    }
}
