mod report;
mod stats;

use std::time::{Duration, Instant};

pub use report::{OperationTotals, ReportCollector, ReportConfig, Reporter, SummaryReportCollector};
pub use stats::percentile;

/// Timing and outcome of a single request made against the system under test.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation_id: String,
    started: Instant,
    pub elapsed: Option<Duration>,
    /// The HTTP status, if a response was received.
    pub status: Option<u16>,
    /// Set for transport failures and for any status of 400 or above.
    pub is_error: bool,
}

impl OperationRecord {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            started: Instant::now(),
            elapsed: None,
            status: None,
            is_error: false,
        }
    }

    /// Create a record for an operation that has already completed.
    pub fn completed(operation_id: impl Into<String>, elapsed: Duration, status: Option<u16>) -> Self {
        let mut record = Self::new(operation_id);
        record.elapsed = Some(elapsed);
        record.status = status;
        record.is_error = status.map_or(true, |s| s >= 400);
        record
    }

    /// Stop the clock on this operation. Pass `None` when no response was received.
    ///
    /// Returns the elapsed time so the caller can report the same value that was recorded.
    pub fn finish(&mut self, status: Option<u16>) -> Duration {
        let elapsed = self.started.elapsed();
        self.elapsed = Some(elapsed);
        self.status = status;
        self.is_error = status.map_or(true, |s| s >= 400);
        elapsed
    }

    pub fn duration(&self) -> Option<Duration> {
        self.elapsed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finish_marks_client_and_server_errors() {
        let mut ok = OperationRecord::new("GET /books/top5");
        ok.finish(Some(200));
        assert!(!ok.is_error);
        assert!(ok.duration().is_some());

        let mut not_found = OperationRecord::new("GET /books/9999999999999");
        not_found.finish(Some(404));
        assert!(not_found.is_error);

        let mut refused = OperationRecord::new("GET /authors/1");
        refused.finish(None);
        assert!(refused.is_error);
        assert_eq!(None, refused.status);
    }
}
