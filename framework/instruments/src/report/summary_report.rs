mod operations_table;

use std::collections::BTreeMap;
use std::time::Duration;

use tabled::settings::Style;
use tabled::Table;

use crate::report::summary_report::operations_table::OperationRow;
use crate::report::ReportCollector;
use crate::stats::percentile;
use crate::OperationRecord;

/// Keeps every operation in memory and prints a latency table per operation at the end of the run.
#[derive(Debug, Default)]
pub struct SummaryReportCollector {
    operation_records: Vec<OperationRecord>,
}

impl SummaryReportCollector {
    pub fn new() -> Self {
        Self {
            operation_records: Vec::new(),
        }
    }

    pub(crate) fn rows(&self) -> Vec<OperationRow> {
        self.operation_records
            .iter()
            .fold(BTreeMap::<&str, Vec<&OperationRecord>>::new(), |mut acc, record| {
                acc.entry(record.operation_id.as_str())
                    .or_default()
                    .push(record);
                acc
            })
            .into_iter()
            .map(|(operation_id, operations)| {
                let durations = operations
                    .iter()
                    .filter_map(|record| record.duration())
                    .collect::<Vec<_>>();
                let total_duration = durations.iter().sum::<Duration>();

                OperationRow {
                    operation_id: operation_id.to_string(),
                    total_operations: operations.len(),
                    failed_operations: operations.iter().filter(|op| op.is_error).count(),
                    avg_time_ms: if durations.is_empty() {
                        0.0
                    } else {
                        as_ms(total_duration) / durations.len() as f64
                    },
                    min_time_ms: durations.iter().min().copied().map(as_ms).unwrap_or_default(),
                    max_time_ms: durations.iter().max().copied().map(as_ms).unwrap_or_default(),
                    p95_time_ms: percentile(&durations, 95.0)
                        .map(as_ms)
                        .unwrap_or_default(),
                }
            })
            .collect()
    }

    fn print_summary_of_operations(&self) {
        println!("\nSummary of operations");

        let mut table = Table::new(self.rows());
        table.with(Style::modern());

        println!("{table}");
    }
}

fn as_ms(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

impl ReportCollector for SummaryReportCollector {
    fn add_operation(&mut self, operation_record: &OperationRecord) {
        self.operation_records.push(operation_record.clone());
    }

    fn finalize(&self) {
        self.print_summary_of_operations();
    }
}
