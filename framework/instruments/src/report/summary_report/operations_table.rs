use tabled::Tabled;

#[derive(Debug, Tabled)]
pub struct OperationRow {
    pub operation_id: String,
    pub total_operations: usize,
    pub failed_operations: usize,
    #[tabled(display = "float2")]
    pub avg_time_ms: f64,
    #[tabled(display = "float2")]
    pub min_time_ms: f64,
    #[tabled(display = "float2")]
    pub max_time_ms: f64,
    #[tabled(display = "float2")]
    pub p95_time_ms: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}
