// Built-in computation: per-line statistics of a text input

use async_trait::async_trait;
use jobrelay_core::domain::{Metrics, Row, RunResult};
use jobrelay_core::port::{Computation, ComputationError};
use serde_json::json;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

const PREVIEW_CHARS: usize = 40;

/// One row per input line: `line_number`, `length`, `has_comma`, `preview`.
///
/// Invalid UTF-8 is replaced rather than rejected. Metrics carry
/// `line_count` and `processing_time` (seconds).
#[derive(Debug, Default, Clone)]
pub struct LineStatsComputation;

impl LineStatsComputation {
    pub fn new() -> Self {
        Self
    }

    fn line_row(line_number: usize, line: &str) -> Row {
        let mut row = Row::new();
        row.insert("line_number".to_string(), json!(line_number));
        row.insert("length".to_string(), json!(line.chars().count()));
        row.insert("has_comma".to_string(), json!(line.contains(',')));
        row.insert(
            "preview".to_string(),
            json!(line.chars().take(PREVIEW_CHARS).collect::<String>()),
        );
        row
    }
}

#[async_trait]
impl Computation for LineStatsComputation {
    async fn compute(&self, input: &Path, job_id: &str) -> Result<RunResult, ComputationError> {
        let started = Instant::now();
        let bytes = tokio::fs::read(input)
            .await
            .map_err(|e| ComputationError::Io(format!("{}: {}", input.display(), e)))?;
        let text = String::from_utf8_lossy(&bytes);

        let rows: Vec<Row> = text
            .lines()
            .enumerate()
            .map(|(i, line)| Self::line_row(i + 1, line))
            .collect();

        let mut metrics = Metrics::new();
        metrics.insert("line_count".to_string(), json!(rows.len()));
        let elapsed = (started.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
        metrics.insert("processing_time".to_string(), json!(elapsed));

        debug!(job_id = %job_id, lines = rows.len(), "Line statistics computed");
        Ok(RunResult::succeeded(rows, metrics))
    }
}
