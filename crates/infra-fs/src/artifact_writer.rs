// Local artifact writer: metrics JSON + rows CSV per job

use crate::atomic::write_atomic;
use async_trait::async_trait;
use jobrelay_core::domain::{Row, RunResult};
use jobrelay_core::error::{AppError, Result};
use jobrelay_core::port::{ArtifactPaths, ArtifactWriter};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Rows document written when a run produced no rows
pub const NO_ROWS_PLACEHOLDER: &str = "message\nno data rows\n";

/// Writes `results_<job_id>.json` and `results_<job_id>.csv` into the
/// job's output directory, for failed runs too.
#[derive(Debug, Default, Clone)]
pub struct LocalArtifactWriter;

impl LocalArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// CSV with the header taken from the first row's keys.
///
/// Later rows missing a key get an empty cell; keys absent from the first
/// row are not written. No rows, or a first row without keys, yields the
/// placeholder.
pub fn rows_to_csv(rows: &[Row]) -> Result<Vec<u8>> {
    let Some(first) = rows.first().filter(|row| !row.is_empty()) else {
        return Ok(NO_ROWS_PLACEHOLDER.as_bytes().to_vec());
    };
    let header: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&header)
        .map_err(std::io::Error::from)?;
    for row in rows {
        writer
            .write_record(header.iter().map(|key| cell(row.get(*key))))
            .map_err(std::io::Error::from)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Io(std::io::Error::new(e.error().kind(), e.to_string())))
}

#[async_trait]
impl ArtifactWriter for LocalArtifactWriter {
    async fn write(
        &self,
        job_id: &str,
        output_dir: &Path,
        result: &RunResult,
    ) -> Result<ArtifactPaths> {
        let paths = ArtifactPaths::for_job(output_dir, job_id);

        let metrics = serde_json::to_vec_pretty(&result.metrics_document())?;
        write_atomic(&paths.metrics, &metrics).await?;
        write_atomic(&paths.rows, &rows_to_csv(&result.rows)?).await?;

        info!(
            job_id = %job_id,
            metrics = %paths.metrics.display(),
            rows_file = %paths.rows.display(),
            rows = result.rows.len(),
            "Artifacts written"
        );
        Ok(paths)
    }
}
