// Job Runner - invokes the external computation with fault isolation

use crate::domain::RunResult;
use crate::port::{Computation, ComputationError};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs the computation collaborator and always yields a [`RunResult`].
///
/// Errors and panics from the collaborator are converted into a failed
/// result carrying a descriptive message; nothing escapes this boundary.
pub struct JobRunner {
    computation: Arc<dyn Computation>,
}

impl JobRunner {
    pub fn new(computation: Arc<dyn Computation>) -> Self {
        Self { computation }
    }

    pub async fn run(&self, input: &Path, job_id: &str) -> RunResult {
        info!(job_id = %job_id, input = %input.display(), "Running computation");

        // Spawned so a panicking collaborator is caught by the JoinHandle
        let computation = Arc::clone(&self.computation);
        let input_owned = input.to_path_buf();
        let job_id_owned = job_id.to_string();
        let handle = tokio::task::spawn(async move {
            computation.compute(&input_owned, &job_id_owned).await
        });

        match handle.await {
            Ok(Ok(result)) => {
                info!(
                    job_id = %job_id,
                    success = result.success,
                    rows = result.rows.len(),
                    errors = result.errors.len(),
                    "Computation finished"
                );
                result
            }
            Ok(Err(ComputationError::Validation(msg))) => {
                warn!(job_id = %job_id, error = %msg, "Input rejected by computation");
                RunResult::failed(format!("validation error: {}", msg))
            }
            Ok(Err(e)) => {
                error!(job_id = %job_id, error = %e, "Computation failed");
                RunResult::failed(format!("processing error: {}", e))
            }
            Err(join_err) => {
                let detail = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    "task cancelled".to_string()
                };
                error!(job_id = %job_id, panic_msg = %detail, "Computation panicked");
                RunResult::failed(format!("processing error: computation panicked: {}", detail))
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
