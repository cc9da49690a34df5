// External computation run as a child process
// reason: tokio::process for async spawn + timeout
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use jobrelay_core::domain::RunResult;
use jobrelay_core::port::{Computation, ComputationError};

/// Variables passed through to the child when no allowlist is given
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "TMPDIR"];

const STDERR_TAIL_CHARS: usize = 500;

/// Runs `<program> <args..> <input_path> <job_id>` and reads a JSON
/// `{success, errors, rows, metrics}` document from stdout.
///
/// The child starts with a cleared environment plus the allowlisted
/// variables of the current process.
pub struct SubprocessComputation {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    env_allowlist: Vec<String>,
}

impl SubprocessComputation {
    /// # Example
    /// ```ignore
    /// let computation = SubprocessComputation::new("python3", vec!["pipeline.py".into()])
    ///     .with_timeout(Duration::from_secs(3600));
    /// ```
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_env_allowlist(mut self, allowlist: Vec<String>) -> Self {
        self.env_allowlist = allowlist;
        self
    }

    /// Allowlisted variables from the current environment
    fn filtered_env(&self) -> Vec<(String, String)> {
        std::env::vars()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    async fn spawn_and_wait(
        &self,
        input: &Path,
        job_id: &str,
    ) -> Result<std::process::Output, ComputationError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg(job_id)
            .env_clear()
            .envs(self.filtered_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ComputationError::Spawn(format!("{}: {}", self.program, e)))?;

        match self.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(ComputationError::Io(e.to_string())),
                Err(_) => Err(ComputationError::Timeout(limit.as_millis() as u64)),
            },
            None => child
                .wait_with_output()
                .await
                .map_err(|e| ComputationError::Io(e.to_string())),
        }
    }
}

/// Decode the stdout document: the whole output, else its last non-empty line
fn parse_output(stdout: &str) -> Result<RunResult, ComputationError> {
    let trimmed = stdout.trim();
    if let Ok(result) = serde_json::from_str::<RunResult>(trimmed) {
        return Ok(result);
    }
    let last_line = trimmed
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default();
    serde_json::from_str::<RunResult>(last_line)
        .map_err(|e| ComputationError::InvalidOutput(format!("stdout is not a result document: {}", e)))
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    text.chars()
        .skip(count.saturating_sub(STDERR_TAIL_CHARS))
        .collect()
}

#[async_trait]
impl Computation for SubprocessComputation {
    async fn compute(&self, input: &Path, job_id: &str) -> Result<RunResult, ComputationError> {
        info!(
            program = %self.program,
            args = ?self.args,
            job_id = %job_id,
            timeout_ms = ?self.timeout.map(|t| t.as_millis()),
            "Starting external computation"
        );

        let output = self.spawn_and_wait(input, job_id).await?;

        if !output.status.success() {
            let tail = stderr_tail(&output.stderr);
            warn!(
                job_id = %job_id,
                exit_code = ?output.status.code(),
                stderr = %tail,
                "External computation exited with failure"
            );
            return Err(ComputationError::Failed(format!(
                "exit code {:?}: {}",
                output.status.code(),
                tail
            )));
        }

        let result = parse_output(&String::from_utf8_lossy(&output.stdout))?;
        info!(
            job_id = %job_id,
            success = result.success,
            rows = result.rows.len(),
            "External computation completed"
        );
        Ok(result)
    }
}
