// Computation Port
// Seam to the external domain computation that turns an input file into rows
// and metrics. Its algorithm is not this crate's concern.

use crate::domain::RunResult;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Computation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputationError {
    /// Input could not be parsed or understood
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Computation failed: {0}")]
    Failed(String),

    #[error("Computation timed out after {0}ms")]
    Timeout(u64),

    #[error("Spawn failed: {0}")]
    Spawn(String),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// External computation collaborator
///
/// Implementations:
/// - LineStatsComputation: built-in per-line statistics
/// - SubprocessComputation: external program speaking JSON on stdout
#[async_trait]
pub trait Computation: Send + Sync {
    /// Run the computation over `input` for `job_id`
    ///
    /// # Errors
    /// - ComputationError::Validation if the input is not understood
    /// - ComputationError::Failed / Timeout / Spawn for execution faults
    async fn compute(&self, input: &Path, job_id: &str) -> Result<RunResult, ComputationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Mock computation behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this result
        Return(RunResult),
        /// Return an error
        Fail(ComputationError),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock Computation for testing
    pub struct MockComputation {
        behavior: Arc<Mutex<MockBehavior>>,
        calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    }

    impl MockComputation {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn returning(result: RunResult) -> Self {
            Self::new(MockBehavior::Return(result))
        }

        pub fn new_fail(error: ComputationError) -> Self {
            Self::new(MockBehavior::Fail(error))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<(PathBuf, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Computation for MockComputation {
        async fn compute(&self, input: &Path, job_id: &str) -> Result<RunResult, ComputationError> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), job_id.to_string()));

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Return(result) => Ok(result),
                MockBehavior::Fail(e) => Err(e),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            }
        }
    }
}
