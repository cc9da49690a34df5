// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid job stage transition for {job_id}: {from} -> {to}")]
    InvalidStageTransition {
        job_id: String,
        from: String,
        to: String,
    },
}

pub type Result<T> = std::result::Result<T, DomainError>;
