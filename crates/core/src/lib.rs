// jobrelay core - domain model, ports and the orchestration loop
// No HTTP clients, SDKs or file formats here; adapters live in the infra crates.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
