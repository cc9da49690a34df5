// jobrelay Infrastructure - Computation Adapters
// Implements: Computation

pub mod line_stats;
pub mod subprocess_computation;

pub use line_stats::LineStatsComputation;
pub use subprocess_computation::{SubprocessComputation, DEFAULT_ENV_ALLOWLIST};
