// Command-line flags with environment fallbacks

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use jobrelay_core::config::{
    PipelineConfig, PollerConfig, RetrySettings, StorageConfig, StoreConfig, API_KEY_PLACEHOLDER,
    DEFAULT_API_BASE, DEFAULT_CANDIDATE_LIMIT, DEFAULT_ENTITY, DEFAULT_MAX_ATTEMPTS,
};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PREFIX: &str = "processed-runs";
const DEFAULT_INPUT_DIR: &str = "~/jobrelay_inputs";
const DEFAULT_LEDGER_PATH: &str = "~/.jobrelay_state.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pipeline {
    /// Built-in per-line statistics
    LineStats,
    /// External program printing a JSON result on stdout
    Command,
}

#[derive(Debug, Parser)]
#[command(name = "jobrelay")]
#[command(about = "Pull pending jobs, process their inputs and publish the results", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Entity store base URL
    #[arg(long, env = "JOBRELAY_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Application id in the entity store
    #[arg(long, env = "JOBRELAY_APP_ID")]
    pub app_id: Option<String>,

    /// Entity type holding the jobs
    #[arg(long, env = "JOBRELAY_ENTITY", default_value = DEFAULT_ENTITY)]
    pub entity: String,

    /// Entity store API key
    #[arg(long, env = "JOBRELAY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Destination S3 bucket
    #[arg(long, env = "JOBRELAY_S3_BUCKET")]
    pub bucket: Option<String>,

    /// Key prefix inside the bucket
    #[arg(long, env = "JOBRELAY_S3_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Publish objects as publicly readable (0/1, true/false)
    #[arg(
        long,
        env = "JOBRELAY_S3_PUBLIC",
        default_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub public: bool,

    /// Signed URL lifetime in seconds for private buckets (0 disables)
    #[arg(long, env = "JOBRELAY_S3_PRESIGN_SECONDS", default_value_t = 0)]
    pub presign_seconds: u64,

    /// Root directory for downloaded inputs and outputs
    #[arg(long, env = "JOBRELAY_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: String,

    /// Idempotency ledger file
    #[arg(long, env = "JOBRELAY_LEDGER_PATH", default_value = DEFAULT_LEDGER_PATH)]
    pub ledger_path: String,

    /// Maximum candidates taken per run
    #[arg(long, env = "JOBRELAY_CANDIDATE_LIMIT", default_value_t = DEFAULT_CANDIDATE_LIMIT)]
    pub candidate_limit: usize,

    /// Send the advisory `queued` status before `running` (0/1, true/false)
    #[arg(
        long,
        env = "JOBRELAY_UPDATE_TO_QUEUED",
        default_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub update_to_queued: bool,

    /// Attempts per network call
    #[arg(long, env = "JOBRELAY_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Computation run on each input
    #[arg(long, env = "JOBRELAY_PIPELINE", value_enum, default_value_t = Pipeline::LineStats)]
    pub pipeline: Pipeline,

    /// Program for the `command` pipeline
    #[arg(long, env = "JOBRELAY_COMMAND")]
    pub command: Option<String>,

    /// Extra arguments placed before `<input_path> <job_id>`
    #[arg(
        long = "command-arg",
        env = "JOBRELAY_COMMAND_ARGS",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub command_args: Vec<String>,

    /// Kill the command after this many seconds
    #[arg(long, env = "JOBRELAY_COMMAND_TIMEOUT")]
    pub command_timeout: Option<u64>,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Cli {
    /// Resolve flags into the configuration handed to every component.
    /// Missing credentials stay empty here and are rejected by validation.
    pub fn into_config(self) -> PollerConfig {
        let pipeline = match self.pipeline {
            Pipeline::LineStats => PipelineConfig::LineStats,
            Pipeline::Command => PipelineConfig::Command {
                program: self.command.unwrap_or_default(),
                args: self.command_args,
                timeout: self.command_timeout.map(Duration::from_secs),
            },
        };

        PollerConfig {
            store: StoreConfig {
                api_base: self.api_base,
                app_id: self.app_id.unwrap_or_default(),
                entity: self.entity,
                api_key: self
                    .api_key
                    .unwrap_or_else(|| API_KEY_PLACEHOLDER.to_string()),
            },
            storage: StorageConfig::new(
                self.bucket.unwrap_or_default(),
                &self.prefix,
                self.public,
                self.presign_seconds,
            ),
            input_dir: expand(&self.input_dir),
            ledger_path: expand(&self.ledger_path),
            candidate_limit: self.candidate_limit,
            update_to_queued: self.update_to_queued,
            retry: RetrySettings {
                max_attempts: self.max_attempts,
                ..RetrySettings::default()
            },
            pipeline,
        }
    }
}
