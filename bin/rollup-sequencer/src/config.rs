use std::{fs, path::PathBuf};

use alpen_rollup_database::StorageBackend;
use alpen_rollup_primitives::{AccountId, Balance};
use alpen_rollup_prover::CommandProverConfig;
use alpen_rollup_sequencer::SequencerConfigToml;
use serde::Deserialize;

use crate::{args::Args, errors::InitError};

const DEFAULT_DATADIR: &str = "data";
const DEFAULT_STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            datadir: default_datadir(),
            state_file: default_state_file(),
        }
    }
}

fn default_datadir() -> PathBuf {
    PathBuf::from(DEFAULT_DATADIR)
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE.to_owned()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ProverBackend {
    /// Commitment-only batches.
    #[default]
    None,
    Native,
    Command,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProverConfig {
    #[serde(default)]
    pub backend: ProverBackend,
    pub program: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ProverConfig {
    pub(crate) fn command_config(&self) -> Result<CommandProverConfig, InitError> {
        let program = self
            .program
            .clone()
            .ok_or(InitError::MissingProverProgram)?;
        Ok(CommandProverConfig {
            program,
            args: self.args.clone(),
            working_dir: self.working_dir.clone(),
        })
    }
}

/// Logging configuration for the sequencer.
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    pub service_label: Option<String>,

    /// Directory path for file-based logging.
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names (defaults to "rollup-sequencer" if not set).
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GenesisAccount {
    pub id: AccountId,
    pub balance: Balance,
}

/// Initial allocations, applied only to an empty ledger.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GenesisConfig {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub sequencer: SequencerConfigToml,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub genesis: GenesisConfig,
}

impl Config {
    /// Reads the config file named on the command line, if any, and applies
    /// CLI overrides.
    pub(crate) fn load(args: &Args) -> Result<Self, InitError> {
        let mut config = match &args.config {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => Config::default(),
        };

        if let Some(datadir) = &args.datadir {
            config.storage.datadir = datadir.clone();
        }
        Ok(config)
    }
}
