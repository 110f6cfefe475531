//! CLI argument parsing and environment variable handling.

use std::{env, path::PathBuf};

use argh::FromArgs;

/// Configs overridable by environment.
#[derive(Debug, Clone)]
pub(crate) struct EnvArgs {
    /// Service label to include in service name
    pub service_label: Option<String>,
}

impl EnvArgs {
    pub(crate) fn from_env() -> Self {
        Self {
            service_label: env::var("ROLLUP_SVC_LABEL").ok(),
        }
    }
}

#[derive(Debug, Clone, FromArgs)]
#[argh(description = "Layer-2 rollup transaction sequencer")]
pub(crate) struct Args {
    #[argh(option, short = 'c', description = "path to configuration")]
    pub config: Option<PathBuf>,

    /// Data directory path that will override the path in the config toml.
    #[argh(option, short = 'd', description = "datadir path for the state snapshot")]
    pub datadir: Option<PathBuf>,

    #[argh(
        option,
        short = 't',
        description = "JSON file with an array of {{from, to, amount}} transfers to submit"
    )]
    pub txs: Option<PathBuf>,

    #[argh(switch, description = "process any partial batch before exiting")]
    pub flush: bool,
}
