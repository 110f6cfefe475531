//! Rollup sequencer binary.
//!
//! Restores the ledger from the configured store, seeds genesis accounts on
//! first start, replays a file of transfers through the sequencer and writes
//! a final snapshot on exit.

mod args;
mod config;
mod errors;

use std::{fs, path::Path, sync::Arc};

use alpen_rollup_common::{logging, BatchNotification, BatchProver};
use alpen_rollup_database::open_state_store;
use alpen_rollup_primitives::Balance;
use alpen_rollup_prover::{CommandProver, NativeProver};
use alpen_rollup_sequencer::{Sequencer, SequencerError};
use anyhow::Result;
use args::{Args, EnvArgs};
use config::{Config, GenesisConfig, ProverBackend, ProverConfig};
use errors::InitError;
use serde::Deserialize;
use tokio::{
    runtime,
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "rollup-sequencer";

/// One entry of the `--txs` replay file.
#[derive(Debug, Deserialize)]
struct TransferRecord {
    from: String,
    to: String,
    amount: Balance,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e}");

        return Err(e);
    }

    Ok(())
}

fn main_inner(args: Args) -> Result<()> {
    // Config first, logging settings live in it.
    let config = Config::load(&args)?;
    init_logging(&config);

    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("rollup-rt")
        .build()
        .map_err(InitError::RuntimeBuild)?;

    let res = rt.block_on(run(args, config));
    if let Err(e) = &res {
        error!(%e, "sequencer exited with error");
    }
    logging::finalize();
    res
}

fn init_logging(config: &Config) {
    let env_args = EnvArgs::from_env();
    let service_label = env_args
        .service_label
        .as_deref()
        .or(config.logging.service_label.as_deref());

    logging::init_logging_from_config(logging::LoggingInitConfig {
        service_base_name: SERVICE_NAME,
        service_label,
        service_version: Some(env!("CARGO_PKG_VERSION")),
        log_dir: config.logging.log_dir.as_ref(),
        log_file_prefix: config.logging.log_file_prefix.as_deref(),
        json_format: config.logging.json_format,
        default_log_prefix: SERVICE_NAME,
    });
}

async fn run(args: Args, config: Config) -> Result<()> {
    let store = open_state_store(
        config.storage.backend,
        &config.storage.datadir,
        &config.storage.state_file,
    )
    .map_err(InitError::from)?;

    let mut builder = Sequencer::builder(store).with_config(config.sequencer.clone().into());
    if let Some(prover) = build_prover(&config.prover)? {
        builder = builder.with_prover(prover);
    }
    let sequencer = builder.build().await.map_err(InitError::from)?;

    if sequencer.accounts().is_empty() {
        seed_genesis(&sequencer, &config.genesis).await?;
    }

    let observer = spawn_observer(sequencer.subscribe());

    if let Some(path) = &args.txs {
        replay_transfers(&sequencer, path).await?;
    }
    if args.flush {
        sequencer.flush().await?;
    }

    println!("{}", serde_json::to_string_pretty(&sequencer.status())?);

    sequencer.shutdown().await?;
    // closes the notification channel
    drop(sequencer);
    observer.await?;

    Ok(())
}

fn build_prover(config: &ProverConfig) -> Result<Option<Arc<dyn BatchProver>>, InitError> {
    let prover: Arc<dyn BatchProver> = match config.backend {
        ProverBackend::None => {
            warn!("no prover configured, batches will be commitment-only");
            return Ok(None);
        }
        ProverBackend::Native => Arc::new(NativeProver),
        ProverBackend::Command => Arc::new(CommandProver::new(config.command_config()?)),
    };
    info!(backend = ?config.backend, "prover configured");
    Ok(Some(prover))
}

async fn seed_genesis(sequencer: &Sequencer, genesis: &GenesisConfig) -> Result<(), InitError> {
    if genesis.accounts.is_empty() {
        info!("no genesis accounts configured, starting with an empty ledger");
        return Ok(());
    }
    for account in &genesis.accounts {
        sequencer
            .seed_account(account.id.clone(), account.balance.clone())
            .await?;
    }
    info!(accounts = genesis.accounts.len(), root = %sequencer.root(), "seeded genesis accounts");
    Ok(())
}

async fn replay_transfers(sequencer: &Sequencer, path: &Path) -> Result<(), InitError> {
    let raw = fs::read(path)?;
    let records: Vec<TransferRecord> = serde_json::from_slice(&raw)?;
    info!(count = records.len(), path = %path.display(), "replaying transfers");

    let mut rejected = 0usize;
    for record in records {
        match sequencer
            .submit_transaction(&record.from, &record.to, record.amount)
            .await
        {
            Ok(_) => {}
            Err(e @ (SequencerError::Validation(_) | SequencerError::BatchApplication(_))) => {
                rejected += 1;
                warn!(from = %record.from, to = %record.to, %e, "transfer rejected");
            }
            Err(e) => return Err(e.into()),
        }
    }
    if rejected > 0 {
        warn!(rejected, "some transfers were not applied");
    }
    Ok(())
}

/// Logs every batch notification until the sequencer goes away.
fn spawn_observer(mut rx: broadcast::Receiver<Arc<BatchNotification>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(note) => info!(
                    batch_idx = note.batch_idx,
                    txs = note.transactions.len(),
                    old_root = %note.old_root,
                    new_root = %note.new_root,
                    proof_present = note.proof_present(),
                    proof_status = ?note.proof_status,
                    settlement = ?note.settlement,
                    persistence = ?note.persistence,
                    "batch processed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "batch observer lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
