use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use alpen_rollup_common::{BatchProver, ProofMaterial, ProverError, ProverInput};
use alpen_rollup_primitives::FieldElement;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tempfile::TempDir;
use tokio::{fs, process::Command};
use tracing::{debug, info, warn};

use crate::CircuitInput;

const INPUT_FILE: &str = "input.json";
const PROOF_FILE: &str = "proof.json";
const PUBLIC_FILE: &str = "public.json";

/// Placeholders substituted into [`CommandProverConfig::args`].
const INPUT_PLACEHOLDER: &str = "{input}";
const PROOF_PLACEHOLDER: &str = "{proof}";
const PUBLIC_PLACEHOLDER: &str = "{public}";

/// External command invocation.
///
/// For snarkjs this is typically
/// `snarkjs groth16 fullprove {input} rollup.wasm rollup_final.zkey {proof} {public}`.
#[derive(Clone, Debug, Deserialize)]
pub struct CommandProverConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory the command runs in, for resolving circuit artifact paths.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Prover that writes the circuit input to disk and shells out to a toolchain.
///
/// The child is killed if the returned future is dropped, so a caller-side
/// timeout abandons the run.
#[derive(Debug, Clone)]
pub struct CommandProver {
    config: CommandProverConfig,
}

impl CommandProver {
    pub fn new(config: CommandProverConfig) -> Self {
        Self { config }
    }

    fn render_args(&self, dir: &Path) -> Vec<String> {
        let input = dir.join(INPUT_FILE);
        let proof = dir.join(PROOF_FILE);
        let public = dir.join(PUBLIC_FILE);
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
                    .replace(PROOF_PLACEHOLDER, &proof.to_string_lossy())
                    .replace(PUBLIC_PLACEHOLDER, &public.to_string_lossy())
            })
            .collect()
    }

    async fn run(&self, dir: &TempDir) -> Result<(), ProverError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.render_args(dir.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(wd) = &self.config.working_dir {
            cmd.current_dir(wd);
        }

        let output = cmd.output().await.map_err(|e| {
            ProverError::Unavailable(format!("{}: {e}", self.config.program.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            warn!(status = %output.status, %stderr, "prover command failed");
            return Err(ProverError::Toolchain {
                status: output.status.to_string(),
                stderr,
            });
        }
        debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), "prover command finished");
        Ok(())
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ProverError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| ProverError::malformed(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProverError::malformed(format!("{}: {e}", path.display())))
}

fn parse_public_signals(raw: Vec<Value>) -> Result<Vec<FieldElement>, ProverError> {
    raw.into_iter()
        .map(|v| match v {
            Value::String(s) => s.parse().map_err(ProverError::malformed),
            Value::Number(n) => n.to_string().parse().map_err(ProverError::malformed),
            other => Err(ProverError::malformed(format!(
                "public signal is not a number: {other}"
            ))),
        })
        .collect()
}

#[async_trait]
impl BatchProver for CommandProver {
    async fn generate_proof(&self, input: ProverInput) -> Result<ProofMaterial, ProverError> {
        let circuit_input =
            CircuitInput::from_prover_input(&input).map_err(ProverError::invalid_witness)?;
        let dir = tempfile::Builder::new().prefix("rollup-prove-").tempdir()?;

        let bytes = serde_json::to_vec(&circuit_input).map_err(ProverError::malformed)?;
        fs::write(dir.path().join(INPUT_FILE), bytes).await?;

        info!(batch_idx = input.batch_idx, program = %self.config.program.display(), "running prover command");
        self.run(&dir).await?;

        let proof: Value = read_json(&dir.path().join(PROOF_FILE)).await?;
        let public: Vec<Value> = read_json(&dir.path().join(PUBLIC_FILE)).await?;
        let public_signals = parse_public_signals(public)?;

        Ok(ProofMaterial::new(proof, public_signals))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use alpen_rollup_state::{CommitmentTree, Ledger};

    use super::*;

    fn empty_input() -> ProverInput {
        let root = CommitmentTree::from_ledger(&Ledger::new()).unwrap().root();
        ProverInput {
            batch_idx: 3,
            old_root: root,
            new_root: root,
            transfers: vec![],
        }
    }

    fn sh(script: &str) -> CommandProver {
        CommandProver::new(CommandProverConfig {
            program: PathBuf::from("sh"),
            args: vec![
                "-c".to_string(),
                script.to_string(),
                "prover".to_string(),
                INPUT_PLACEHOLDER.to_string(),
                PROOF_PLACEHOLDER.to_string(),
                PUBLIC_PLACEHOLDER.to_string(),
            ],
            working_dir: None,
        })
    }

    #[tokio::test]
    async fn test_reads_proof_and_public_outputs() {
        let prover = sh(r#"test -s "$1" && echo '{"pi_a":["1"]}' > "$2" && echo '["7", "0x08"]' > "$3""#);
        let out = prover.generate_proof(empty_input()).await.unwrap();
        assert_eq!(out.proof["pi_a"][0], "1");
        assert_eq!(
            out.public_roots(),
            Some((FieldElement::from(7), FieldElement::from(8)))
        );
    }

    #[tokio::test]
    async fn test_input_uses_circuit_field_names() {
        let prover = sh(r#"grep -q oldMerkleRoot "$1" && echo '{}' > "$2" && echo '[]' > "$3""#);
        let out = prover.generate_proof(empty_input()).await.unwrap();
        assert!(out.public_signals.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_toolchain_error() {
        let prover = sh("echo boom >&2; exit 3");
        match prover.generate_proof(empty_input()).await {
            Err(ProverError::Toolchain { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected toolchain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_outputs_are_malformed() {
        let prover = sh("true");
        assert!(matches!(
            prover.generate_proof(empty_input()).await,
            Err(ProverError::MalformedOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let prover = CommandProver::new(CommandProverConfig {
            program: PathBuf::from("/nonexistent/prover-binary"),
            args: vec![],
            working_dir: None,
        });
        assert!(matches!(
            prover.generate_proof(empty_input()).await,
            Err(ProverError::Unavailable(_))
        ));
    }
}
