//! [`BatchProver`](alpen_rollup_common::BatchProver) implementations.
//!
//! - [`NativeProver`] replays the witness in-process and emits no SNARK.
//! - [`CommandProver`] drives an external circuit toolchain such as snarkjs.

mod circuit;
mod command;
mod native;

pub use circuit::CircuitInput;
pub use command::{CommandProver, CommandProverConfig};
pub use native::{check_witness, NativeProver};
