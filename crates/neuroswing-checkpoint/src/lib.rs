//! Generation checkpoints for the training engine.
//!
//! Every generation the trainer persists the genome of its top scorer together
//! with cumulative training statistics as a [`Checkpoint`]. Checkpoints are
//! written to one JSON file per generation (`gen<generation>.json`) inside a
//! directory owned by a [`CheckpointStore`]. Older files are never deleted, so
//! the directory holds the full champion history of a training run.
//!
//! # File Format
//!
//! ```text
//! {
//!   "generation": 12,
//!   "inputs": ["cart.x", "cart.vel", "bob.x", "bob.y", "bob.vel"],
//!   "outputs": ["acceleration"],
//!   "layers": [5, 10, 10, 1],
//!   "hidden_activation": "tanh",
//!   "output_activation": "tanh",
//!   "ticks": 2160000,
//!   "time": 31.4,
//!   "weights": [...],   // Σ layers[i] * layers[i + 1] values
//!   "biases": [...]     // Σ layers[i + 1] values
//! }
//! ```
//!
//! `uniform_activation`, `best_score` and `saved_at` are optional; older files
//! without them still load.
//!
//! # Error Handling
//!
//! - A missing directory is created on demand.
//! - A missing file for a requested generation is reported as `Ok(None)`.
//! - File names that are not `gen<digits>.json` are ignored when scanning.
//! - A file that exists but cannot be parsed, or whose vectors do not fit its
//!   topology, is a hard [`CheckpointError`].
//!
//! # Asynchronous Saves
//!
//! [`CheckpointStore::save`] writes on a background thread and returns a
//! [`SaveHandle`]. Completion is only guaranteed once the handle is waited on;
//! [`PendingSaves`] collects handles so a trainer can drain them at shutdown.

use std::{io, path::PathBuf};

use neuroswing_network::StructuralError;

pub use self::{record::*, store::*};

mod record;
mod store;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CheckpointError {
    #[display("failed to access checkpoint file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("failed to parse checkpoint file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("invalid checkpoint file {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: StructuralError,
    },
    #[display("checkpoint file {} holds generation {found}, expected {expected}", path.display())]
    GenerationMismatch {
        path: PathBuf,
        expected: u64,
        found: u64,
    },
    #[display("checkpoint writer for generation {generation} panicked")]
    WriterPanicked { generation: u64 },
}
