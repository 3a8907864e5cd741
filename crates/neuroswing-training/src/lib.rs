//! Evolutionary training loop for fixed-topology networks.
//!
//! This crate drives a population of [`Agent`](neuroswing_network::Agent)s through
//! generations of mutation, parallel evaluation and selection, checkpointing the
//! best genome of every generation.
//!
//! # How Training Works
//!
//! Each call to [`Trainer::step`] runs one generation:
//!
//! 1. **Mutate** - Every agent except index 0 receives a small uniform offset on
//!    one weight and one bias, repeated [`MutationParams::passes`] times
//! 2. **Dispatch** - One [`EvaluationTask`] per agent is built from copies of the
//!    agent's topology, genome and activations
//! 3. **Evaluate** - A [`WorkerPool`] runs the tasks against the
//!    [`FitnessFunction`]; all results are collected before continuing
//! 4. **Select** - Agents are ranked by descending score and genomes are copied
//!    into the next generation's slots ([`genetic::assign`])
//! 5. **Persist** - The top genome is saved as a checkpoint on a background thread
//! 6. **Report** - A [`GenerationReport`] is logged
//!
//! # Architecture
//!
//! ```text
//! Trainer
//!   ├─ Population ──mutate/reassign──┐
//!   │                                │ copies
//!   ├─ WorkerPool ── EvaluationTask ─┴─> Agent ─> FitnessFunction ─> score, ticks
//!   └─ CheckpointStore <── Checkpoint (top genome, cumulative ticks/time)
//! ```
//!
//! # Elite Lineage
//!
//! Agent 0 is never mutated, and the top scorer of each generation is always
//! copied into slot 0. With a deterministic fitness function the best score
//! therefore never regresses from one generation to the next.
//!
//! # Failure Semantics
//!
//! A fitness function error is fatal to the generation: it is returned from
//! [`Trainer::step`] and [`Trainer::run`] without retry. A panic inside a task
//! propagates to the caller of the pool. There is no timeout; a fitness
//! function that never returns stalls the generation.
//!
//! # Current Limitations
//!
//! - **Thread pools only**: evaluation runs on threads of this process
//! - **No reproducibility across pool sizes**: selection randomness is seeded by
//!   the caller but evaluation order is not

pub use self::genetic::{MutationParams, SelectionParams};
pub use self::{config::*, fitness::*, pool::*, population::*, report::*, trainer::*};

mod config;
mod fitness;
pub mod genetic;
mod pool;
mod population;
mod report;
mod trainer;
