use std::path::Path;

use anyhow::{Context, bail};
use neuroswing_checkpoint::{Checkpoint, CheckpointStore};
use neuroswing_network::Activation;
use neuroswing_pendulum::{BalanceTask, INPUTS, OUTPUTS};
use neuroswing_training::NetworkConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Installs the global subscriber. `RUST_LOG` overrides `verbose`.
pub(crate) fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Network trained when no config file provides one.
pub(crate) fn pendulum_network() -> NetworkConfig {
    NetworkConfig {
        inputs: INPUTS.map(str::to_owned).to_vec(),
        outputs: OUTPUTS.map(str::to_owned).to_vec(),
        hidden: vec![10, 10],
        hidden_activation: Activation::Tanh,
        output_activation: Activation::Tanh,
        uniform_activation: false,
    }
}

/// Episode settings shared by `train` and `replay`.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TaskArg {
    /// Episode length in ticks
    #[arg(long)]
    agent_time: Option<u64>,
    /// Always start with the pendulum hanging at rest
    #[arg(long)]
    no_random_start: bool,
    /// Disable the random mid-episode push
    #[arg(long)]
    no_distractions: bool,
}

impl TaskArg {
    pub(crate) fn task(&self) -> BalanceTask {
        let default = BalanceTask::default();
        BalanceTask {
            agent_time: self.agent_time.unwrap_or(default.agent_time),
            random_start: !self.no_random_start,
            distractions: !self.no_distractions,
        }
    }
}

/// Fails unless a network with `layers` can be driven by the pendulum task.
pub(crate) fn ensure_pendulum_shape(layers: &[usize]) -> anyhow::Result<()> {
    let (Some(&inputs), Some(&outputs)) = (layers.first(), layers.last()) else {
        bail!("network has no layers");
    };
    if inputs != INPUTS.len() || outputs != OUTPUTS.len() {
        bail!(
            "pendulum agents need {} inputs and {} output, network has {inputs} and {outputs}",
            INPUTS.len(),
            OUTPUTS.len()
        );
    }
    Ok(())
}

/// Loads `generation`, or the newest checkpoint when `None`.
pub(crate) fn load_checkpoint(dir: &Path, generation: Option<u64>) -> anyhow::Result<Checkpoint> {
    let store = CheckpointStore::new(dir);
    let dir = dir.display();
    let checkpoint = match generation {
        Some(generation) => store
            .load(generation)
            .with_context(|| format!("Failed to load generation {generation}"))?
            .with_context(|| format!("No checkpoint for generation {generation} in {dir}"))?,
        None => store
            .load_latest()
            .context("Failed to load newest checkpoint")?
            .with_context(|| format!("No checkpoints in {dir}"))?,
    };
    Ok(checkpoint)
}
