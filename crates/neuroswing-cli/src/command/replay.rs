use std::path::PathBuf;

use anyhow::Context as _;
use neuroswing_training::FitnessFunction as _;

use crate::util::{self, TaskArg};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Directory holding `gen<N>.json` checkpoints
    #[arg(long, default_value = "gen")]
    checkpoint_dir: PathBuf,
    /// Generation to replay; defaults to the newest
    #[arg(long)]
    generation: Option<u64>,
    /// Seed the episode as this generation instead of the checkpoint's own
    #[arg(long)]
    episode: Option<u64>,
    #[command(flatten)]
    task: TaskArg,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let checkpoint = util::load_checkpoint(&arg.checkpoint_dir, arg.generation)?;
    util::ensure_pendulum_shape(&checkpoint.layers)?;

    let episode = arg.episode.unwrap_or(checkpoint.generation);
    let mut agent = checkpoint
        .agent()
        .context("Checkpoint does not describe a valid network")?
        .with_generation(episode);
    let score = arg
        .task
        .task()
        .evaluate(&mut agent)
        .context("Episode failed")?;

    println!(
        "Generation: {}; Episode: {episode}; Score: {score}; Ticks: {}",
        checkpoint.generation,
        agent.ticks()
    );
    Ok(())
}
