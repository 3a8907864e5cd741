use std::{io, path::PathBuf};

use anyhow::Context as _;
use chrono::TimeDelta;
use neuroswing_training::format_duration;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShowArg {
    /// Directory holding `gen<N>.json` checkpoints
    #[arg(long, default_value = "gen")]
    checkpoint_dir: PathBuf,
    /// Generation to show; defaults to the newest
    #[arg(long)]
    generation: Option<u64>,
    /// Dump the whole checkpoint as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(arg: &ShowArg) -> anyhow::Result<()> {
    let checkpoint = util::load_checkpoint(&arg.checkpoint_dir, arg.generation)?;
    if arg.json {
        serde_json::to_writer_pretty(io::stdout().lock(), &checkpoint)
            .context("Failed to write checkpoint")?;
        println!();
        return Ok(());
    }

    #[expect(clippy::cast_possible_truncation)]
    let elapsed = TimeDelta::seconds(checkpoint.time.round() as i64);
    let activations = checkpoint.activations();
    println!("Generation:  {}", checkpoint.generation);
    println!("Layers:      {:?}", checkpoint.layers);
    println!("Inputs:      {}", checkpoint.inputs.join(", "));
    println!("Outputs:     {}", checkpoint.outputs.join(", "));
    if activations.uniform {
        println!("Activation:  {} (all layers)", activations.hidden);
    } else {
        println!(
            "Activation:  {} hidden, {} output",
            activations.hidden, activations.output
        );
    }
    println!("Ticks:       {}", checkpoint.ticks);
    println!("Train time:  {}", format_duration(elapsed));
    if let Some(score) = checkpoint.best_score {
        println!("Best score:  {score}");
    }
    if let Some(saved_at) = checkpoint.saved_at {
        println!("Saved at:    {}", saved_at.to_rfc3339());
    }
    Ok(())
}
