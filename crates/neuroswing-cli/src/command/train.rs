use std::{io::Write, path::PathBuf};

use anyhow::Context as _;
use chrono::TimeDelta;
use clap::ValueEnum;
use neuroswing_checkpoint::CheckpointStore;
use neuroswing_pendulum::BalanceTask;
use neuroswing_training::{
    Pool, PoolKind, Trainer, TrainingConfig, TrainingSummary, format_duration,
};

use crate::util::{self, TaskArg};

/// Agents per generation when training without a config file.
const DEFAULT_AGENTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PoolArg {
    Rayon,
    Scoped,
    Sequential,
}

impl From<PoolArg> for PoolKind {
    fn from(arg: PoolArg) -> Self {
        match arg {
            PoolArg::Rayon => PoolKind::Rayon,
            PoolArg::Scoped => PoolKind::Scoped,
            PoolArg::Sequential => PoolKind::Sequential,
        }
    }
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// JSON training config; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding `gen<N>.json` checkpoints
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,
    /// Generations to run in this session
    #[arg(long)]
    generations: Option<u64>,
    /// Agents per generation
    #[arg(long)]
    agents: Option<usize>,
    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,
    /// Worker pool implementation
    #[arg(long, value_enum)]
    pool: Option<PoolArg>,
    #[command(flatten)]
    task: TaskArg,
}

impl TrainArg {
    fn config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => TrainingConfig {
                num_agents: DEFAULT_AGENTS,
                ..TrainingConfig::default()
            },
        };
        if config.network.inputs.is_empty() && config.network.outputs.is_empty() {
            config.network = util::pendulum_network();
        }

        if let Some(dir) = &self.checkpoint_dir {
            config.checkpoint_dir.clone_from(dir);
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(agents) = self.agents {
            config.num_agents = agents;
        }
        if let Some(workers) = self.workers {
            config.pool.workers = workers;
        }
        if let Some(pool) = self.pool {
            config.pool.kind = pool.into();
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.config()?;
    let task = arg.task.task();
    tracing::info!(
        agents = config.num_agents,
        generations = config.generations,
        pool = %config.pool.kind,
        workers = config.pool.workers,
        agent_time = task.agent_time,
        "starting training session"
    );

    let summary = train(config, task, &mut std::io::stderr().lock())?;

    #[expect(clippy::cast_possible_truncation)]
    let elapsed = TimeDelta::seconds(summary.total_time.round() as i64);
    println!(
        "Completed {} generations; {} ticks in {}",
        summary.generations,
        summary.total_ticks,
        format_duration(elapsed)
    );
    Ok(())
}

/// Runs one training session, writing every generation's report to `out`.
fn train(
    config: TrainingConfig,
    task: BalanceTask,
    out: &mut impl Write,
) -> anyhow::Result<TrainingSummary> {
    let store = CheckpointStore::new(&config.checkpoint_dir);
    let pool = Pool::new(&config.pool).context("Failed to start worker pool")?;
    let mut trainer = Trainer::new(config, store, task, pool, rand::rng())
        .context("Failed to initialize training")?;
    util::ensure_pendulum_shape(trainer.population().topology().layers())?;

    let mut written = Ok(());
    let summary = trainer
        .run_with(|report| {
            if written.is_ok() {
                written = writeln!(out, "{report}");
            }
        })
        .context("Training failed")?;
    written.context("Failed to write generation report")?;
    Ok(summary)
}
