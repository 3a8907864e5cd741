use std::time::Instant;

use chrono::Utc;
use neuroswing_checkpoint::{Checkpoint, CheckpointError, CheckpointStore, PendingSaves};
use neuroswing_network::StructuralError;
use rand::Rng;

use crate::{
    ConfigError, FitnessFunction, GenerationReport, Population, TaskError, TrainingConfig,
    WorkerPool, genetic,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainError {
    #[display("{_0}")]
    Config(#[error(source)] ConfigError),
    #[display("{_0}")]
    Structural(#[error(source)] StructuralError),
    #[display("{_0}")]
    Checkpoint(#[error(source)] CheckpointError),
    #[display("{_0}")]
    Task(#[error(source)] TaskError),
}

/// Outcome of [`Trainer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Generations completed in this session.
    pub generations: u64,
    pub last_report: Option<GenerationReport>,
    /// Cumulative ticks across all sessions.
    pub total_ticks: u64,
    /// Cumulative wall-clock seconds across all sessions.
    pub total_time: f64,
}

/// Generational training loop.
///
/// Generations run strictly one after another: every task of a generation has
/// finished before selection starts, and the population is only touched
/// between generations. The only work outliving a generation is its
/// checkpoint write.
#[derive(Debug)]
pub struct Trainer<F, P, R> {
    config: TrainingConfig,
    store: CheckpointStore,
    fitness: F,
    pool: P,
    rng: R,
    population: Population,
    inputs: Vec<String>,
    outputs: Vec<String>,
    last_generation: Option<u64>,
    total_ticks: u64,
    total_time: f64,
    pending: PendingSaves,
}

impl<F, P, R> Trainer<F, P, R>
where
    F: FitnessFunction,
    P: WorkerPool,
    R: Rng,
{
    /// Creates a trainer, resuming from the newest checkpoint in `store`.
    ///
    /// Without a checkpoint the population is initialized randomly from the
    /// network settings in `config`.
    pub fn new(
        config: TrainingConfig,
        store: CheckpointStore,
        fitness: F,
        pool: P,
        mut rng: R,
    ) -> Result<Self, TrainError> {
        config.validate()?;

        let latest = store.load_latest()?;
        let population = if let Some(checkpoint) = &latest {
            tracing::info!(
                generation = checkpoint.generation,
                dir = %store.dir().display(),
                "resuming from checkpoint"
            );
            Population::from_checkpoint(checkpoint, config.num_agents)?
        } else {
            tracing::info!(
                dir = %store.dir().display(),
                "no checkpoint found, starting from random genomes"
            );
            Population::random(
                config.network.topology()?,
                config.network.activations(),
                config.num_agents,
                &config.init,
                &mut rng,
            )
        };
        let (inputs, outputs) = match &latest {
            Some(checkpoint) => (&checkpoint.inputs, &checkpoint.outputs),
            None => (&config.network.inputs, &config.network.outputs),
        };
        let (inputs, outputs) = (inputs.clone(), outputs.clone());
        let last_generation = latest.as_ref().map(|c| c.generation);
        let total_ticks = latest.as_ref().map_or(0, |c| c.ticks);
        let total_time = latest.as_ref().map_or(0.0, |c| c.time);

        Ok(Self {
            config,
            store,
            fitness,
            pool,
            rng,
            population,
            inputs,
            outputs,
            last_generation,
            total_ticks,
            total_time,
            pending: PendingSaves::new(),
        })
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Generation completed last, `None` before the first one.
    #[must_use]
    pub fn last_generation(&self) -> Option<u64> {
        self.last_generation
    }

    #[must_use]
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Checkpoint writes that have not finished yet.
    #[must_use]
    pub fn saves_in_flight(&self) -> usize {
        self.pending.in_flight()
    }

    /// Runs one generation: mutate, evaluate, select, checkpoint, report.
    ///
    /// A failed write of an earlier checkpoint is returned before anything of
    /// this generation is committed.
    pub fn step(&mut self) -> Result<GenerationReport, TrainError> {
        self.pending.reap()?;

        let started = Instant::now();
        let generation = self.last_generation.map_or(0, |g| g + 1);

        self.population.mutate(&self.config.mutation, &mut self.rng);
        let tasks = self.population.tasks(generation);
        let results = self.pool.evaluate(tasks, &self.fitness)?;
        let ranked = genetic::rank(results);

        // population is never empty, so neither is `ranked`
        let best = ranked[0];
        let best_genome = self.population.genomes()[best.agent_index].clone();
        let assignment = genetic::assign(&ranked, &self.config.selection, &mut self.rng);
        self.population.reassign(&assignment);

        self.total_ticks += ranked.iter().map(|r| r.ticks).sum::<u64>();
        self.total_time += started.elapsed().as_secs_f64();
        self.last_generation = Some(generation);

        let activations = self.population.activations();
        let checkpoint = Checkpoint {
            generation,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            layers: self.population.topology().layers().to_vec(),
            hidden_activation: activations.hidden,
            output_activation: activations.output,
            uniform_activation: activations.uniform,
            ticks: self.total_ticks,
            time: self.total_time,
            best_score: Some(best.score),
            saved_at: Some(Utc::now()),
            weights: best_genome.weights,
            biases: best_genome.biases,
        };
        self.pending.push(self.store.save(checkpoint));

        let report = GenerationReport::new(generation, &ranked, self.total_ticks);
        tracing::info!("{report}");
        Ok(report)
    }

    /// Runs the configured number of generations, then waits for all saves.
    ///
    /// A failed generation stops training; outstanding saves are still waited
    /// for before the error is returned.
    pub fn run(&mut self) -> Result<TrainingSummary, TrainError> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), passing every generation's report to
    /// `on_report` as soon as the generation completes.
    pub fn run_with<C>(&mut self, mut on_report: C) -> Result<TrainingSummary, TrainError>
    where
        C: FnMut(&GenerationReport),
    {
        let mut last_report = None;
        for completed in 0..self.config.generations {
            match self.step() {
                Ok(report) => {
                    on_report(&report);
                    last_report = Some(report);
                }
                Err(e) => {
                    tracing::error!(completed, error = %e, "training stopped");
                    if let Err(save_err) = self.drain() {
                        tracing::warn!(
                            error = %save_err,
                            "checkpoint write failed during shutdown"
                        );
                    }
                    return Err(e);
                }
            }
        }
        self.drain()?;
        Ok(TrainingSummary {
            generations: self.config.generations,
            last_report,
            total_ticks: self.total_ticks,
            total_time: self.total_time,
        })
    }

    /// Waits for every outstanding checkpoint write.
    pub fn drain(&mut self) -> Result<usize, TrainError> {
        Ok(self.pending.drain()?)
    }
}

impl<F, P, R> Drop for Trainer<F, P, R> {
    fn drop(&mut self) {
        if !self.pending.is_empty()
            && let Err(e) = self.pending.drain()
        {
            tracing::warn!(error = %e, "checkpoint write failed during shutdown");
        }
    }
}
