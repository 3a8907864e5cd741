use std::{
    error::Error,
    fmt, io,
    time::{Duration, Instant},
};

use neuroswing_network::{Activations, Agent, Genome, StructuralError, Topology};

/// Scores one agent by driving it through an episode.
///
/// Implementations call [`Agent::run`] as often as their episode requires; the
/// trainer reads [`Agent::ticks`] afterwards as the episode's cost. The agent
/// must not be retained beyond the call. Implementations are shared across
/// worker threads and must not rely on mutable shared state.
pub trait FitnessFunction: Sync {
    fn evaluate(&self, agent: &mut Agent) -> Result<f64, FitnessError>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&mut Agent) -> Result<f64, FitnessError> + Sync,
{
    fn evaluate(&self, agent: &mut Agent) -> Result<f64, FitnessError> {
        self(agent)
    }
}

/// Error raised by a [`FitnessFunction`].
#[derive(Debug)]
pub struct FitnessError(Box<dyn Error + Send + Sync + 'static>);

impl FitnessError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self(error.into())
    }
}

impl fmt::Display for FitnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Error for FitnessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl From<StructuralError> for FitnessError {
    fn from(error: StructuralError) -> Self {
        Self::new(error)
    }
}

impl From<io::Error> for FitnessError {
    fn from(error: io::Error) -> Self {
        Self::new(error)
    }
}

impl From<String> for FitnessError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for FitnessError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// A fitness failure, attributed to the agent being evaluated.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("fitness evaluation failed for agent {agent_index} in generation {generation}: {source}")]
pub struct TaskError {
    pub agent_index: usize,
    pub generation: u64,
    pub source: FitnessError,
}

/// Everything a worker needs to evaluate one agent.
///
/// The task owns copies of the genome and topology; nothing is shared with
/// the population or with other tasks.
#[derive(Debug, Clone)]
pub struct EvaluationTask {
    pub agent_index: usize,
    pub generation: u64,
    pub topology: Topology,
    pub genome: Genome,
    pub activations: Activations,
}

impl EvaluationTask {
    /// Builds the agent and runs `fitness` on it.
    pub fn run<F>(self, fitness: &F) -> Result<EvaluationResult, TaskError>
    where
        F: FitnessFunction + ?Sized,
    {
        let start = Instant::now();
        let Self {
            agent_index,
            generation,
            topology,
            genome,
            activations,
        } = self;
        let task_err = |source| TaskError {
            agent_index,
            generation,
            source,
        };

        let mut agent = Agent::new(topology, genome, activations)
            .map_err(|e| task_err(e.into()))?
            .with_generation(generation);
        let score = fitness.evaluate(&mut agent).map_err(task_err)?;

        Ok(EvaluationResult {
            agent_index,
            score,
            ticks: agent.ticks(),
            elapsed: start.elapsed(),
        })
    }
}

/// Outcome of one evaluation task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationResult {
    pub agent_index: usize,
    pub score: f64,
    pub ticks: u64,
    pub elapsed: Duration,
}
