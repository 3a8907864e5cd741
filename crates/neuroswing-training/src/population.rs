use neuroswing_checkpoint::Checkpoint;
use neuroswing_network::{Activations, Genome, StructuralError, Topology};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{EvaluationTask, MutationParams, genetic};

/// Parameters for randomly initialized populations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitParams {
    /// Weights are drawn uniformly from `[-weight_range, weight_range]`.
    pub weight_range: f64,
    /// Value every bias starts at.
    pub initial_bias: f64,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            weight_range: 1.0,
            initial_bias: -1.0,
        }
    }
}

/// Genomes of every agent, sharing one topology and one set of activations.
///
/// The population is only modified between generations; evaluation tasks
/// receive copies of the genomes.
#[derive(Debug, Clone)]
pub struct Population {
    topology: Topology,
    activations: Activations,
    genomes: Vec<Genome>,
}

impl Population {
    /// Creates `count` random genomes.
    #[must_use]
    pub fn random<R>(
        topology: Topology,
        activations: Activations,
        count: usize,
        init: &InitParams,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let range = init.weight_range.abs();
        let genomes = (0..count)
            .map(|_| {
                let weights = (0..topology.weight_count())
                    .map(|_| rng.random_range(-range..=range))
                    .collect();
                let biases = vec![init.initial_bias; topology.bias_count()];
                Genome::new(weights, biases)
            })
            .collect();
        Self {
            topology,
            activations,
            genomes,
        }
    }

    /// Creates `count` copies of a checkpoint's genome.
    pub fn from_checkpoint(checkpoint: &Checkpoint, count: usize) -> Result<Self, StructuralError> {
        let genome = checkpoint.genome();
        Self::from_genomes(
            checkpoint.topology()?,
            checkpoint.activations(),
            vec![genome; count],
        )
    }

    /// Wraps existing genomes, checking each against `topology`.
    pub fn from_genomes(
        topology: Topology,
        activations: Activations,
        genomes: Vec<Genome>,
    ) -> Result<Self, StructuralError> {
        for genome in &genomes {
            genome.validate(&topology)?;
        }
        Ok(Self {
            topology,
            activations,
            genomes,
        })
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn activations(&self) -> Activations {
        self.activations
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[must_use]
    pub fn genome(&self, index: usize) -> Option<&Genome> {
        self.genomes.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Applies `params.passes` mutation passes to every agent except index 0.
    pub fn mutate<R>(&mut self, params: &MutationParams, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        genetic::mutate(&mut self.genomes, params, rng);
    }

    /// Replaces slot `i` with the genome currently at `assignment[i]`.
    ///
    /// Sources are read from the genomes as they were before the call, so a
    /// slot overwritten early can still be used as a source later.
    pub fn reassign(&mut self, assignment: &[usize]) {
        assert_eq!(
            assignment.len(),
            self.genomes.len(),
            "assignment must cover every slot"
        );
        self.genomes = assignment
            .iter()
            .map(|&source| self.genomes[source].clone())
            .collect();
    }

    /// Builds one evaluation task per agent for `generation`.
    #[must_use]
    pub fn tasks(&self, generation: u64) -> Vec<EvaluationTask> {
        self.genomes
            .iter()
            .enumerate()
            .map(|(agent_index, genome)| EvaluationTask {
                agent_index,
                generation,
                topology: self.topology.clone(),
                genome: genome.clone(),
                activations: self.activations,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use neuroswing_network::Activation;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    fn topology() -> Topology {
        Topology::new(vec![3, 4, 2]).unwrap()
    }

    #[test]
    fn test_random_population_shape() {
        let mut rng = Pcg64::seed_from_u64(1);
        let population = Population::random(
            topology(),
            Activations::new(Activation::Tanh, Activation::Sigmoid),
            6,
            &InitParams::default(),
            &mut rng,
        );
        assert_eq!(population.len(), 6);
        for genome in population.genomes() {
            assert!(genome.validate(population.topology()).is_ok());
            assert!(genome.weights.iter().all(|w| (-1.0..=1.0).contains(w)));
            assert!(genome.biases.iter().all(|&b| b == -1.0));
        }
        assert_ne!(population.genomes()[0], population.genomes()[1]);
    }

    #[test]
    fn test_from_genomes_validates() {
        let bad = Genome::new(vec![0.0; 3], vec![0.0; 6]);
        assert!(
            Population::from_genomes(
                topology(),
                Activations::uniform(Activation::Relu),
                vec![bad]
            )
            .is_err()
        );
    }

    #[test]
    fn test_reassign_reads_previous_genomes() {
        let t = Topology::new(vec![1, 1]).unwrap();
        let genomes = (0..4)
            .map(|i| Genome::new(vec![f64::from(i)], vec![0.0]))
            .collect();
        let mut population =
            Population::from_genomes(t, Activations::uniform(Activation::Relu), genomes).unwrap();
        population.reassign(&[2, 0, 0, 1]);
        let weights = population
            .genomes()
            .iter()
            .map(|g| g.weights[0])
            .collect::<Vec<_>>();
        assert_eq!(weights, vec![2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_tasks_copy_genomes() {
        let mut rng = Pcg64::seed_from_u64(2);
        let population = Population::random(
            topology(),
            Activations::uniform(Activation::Relu),
            3,
            &InitParams::default(),
            &mut rng,
        );
        let tasks = population.tasks(11);
        assert_eq!(tasks.len(), 3);
        for (i, task) in tasks.iter().enumerate() {
            assert_eq!(task.agent_index, i);
            assert_eq!(task.generation, 11);
            assert_eq!(&task.genome, &population.genomes()[i]);
        }
    }
}
