use crate::{Activations, Genome, LayerSlice, StructuralError, Topology};

/// A genome instantiated as a runnable network.
///
/// Each agent is owned by the evaluation task that builds it. Inference
/// mutates the per-layer value buffers and advances the tick counter.
#[derive(Debug, Clone)]
pub struct Agent {
    topology: Topology,
    genome: Genome,
    activations: Activations,
    slices: Vec<LayerSlice>,
    values: Vec<Vec<f64>>,
    ticks: u64,
    generation: u64,
}

impl Agent {
    /// Binds `genome` to `topology`.
    ///
    /// Fails with a [`StructuralError`] if the genome's vector lengths do not
    /// match the topology.
    pub fn new(
        topology: Topology,
        genome: Genome,
        activations: Activations,
    ) -> Result<Self, StructuralError> {
        genome.validate(&topology)?;
        let slices = topology.slices().collect();
        let values = topology.layers().iter().map(|&n| vec![0.0; n]).collect();
        Ok(Self {
            topology,
            genome,
            activations,
            slices,
            values,
            ticks: 0,
            generation: 0,
        })
    }

    /// Sets the generation this agent is evaluated in.
    ///
    /// Fitness functions commonly seed their episode randomness with it.
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Runs one forward pass and returns the output layer.
    ///
    /// Increments [`ticks`](Self::ticks) by one per successful call.
    pub fn run(&mut self, inputs: &[f64]) -> Result<&[f64], StructuralError> {
        let expected = self.topology.inputs();
        if inputs.len() != expected {
            return Err(StructuralError::InputCount {
                expected,
                actual: inputs.len(),
            });
        }
        self.ticks += 1;
        self.values[0].copy_from_slice(inputs);

        let transitions = self.slices.len();
        for (i, slice) in self.slices.iter().enumerate() {
            let activation = self.activations.for_transition(i, transitions).function();
            let weights = &self.genome.weights[slice.weights.clone()];
            let biases = &self.genome.biases[slice.biases.clone()];
            let (prev, next) = self.values.split_at_mut(i + 1);
            let (input, output) = (&prev[i], &mut next[0]);
            for (c, out) in output.iter_mut().enumerate() {
                let z = input
                    .iter()
                    .enumerate()
                    .map(|(r, x)| x * weights[r * slice.cols + c])
                    .sum::<f64>()
                    + biases[c];
                *out = activation(z);
            }
        }

        Ok(&self.values[self.values.len() - 1])
    }

    /// Number of completed [`run`](Self::run) calls.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    #[must_use]
    pub fn activations(&self) -> Activations {
        self.activations
    }

    /// Activation values of `layer` after the latest [`run`](Self::run).
    #[must_use]
    pub fn layer_values(&self, layer: usize) -> Option<&[f64]> {
        self.values.get(layer).map(Vec::as_slice)
    }
}
