use std::ops::Range;

use crate::StructuralError;

/// Ordered layer sizes of a feed-forward network, input layer first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topology {
    layers: Vec<usize>,
}

impl Topology {
    /// Creates a topology, rejecting fewer than two layers or empty layers.
    pub fn new(layers: Vec<usize>) -> Result<Self, StructuralError> {
        if layers.len() < 2 {
            return Err(StructuralError::TooFewLayers { len: layers.len() });
        }
        if let Some(index) = layers.iter().position(|&n| n == 0) {
            return Err(StructuralError::EmptyLayer { index });
        }
        Ok(Self { layers })
    }

    /// Builds `[inputs, hidden..., outputs]`.
    pub fn from_parts(
        inputs: usize,
        hidden: &[usize],
        outputs: usize,
    ) -> Result<Self, StructuralError> {
        let mut layers = Vec::with_capacity(hidden.len() + 2);
        layers.push(inputs);
        layers.extend_from_slice(hidden);
        layers.push(outputs);
        Self::new(layers)
    }

    #[must_use]
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    #[must_use]
    pub fn inputs(&self) -> usize {
        self.layers[0]
    }

    #[must_use]
    pub fn outputs(&self) -> usize {
        self.layers[self.layers.len() - 1]
    }

    /// Number of weight matrices (layer-to-layer transitions).
    #[must_use]
    pub fn transitions(&self) -> usize {
        self.layers.len() - 1
    }

    /// Total weight count, `Σ n(i)·n(i+1)`.
    #[must_use]
    pub fn weight_count(&self) -> usize {
        self.layers.windows(2).map(|w| w[0] * w[1]).sum()
    }

    /// Total bias count, `Σ n(i+1)`.
    #[must_use]
    pub fn bias_count(&self) -> usize {
        self.layers[1..].iter().sum()
    }

    /// Returns the weight and bias ranges of each transition inside a flat genome.
    pub fn slices(&self) -> impl Iterator<Item = LayerSlice> + '_ {
        let mut weight_offset = 0;
        let mut bias_offset = 0;
        self.layers.windows(2).map(move |w| {
            let (rows, cols) = (w[0], w[1]);
            let slice = LayerSlice {
                rows,
                cols,
                weights: weight_offset..weight_offset + rows * cols,
                biases: bias_offset..bias_offset + cols,
            };
            weight_offset += rows * cols;
            bias_offset += cols;
            slice
        })
    }
}

/// Location of one transition's `[rows × cols]` weight matrix and `cols` biases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSlice {
    pub rows: usize,
    pub cols: usize,
    pub weights: Range<usize>,
    pub biases: Range<usize>,
}

/// Flat weight and bias vectors of one network.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl Genome {
    #[must_use]
    pub fn new(weights: Vec<f64>, biases: Vec<f64>) -> Self {
        Self { weights, biases }
    }

    /// Creates a genome of the right shape with every element set to zero.
    #[must_use]
    pub fn zeroed(topology: &Topology) -> Self {
        Self {
            weights: vec![0.0; topology.weight_count()],
            biases: vec![0.0; topology.bias_count()],
        }
    }

    /// Checks that vector lengths match the sums implied by `topology`.
    pub fn validate(&self, topology: &Topology) -> Result<(), StructuralError> {
        let expected = topology.weight_count();
        if self.weights.len() != expected {
            return Err(StructuralError::WeightCount {
                expected,
                actual: self.weights.len(),
            });
        }
        let expected = topology.bias_count();
        if self.biases.len() != expected {
            return Err(StructuralError::BiasCount {
                expected,
                actual: self.biases.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_topology() {
        assert_eq!(
            Topology::new(vec![3]),
            Err(StructuralError::TooFewLayers { len: 1 })
        );
        assert_eq!(
            Topology::new(vec![3, 0, 1]),
            Err(StructuralError::EmptyLayer { index: 1 })
        );
    }

    #[test]
    fn test_counts() {
        let t = Topology::new(vec![5, 10, 10, 1]).unwrap();
        assert_eq!(t.weight_count(), 5 * 10 + 10 * 10 + 10);
        assert_eq!(t.bias_count(), 10 + 10 + 1);
        assert_eq!(t.inputs(), 5);
        assert_eq!(t.outputs(), 1);
        assert_eq!(t.transitions(), 3);

        let t = Topology::from_parts(2, &[], 3).unwrap();
        assert_eq!(t.layers(), &[2, 3]);
        assert_eq!(t.weight_count(), 6);
        assert_eq!(t.bias_count(), 3);
    }

    #[test]
    fn test_slices_cover_genome() {
        let t = Topology::new(vec![2, 3, 1]).unwrap();
        let slices = t.slices().collect::<Vec<_>>();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].weights, 0..6);
        assert_eq!(slices[0].biases, 0..3);
        assert_eq!(slices[1].weights, 6..9);
        assert_eq!(slices[1].biases, 3..4);
        assert_eq!(slices[1].rows, 3);
        assert_eq!(slices[1].cols, 1);
    }

    #[test]
    fn test_genome_validation() {
        let t = Topology::new(vec![2, 3, 1]).unwrap();
        assert!(Genome::zeroed(&t).validate(&t).is_ok());

        let short_weights = Genome::new(vec![0.0; 8], vec![0.0; 4]);
        assert_eq!(
            short_weights.validate(&t),
            Err(StructuralError::WeightCount {
                expected: 9,
                actual: 8
            })
        );

        let long_biases = Genome::new(vec![0.0; 9], vec![0.0; 5]);
        assert_eq!(
            long_biases.validate(&t),
            Err(StructuralError::BiasCount {
                expected: 4,
                actual: 5
            })
        );
    }
}
