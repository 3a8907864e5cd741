//! Fixed-topology feed-forward networks evaluated by the training engine.
//!
//! A network is described by three pieces:
//!
//! - [`Topology`] - ordered layer sizes `[n0, n1, …, nk]`
//! - [`Genome`] - flat weight and bias vectors laid out according to the topology
//! - [`Activations`] - the hidden/output activation functions and whether the
//!   output layer uses its own activation
//!
//! An [`Agent`] binds the three together and performs forward inference, counting
//! one tick per call to [`Agent::run`]. Fitness functions use the tick counter
//! as the unit of episode length.
//!
//! # Genome Layout
//!
//! Weights for layer `i` form a row-major `[n(i) × n(i+1)]` matrix stored
//! contiguously, layer after layer. Biases for layer `i + 1` follow the same
//! ordering:
//!
//! ```text
//! weights = [ W0 (n0·n1) | W1 (n1·n2) | … ]
//! biases  = [ b1 (n1)    | b2 (n2)    | … ]
//! ```
//!
//! # Example
//!
//! ```
//! use neuroswing_network::{Activation, Activations, Agent, Genome, Topology};
//!
//! let topology = Topology::new(vec![2, 3, 1]).unwrap();
//! let genome = Genome::zeroed(&topology);
//! let activations = Activations::new(Activation::Relu, Activation::Sigmoid);
//! let mut agent = Agent::new(topology, genome, activations).unwrap();
//!
//! let output = agent.run(&[0.3, -0.7]).unwrap();
//! assert_eq!(output, &[0.5]);
//! assert_eq!(agent.ticks(), 1);
//! ```

pub use self::{activation::*, agent::*, topology::*};

mod activation;
mod agent;
mod topology;

/// Errors raised when genome, topology and inputs do not fit together.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum StructuralError {
    #[display("topology needs at least 2 layers, got {len}")]
    TooFewLayers { len: usize },
    #[display("layer {index} has zero neurons")]
    EmptyLayer { index: usize },
    #[display("weight vector has {actual} elements, topology requires {expected}")]
    WeightCount { expected: usize, actual: usize },
    #[display("bias vector has {actual} elements, topology requires {expected}")]
    BiasCount { expected: usize, actual: usize },
    #[display("input vector has {actual} elements, input layer has {expected}")]
    InputCount { expected: usize, actual: usize },
}
