//! Cart-pendulum environment used as the default fitness function.
//!
//! A pendulum hangs from a cart that moves along a rail between `x = -1` and
//! `x = 1`. An agent observes the cart and the bob and outputs a horizontal
//! acceleration; [`BalanceTask`] rewards keeping the bob upright near the
//! center of the rail.
//!
//! # Example
//!
//! ```
//! use neuroswing_network::{Activation, Activations, Agent, Genome, Topology};
//! use neuroswing_pendulum::{BalanceTask, INPUTS, OUTPUTS};
//! use neuroswing_training::FitnessFunction as _;
//!
//! let topology = Topology::from_parts(INPUTS.len(), &[4], OUTPUTS.len()).unwrap();
//! let genome = Genome::zeroed(&topology);
//! let mut agent = Agent::new(topology, genome, Activations::uniform(Activation::Tanh)).unwrap();
//!
//! let task = BalanceTask { agent_time: 120, ..BalanceTask::default() };
//! let score = task.evaluate(&mut agent).unwrap();
//! assert!(score.is_finite());
//! assert_eq!(agent.ticks(), 120);
//! ```

pub use self::{pendulum::*, task::*, vec2::*};

mod pendulum;
mod task;
mod vec2;
