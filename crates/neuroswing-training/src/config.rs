use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use neuroswing_network::{Activation, Activations, StructuralError, Topology};
use serde::{Deserialize, Serialize};

use crate::{InitParams, MutationParams, PoolConfig, SelectionParams};

/// Shape of freshly initialized networks.
///
/// Only used when no checkpoint exists; a resumed run takes topology, names and
/// activations from its checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub hidden: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    /// Apply the hidden activation to the output layer as well.
    pub uniform_activation: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            inputs: vec![],
            outputs: vec![],
            hidden: vec![],
            hidden_activation: Activation::Relu,
            output_activation: Activation::Sigmoid,
            uniform_activation: false,
        }
    }
}

impl NetworkConfig {
    pub fn topology(&self) -> Result<Topology, StructuralError> {
        Topology::from_parts(self.inputs.len(), &self.hidden, self.outputs.len())
    }

    #[must_use]
    pub fn activations(&self) -> Activations {
        Activations {
            hidden: self.hidden_activation,
            output: self.output_activation,
            uniform: self.uniform_activation,
        }
    }
}

/// Settings of a training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub num_agents: usize,
    /// Generations to run in this session.
    pub generations: u64,
    pub checkpoint_dir: PathBuf,
    pub network: NetworkConfig,
    pub init: InitParams,
    pub mutation: MutationParams,
    pub selection: SelectionParams,
    pub pool: PoolConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_agents: 25,
            generations: 2000,
            checkpoint_dir: PathBuf::from("gen"),
            network: NetworkConfig::default(),
            init: InitParams::default(),
            mutation: MutationParams::default(),
            selection: SelectionParams::default(),
            pool: PoolConfig::default(),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("failed to open config file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("invalid network: {source}")]
    Network { source: StructuralError },
    #[display("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl TrainingConfig {
    /// Reads a JSON config file; missing fields take their defaults.
    pub fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Checks value ranges and the network shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if self.num_agents == 0 {
            return invalid("num_agents", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.selection.elite_fraction) {
            return invalid("selection.elite_fraction", "must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.selection.runner_up_fraction) {
            return invalid("selection.runner_up_fraction", "must be within [0, 1]");
        }
        if !(self.mutation.weight_strength >= 0.0 && self.mutation.weight_strength.is_finite()) {
            return invalid("mutation.weight_strength", "must be a finite value >= 0");
        }
        if !(self.mutation.bias_strength >= 0.0 && self.mutation.bias_strength.is_finite()) {
            return invalid("mutation.bias_strength", "must be a finite value >= 0");
        }
        if !self.init.weight_range.is_finite() || !self.init.initial_bias.is_finite() {
            return invalid("init", "values must be finite");
        }
        if self.pool.workers == 0 {
            return invalid("pool.workers", "must be at least 1");
        }
        self.network
            .topology()
            .map_err(|source| ConfigError::Network { source })?;
        Ok(())
    }
}
