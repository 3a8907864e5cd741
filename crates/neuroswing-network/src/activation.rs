use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Element-wise activation function applied to a layer's pre-activation values.
///
/// The set is closed: names are resolved through [`FromStr`] or serde and
/// anything other than `sigmoid`, `tanh` or `relu` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
}

impl Activation {
    pub const ALL: [Activation; 3] = [Activation::Sigmoid, Activation::Tanh, Activation::Relu];

    /// Returns the registry name used in configuration and checkpoint files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
        }
    }

    /// Returns the function implementing this activation.
    #[must_use]
    pub const fn function(self) -> fn(f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid,
            Activation::Tanh => f64::tanh,
            Activation::Relu => relu,
        }
    }

    #[must_use]
    pub fn apply(self, z: f64) -> f64 {
        (self.function())(z)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown activation function '{name}' (expected sigmoid, tanh or relu)")]
pub struct UnknownActivationError {
    pub name: String,
}

impl FromStr for Activation {
    type Err = UnknownActivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownActivationError { name: s.to_owned() })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn relu(z: f64) -> f64 {
    z.max(0.0)
}

/// Activation functions of one network.
///
/// When `uniform` is set, the hidden activation is applied through the output
/// layer as well and `output` is ignored during inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activations {
    pub hidden: Activation,
    pub output: Activation,
    pub uniform: bool,
}

impl Activations {
    /// Creates activations with a distinct output-layer function.
    #[must_use]
    pub const fn new(hidden: Activation, output: Activation) -> Self {
        Self {
            hidden,
            output,
            uniform: false,
        }
    }

    /// Creates activations applying `hidden` to every layer.
    #[must_use]
    pub const fn uniform(hidden: Activation) -> Self {
        Self {
            hidden,
            output: hidden,
            uniform: true,
        }
    }

    /// Returns the activation applied when computing layer `layer + 1` of a
    /// network with `transitions` weight matrices.
    #[must_use]
    pub const fn for_transition(self, layer: usize, transitions: usize) -> Activation {
        if !self.uniform && layer + 1 == transitions {
            self.output
        } else {
            self.hidden
        }
    }
}
