use chrono::{DateTime, Utc};
use neuroswing_network::{Activation, Activations, Agent, Genome, StructuralError, Topology};
use serde::{Deserialize, Serialize};

/// Snapshot of one generation's best genome plus cumulative statistics.
///
/// A checkpoint is written once and never modified; a later generation
/// produces its own, separately numbered record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub generation: u64,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub layers: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    #[serde(default, skip_serializing_if = "is_false")]
    pub uniform_activation: bool,
    /// Cumulative simulated ticks across training.
    pub ticks: u64,
    /// Cumulative wall-clock seconds across training.
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

#[expect(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl Checkpoint {
    pub fn topology(&self) -> Result<Topology, StructuralError> {
        Topology::new(self.layers.clone())
    }

    #[must_use]
    pub fn genome(&self) -> Genome {
        Genome::new(self.weights.clone(), self.biases.clone())
    }

    #[must_use]
    pub fn activations(&self) -> Activations {
        Activations {
            hidden: self.hidden_activation,
            output: self.output_activation,
            uniform: self.uniform_activation,
        }
    }

    /// Checks the layer list and that the genome fits it.
    pub fn validate(&self) -> Result<(), StructuralError> {
        let topology = self.topology()?;
        self.genome().validate(&topology)
    }

    /// Instantiates the stored genome as an agent for replay.
    pub fn agent(&self) -> Result<Agent, StructuralError> {
        let agent = Agent::new(self.topology()?, self.genome(), self.activations())?;
        Ok(agent.with_generation(self.generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Checkpoint {
        Checkpoint {
            generation: 3,
            inputs: vec!["a".to_owned(), "b".to_owned()],
            outputs: vec!["out".to_owned()],
            layers: vec![2, 2, 1],
            hidden_activation: Activation::Tanh,
            output_activation: Activation::Sigmoid,
            uniform_activation: false,
            ticks: 120,
            time: 1.5,
            best_score: Some(4.0),
            saved_at: None,
            weights: vec![0.1, -0.2, 0.3, -0.4, 0.5, 0.6],
            biases: vec![0.0, -1.0, 1.0],
        }
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let mut cp = sample();
        cp.weights.pop();
        assert_eq!(
            cp.validate(),
            Err(StructuralError::WeightCount {
                expected: 6,
                actual: 5
            })
        );

        let mut cp = sample();
        cp.layers = vec![2];
        assert!(cp.validate().is_err());
    }

    #[test]
    fn test_agent_from_checkpoint() {
        let cp = sample();
        let mut agent = cp.agent().unwrap();
        assert_eq!(agent.generation(), 3);
        assert_eq!(agent.run(&[0.0, 0.0]).unwrap().len(), 1);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "generation": 0, "inputs": [], "outputs": [], "layers": [1, 1],
            "hidden_activation": "relu", "output_activation": "sigmoid",
            "ticks": 0, "time": 0, "weights": [0.5], "biases": [0.0]
        }"#;
        let cp: Checkpoint = serde_json::from_str(json).unwrap();
        assert!(!cp.uniform_activation);
        assert_eq!(cp.best_score, None);
        assert_eq!(cp.saved_at, None);
        assert_eq!(cp.time, 0.0);
    }

    #[test]
    fn test_unknown_activation_is_rejected() {
        let json = serde_json::to_string(&sample())
            .unwrap()
            .replace("\"tanh\"", "\"swish\"");
        assert!(serde_json::from_str::<Checkpoint>(&json).is_err());
    }
}
