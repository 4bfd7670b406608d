use serde::{Deserialize, Serialize};

use super::{ActivationSpec, ArchitectureSpec};

/// The optimizer kind, as sent over the wire.
///
/// Names are matched case-insensitively, anything unknown falls back to `Adam`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptimizerSpec {
    GradientDescent,
    #[default]
    Adam,
    RmsProp,
}

impl From<String> for OptimizerSpec {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "sgd" => Self::GradientDescent,
            "rmsprop" => Self::RmsProp,
            _ => Self::Adam,
        }
    }
}

impl From<OptimizerSpec> for String {
    fn from(value: OptimizerSpec) -> Self {
        let name = match value {
            OptimizerSpec::GradientDescent => "sgd",
            OptimizerSpec::Adam => "adam",
            OptimizerSpec::RmsProp => "rmsprop",
        };

        name.to_string()
    }
}

/// A partial update of the training hyperparameters, absent keys are left untouched.
///
/// The architecture keys don't touch the current model, they only shape the next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regularization: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropout: Option<f32>,
}

impl ConfigPatch {
    /// Whether this patch carries any of the architecture keys.
    pub fn reshapes(&self) -> bool {
        self.architecture.is_some() || self.activation.is_some() || self.dropout.is_some()
    }

    /// Applies the architecture keys of this patch over `base`.
    pub fn architecture_over(&self, mut base: ArchitectureSpec) -> ArchitectureSpec {
        if let Some(hidden_layers) = &self.architecture {
            base.hidden_layers = hidden_layers.clone();
        }
        if let Some(activation) = self.activation {
            base.activation = activation;
        }
        if let Some(dropout) = self.dropout {
            base.dropout = dropout;
        }

        base
    }
}

/// The metrics reported along with every step result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub loss: f32,
    pub step: u64,
}
