use serde::{Deserialize, Serialize};

/// The activation function placed after every hidden layer, as sent over the wire.
///
/// Names are matched case-insensitively, anything unknown falls back to `Tanh`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivationSpec {
    #[default]
    Tanh,
    Relu,
    LeakyRelu,
    Gelu,
}

impl From<String> for ActivationSpec {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "relu" => Self::Relu,
            "leaky_relu" => Self::LeakyRelu,
            "gelu" => Self::Gelu,
            _ => Self::Tanh,
        }
    }
}

impl From<ActivationSpec> for String {
    fn from(value: ActivationSpec) -> Self {
        let name = match value {
            ActivationSpec::Tanh => "tanh",
            ActivationSpec::Relu => "relu",
            ActivationSpec::LeakyRelu => "leaky_relu",
            ActivationSpec::Gelu => "gelu",
        };

        name.to_string()
    }
}

/// The shape of the hidden part of a network, as requested by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    pub hidden_layers: Vec<usize>,
    #[serde(default)]
    pub activation: ActivationSpec,
    #[serde(default)]
    pub dropout: f32,
}

impl Default for ArchitectureSpec {
    fn default() -> Self {
        Self {
            hidden_layers: vec![10, 5],
            activation: ActivationSpec::Tanh,
            dropout: 0.,
        }
    }
}

/// The wire form of a network's parameters.
///
/// `weights[l][o][i]` is the weight from input `i` to output `o` of layer `l` and
/// `biases[l][o]` the bias of that output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    #[serde(default)]
    pub weights: Vec<Vec<Vec<f32>>>,
    #[serde(default)]
    pub biases: Vec<Vec<f32>>,
}
