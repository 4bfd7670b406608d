use comms::specs::ArchitectureSpec;

use super::activations::ActFn;
use crate::{MlErr, Result};

/// The hidden shape of a `Network`: hidden layer widths, their activation and dropout rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Architecture {
    hidden_layers: Vec<usize>,
    act_fn: ActFn,
    dropout: f32,
}

impl Architecture {
    /// Creates a new `Architecture`.
    ///
    /// # Arguments
    /// * `hidden_layers` - The width of every hidden layer, may be empty.
    /// * `act_fn` - The activation applied after every hidden layer.
    /// * `dropout` - The probability of zeroing a hidden unit while training.
    ///
    /// # Returns
    /// An error if a hidden layer has no units or the dropout rate is outside `[0, 1)`.
    pub fn new(hidden_layers: Vec<usize>, act_fn: ActFn, dropout: f32) -> Result<Self> {
        if let Some(i) = hidden_layers.iter().position(|&width| width == 0) {
            return Err(MlErr::InvalidArchitecture(format!(
                "hidden layer {i} has no units"
            )));
        }

        if !(0. ..1.).contains(&dropout) {
            return Err(MlErr::InvalidArchitecture(format!(
                "dropout must be in [0, 1), got {dropout}"
            )));
        }

        Ok(Self {
            hidden_layers,
            act_fn,
            dropout,
        })
    }

    pub fn hidden_layers(&self) -> &[usize] {
        &self.hidden_layers
    }

    pub fn act_fn(&self) -> ActFn {
        self.act_fn
    }

    pub fn dropout(&self) -> f32 {
        self.dropout
    }

    /// Returns the wire form of this architecture.
    pub fn to_spec(&self) -> ArchitectureSpec {
        ArchitectureSpec {
            hidden_layers: self.hidden_layers.clone(),
            activation: self.act_fn.into(),
            dropout: self.dropout,
        }
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            hidden_layers: vec![10, 5],
            act_fn: ActFn::Tanh,
            dropout: 0.,
        }
    }
}

impl TryFrom<&ArchitectureSpec> for Architecture {
    type Error = MlErr;

    fn try_from(spec: &ArchitectureSpec) -> Result<Self> {
        Self::new(
            spec.hidden_layers.clone(),
            spec.activation.into(),
            spec.dropout,
        )
    }
}
