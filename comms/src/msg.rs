use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::specs::{ArchitectureSpec, ConfigPatch, DataPoint, ModelState, StepMetrics};

/// A control message sent by the client, dispatched by its `type` tag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartTraining,
    StopTraining,
    Reset,
    UpdateConfig {
        #[serde(default)]
        payload: ConfigPatch,
    },
    UpdateData {
        data: Vec<DataPoint>,
    },
    UpdateArchitecture {
        payload: ArchitectureSpec,
    },
    GenerateData {
        distribution: String,
        #[serde(default = "default_num_classes")]
        num_classes: usize,
    },
    TrainStep {
        #[serde(default)]
        config: Option<ConfigPatch>,
        #[serde(default)]
        model: Option<ModelState>,
        #[serde(default)]
        data: Option<Vec<DataPoint>>,
    },
}

fn default_num_classes() -> usize {
    2
}

impl Command {
    /// Every `type` tag this protocol understands.
    pub const KINDS: [&'static str; 8] = [
        "start_training",
        "stop_training",
        "reset",
        "update_config",
        "update_data",
        "update_architecture",
        "generate_data",
        "train_step",
    ];

    /// Parses a text message into a command.
    ///
    /// # Arguments
    /// * `text` - The raw message as received from the client.
    ///
    /// # Returns
    /// `Ok(None)` if the message is valid json but carries an unknown (or no) `type` tag, or an
    /// error if it isn't json or its payload doesn't match the tagged command.
    pub fn parse(text: &str) -> serde_json::Result<Option<Self>> {
        let value: Value = serde_json::from_str(text)?;

        let known = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|kind| Self::KINDS.contains(&kind));

        if !known {
            return Ok(None);
        }

        serde_json::from_value(value).map(Some)
    }
}

/// The payload of an `architecture_synced` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSynced {
    pub hidden_layers: Vec<usize>,
}

/// A json message sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Config {
        version: String,
        author: String,
    },
    StepResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<ModelState>,
        metrics: StepMetrics,
    },
    DataGenerated {
        data: Vec<DataPoint>,
    },
    ArchitectureSynced {
        payload: ArchitectureSynced,
    },
    Error {
        message: String,
    },
}

impl Reply {
    /// Creates a new `Error` reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serializes this reply into its json text form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
