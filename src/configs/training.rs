use comms::specs::{ConfigPatch, OptimizerSpec};

/// The hyperparameters a session trains with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub learning_rate: f32,
    pub optimizer: OptimizerSpec,
    pub regularization: f32,
    /// The amount of points per step, `0` meaning the full dataset.
    pub batch_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            optimizer: OptimizerSpec::Adam,
            regularization: 0.,
            batch_size: 0,
        }
    }
}

impl TrainingConfig {
    /// Merges a partial update, leaving the keys it doesn't carry untouched.
    ///
    /// The architecture keys are not hyperparameters and are ignored here.
    pub fn merge(&mut self, patch: &ConfigPatch) {
        let ConfigPatch {
            learning_rate,
            optimizer,
            regularization,
            batch_size,
            ..
        } = *patch;

        if let Some(learning_rate) = learning_rate {
            self.learning_rate = learning_rate;
        }
        if let Some(optimizer) = optimizer {
            self.optimizer = optimizer;
        }
        if let Some(regularization) = regularization {
            self.regularization = regularization;
        }
        if let Some(batch_size) = batch_size {
            self.batch_size = batch_size;
        }
    }

    /// Returns a copy of this config with `patch` merged in.
    pub fn merged(mut self, patch: &ConfigPatch) -> Self {
        self.merge(patch);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_merge() {
        let mut config = TrainingConfig {
            optimizer: OptimizerSpec::RmsProp,
            regularization: 0.1,
            batch_size: 16,
            ..Default::default()
        };

        config.merge(&ConfigPatch {
            learning_rate: Some(0.5),
            ..Default::default()
        });

        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.optimizer, OptimizerSpec::RmsProp);
        assert_eq!(config.regularization, 0.1);
        assert_eq!(config.batch_size, 16);
    }

    #[test]
    fn empty_patch() {
        let config = TrainingConfig::default().merged(&ConfigPatch::default());
        assert_eq!(config, TrainingConfig::default());
    }
}
