use comms::specs::OptimizerSpec;
use log::debug;
use machine_learning::optimization::{self, Optimizer};

use crate::configs::TrainingConfig;

/// Everything an optimizer's state depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    version: u64,
    kind: OptimizerSpec,
    learning_rate: f32,
    regularization: f32,
}

/// Keeps a single optimizer alive across training steps so its moment estimates survive, and
/// replaces it whenever the model or the optimization hyperparameters change.
#[derive(Default)]
pub struct OptimizerCache {
    key: Option<CacheKey>,
    optimizer: Option<Box<dyn Optimizer + Send>>,
    initializations: usize,
}

impl OptimizerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the optimizer to step with.
    ///
    /// # Arguments
    /// * `version` - The version of the model about to be stepped.
    /// * `config` - The current hyperparameters.
    /// * `len` - The amount of parameters of the model.
    ///
    /// # Returns
    /// The cached optimizer if none of the above changed since the last call, or a fresh one.
    pub fn get(
        &mut self,
        version: u64,
        config: &TrainingConfig,
        len: usize,
    ) -> &mut (dyn Optimizer + Send) {
        let key = CacheKey {
            version,
            kind: config.optimizer,
            learning_rate: config.learning_rate,
            regularization: config.regularization,
        };

        if self.key != Some(key) {
            self.key = Some(key);
            self.optimizer = None;
        }

        let initializations = &mut self.initializations;
        let optimizer = self.optimizer.get_or_insert_with(|| {
            *initializations += 1;
            debug!(version = version; "fresh {} optimizer", String::from(key.kind));
            optimization::build(key.kind, len, key.learning_rate, key.regularization)
        });

        &mut **optimizer
    }

    /// Returns how many optimizers this cache has built.
    pub fn initializations(&self) -> usize {
        self.initializations
    }
}
