use std::sync::Arc;

use comms::specs::{ConfigPatch, DataPoint};
use log::debug;
use machine_learning::{
    arch::{Architecture, Network},
    dataset,
};
use parking_lot::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{ReportQueue, adapter, training::Worker};
use crate::{Result, configs::TrainingConfig};

/// A consistent read of the session's model, dataset and config, taken under a single lock.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub model: Option<Arc<Network>>,
    /// The version of `model`, bumped every time the model is replaced or resized.
    pub version: u64,
    pub data: Arc<[DataPoint]>,
    pub config: TrainingConfig,
}

pub(super) struct Inner {
    model: Option<Arc<Network>>,
    version: u64,
    data: Arc<[DataPoint]>,
    config: TrainingConfig,
    architecture: Architecture,
    pub(super) worker: Option<Worker>,
}

impl Inner {
    fn replace_model(&mut self, network: Network) -> Arc<Network> {
        let model = Arc::new(network);

        self.version += 1;
        self.model = Some(Arc::clone(&model));
        model
    }

    /// Resizes the output layer of the model, if any, to the width the dataset requires.
    pub(super) fn adapt(&mut self) -> Result<bool> {
        let Some(model) = &self.model else {
            return Ok(false);
        };

        let required = dataset::required_classes(&self.data);
        if model.output_dim() == required {
            return Ok(false);
        }

        let mut network = Network::clone(model);
        adapter::resize_output(&mut network, required, &mut rand::rng())?;
        self.replace_model(network);
        Ok(true)
    }

    /// Builds a model out of the session's architecture if there's none yet.
    pub(super) fn ensure_model(&mut self) -> Result<()> {
        if self.model.is_none() {
            let network = adapter::rebuild(None, self.architecture.clone(), &mut rand::rng())?;
            self.replace_model(network);
        }

        Ok(())
    }
}

/// The mutable context of a single client: its model, dataset, hyperparameters and training
/// worker.
///
/// Every read and write goes through one lock, and the model is never mutated in place: writers
/// swap in a new `Arc` so readers holding an older snapshot keep a consistent model.
pub struct Session {
    id: Uuid,
    inner: Mutex<Inner>,
    reports: ReportQueue,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a new `Session` without model nor data, and the default config and architecture.
    pub fn new() -> Self {
        let inner = Inner {
            model: None,
            version: 0,
            data: Arc::from([]),
            config: TrainingConfig::default(),
            architecture: Architecture::default(),
            worker: None,
        };

        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(inner),
            reports: ReportQueue::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The queue the training worker reports its losses to.
    pub fn reports(&self) -> &ReportQueue {
        &self.reports
    }

    /// Merges a partial config update.
    ///
    /// Architecture keys are applied over the session's architecture and validated before
    /// anything is changed. The current model keeps its shape, the next one built takes it.
    pub fn update_config(&self, patch: &ConfigPatch) -> Result<()> {
        let mut inner = self.lock();

        let staged = if patch.reshapes() {
            let spec = patch.architecture_over(inner.architecture.to_spec());
            Some(Architecture::try_from(&spec)?)
        } else {
            None
        };

        inner.config.merge(patch);
        if let Some(arch) = staged {
            inner.architecture = arch;
            debug!(session = self.id.to_string(); "architecture staged for the next model");
        }

        Ok(())
    }

    pub fn config(&self) -> TrainingConfig {
        self.lock().config
    }

    /// Replaces the whole dataset.
    pub fn set_data(&self, points: Vec<DataPoint>) {
        let len = points.len();
        self.lock().data = Arc::from(points);
        debug!(session = self.id.to_string(), points = len; "dataset replaced");
    }

    pub fn data(&self) -> Arc<[DataPoint]> {
        Arc::clone(&self.lock().data)
    }

    /// Replaces the model.
    ///
    /// # Returns
    /// The version of the new model.
    pub fn set_model(&self, network: Network) -> u64 {
        let mut inner = self.lock();
        inner.replace_model(network);
        inner.version
    }

    pub fn model(&self) -> Option<Arc<Network>> {
        self.lock().model.clone()
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// The architecture new models are built with.
    pub fn architecture(&self) -> Architecture {
        self.lock().architecture.clone()
    }

    /// Takes a consistent snapshot of the model, dataset and config.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();

        Snapshot {
            model: inner.model.clone(),
            version: inner.version,
            data: Arc::clone(&inner.data),
            config: inner.config,
        }
    }

    /// Discards the pending loss reports and zeroes the step counter.
    pub fn reset_counters(&self) {
        self.reports.reset();
    }

    /// Stores the result of a training step, unless the model it started from was replaced in
    /// the meantime.
    ///
    /// # Arguments
    /// * `version` - The version of the model the step was taken on.
    /// * `network` - The updated model.
    ///
    /// # Returns
    /// Whether the model got stored.
    pub fn publish(&self, version: u64, network: &Network) -> bool {
        let mut inner = self.lock();
        if inner.version != version || inner.model.is_none() {
            return false;
        }

        inner.model = Some(Arc::new(network.clone()));
        true
    }

    /// Resizes the model's output layer, if there's a model, to the width the dataset requires.
    ///
    /// # Returns
    /// Whether the model changed.
    pub fn adapt_output(&self) -> Result<bool> {
        self.lock().adapt()
    }

    /// Replaces the architecture and rebuilds the model with it, keeping the layers whose shape
    /// didn't change, then adapts the output width to the dataset.
    ///
    /// # Returns
    /// The new model.
    pub fn change_architecture(&self, arch: Architecture) -> Result<Arc<Network>> {
        let mut inner = self.lock();

        let mut rng = rand::rng();
        let mut network = adapter::rebuild(inner.model.as_deref(), arch.clone(), &mut rng)?;
        adapter::resize_output(&mut network, dataset::required_classes(&inner.data), &mut rng)?;

        inner.architecture = arch;
        debug!(session = self.id.to_string(); "architecture changed");
        Ok(inner.replace_model(network))
    }

    /// Discards the model and builds a fresh one with the session's architecture, adapted to
    /// the dataset.
    pub fn reset_model(&self) -> Result<()> {
        let mut inner = self.lock();

        inner.model = None;
        inner.ensure_model()?;
        inner.adapt()?;
        Ok(())
    }

    /// Whether a training worker is currently running for this session.
    pub fn is_active(&self) -> bool {
        self.lock().worker.is_some()
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock()
    }
}
