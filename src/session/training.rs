use std::{sync::Arc, thread, time::Duration};

use log::{debug, info, warn};
use machine_learning::{
    arch::Network,
    training::{Batch, Trainer},
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use super::{LossReport, OptimizerCache, Session, Snapshot};
use crate::Result;

/// The pause between two steps while there's something to train.
pub const BUSY_SLEEP: Duration = Duration::from_micros(300);

/// The pause between two checks while there's no model or no data.
pub const IDLE_SLEEP: Duration = Duration::from_millis(100);

/// The longest `stop` waits for the worker to finish.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// A running training worker.
pub(super) struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Session {
    /// Starts training in the background, building the model first if there's none.
    ///
    /// # Returns
    /// `false` if a worker was already running, in which case nothing is done.
    pub fn start(self: &Arc<Self>) -> Result<bool> {
        let mut inner = self.lock();
        if inner.worker.is_some() {
            return Ok(false);
        }

        inner.ensure_model()?;
        inner.adapt()?;

        // Every run gets its own token, so a worker detached by a timed out stop never resumes.
        let cancel = CancellationToken::new();
        let handle = tokio::task::spawn_blocking({
            let session = Arc::clone(self);
            let cancel = cancel.clone();
            move || session.train_until(&cancel)
        });

        inner.worker = Some(Worker { cancel, handle });
        info!(session = self.id().to_string(); "training started");
        Ok(true)
    }

    /// Same as `stop_within` with a bound of `JOIN_TIMEOUT`.
    pub async fn stop(&self) -> bool {
        self.stop_within(JOIN_TIMEOUT).await
    }

    /// Signals the worker to stop and waits for it at most `bound`.
    ///
    /// The session is inactive once this returns, even if the worker didn't finish in time, in
    /// which case it's detached and exits on its own at its next iteration.
    ///
    /// # Returns
    /// `false` if no worker was running.
    pub async fn stop_within(&self, bound: Duration) -> bool {
        let worker = self.lock().worker.take();
        let Some(Worker { cancel, handle }) = worker else {
            return false;
        };

        cancel.cancel();

        match time::timeout(bound, handle).await {
            Ok(Ok(())) => info!(session = self.id().to_string(); "training stopped"),
            Ok(Err(e)) => warn!(session = self.id().to_string(); "training worker failed: {e}"),
            Err(_) => warn!(session = self.id().to_string(); "training worker detached after join timeout"),
        }

        true
    }

    /// Signals the worker to stop without waiting for it.
    ///
    /// # Returns
    /// `false` if no worker was running.
    pub fn cancel(&self) -> bool {
        let worker = self.lock().worker.take();
        let Some(Worker { cancel, .. }) = worker else {
            return false;
        };

        cancel.cancel();
        info!(session = self.id().to_string(); "training cancelled");
        true
    }

    /// The worker loop, runs until `cancel` is triggered.
    fn train_until(&self, cancel: &CancellationToken) {
        let mut rng = StdRng::from_os_rng();
        let mut trainer = Trainer::new();
        let mut cache = OptimizerCache::new();
        let mut working: Option<(u64, Network)> = None;

        while !cancel.is_cancelled() {
            let Snapshot {
                model,
                version,
                data,
                config,
            } = self.snapshot();

            let Some(model) = model.filter(|_| !data.is_empty()) else {
                thread::sleep(IDLE_SLEEP);
                continue;
            };

            // Keep stepping the local copy while nobody replaced the model.
            if working.as_ref().is_none_or(|(v, _)| *v != version) {
                working = Some((version, Network::clone(&model)));
            }

            let Some((_, network)) = working.as_mut() else {
                continue;
            };

            let batch = Batch::sample(&data, config.batch_size, &mut rng);
            let optimizer = cache.get(version, &config, network.size());

            match trainer.step(network, optimizer, &batch, &mut rng) {
                Ok(loss) if self.publish(version, network) => {
                    if !self.reports().push(LossReport::new(loss)) {
                        debug!(session = self.id().to_string(); "report queue full, dropping loss");
                    }

                    thread::sleep(BUSY_SLEEP);
                }
                Ok(_) => working = None,
                Err(e) => {
                    warn!(session = self.id().to_string(); "dropping training step: {e}");
                    working = None;
                    thread::sleep(IDLE_SLEEP);
                }
            }
        }

        debug!(session = self.id().to_string(); "training worker exiting");
    }
}
