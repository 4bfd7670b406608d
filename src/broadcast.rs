use std::{sync::Arc, time::Duration};

use comms::{MapFrame, Reply, specs::StepMetrics};
use log::warn;
use tokio::time::Instant;

use crate::{render, session::Session};

/// The least time between two full weight exports.
pub const EXPORT_PERIOD: Duration = Duration::from_secs(1);

/// What a broadcaster tick has to send to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub reply: Reply,
    pub frame: Option<MapFrame>,
}

/// Turns the training worker's loss reports into throttled client updates.
///
/// Meant to be ticked periodically from the connection's event loop, never blocks.
pub struct Broadcaster {
    session: Arc<Session>,
    map_size: u16,
    last_export: Option<Instant>,
}

impl Broadcaster {
    /// Creates a new `Broadcaster`.
    ///
    /// # Arguments
    /// * `session` - The session to report on.
    /// * `map_size` - The edge of the classification map grid.
    pub fn new(session: Arc<Session>, map_size: u16) -> Self {
        Self {
            session,
            map_size,
            last_export: None,
        }
    }

    /// Same as `tick_at` at the current instant.
    pub fn tick(&mut self) -> Option<Update> {
        self.tick_at(Instant::now())
    }

    /// Drains the pending loss reports and builds the update for the latest one.
    ///
    /// # Arguments
    /// * `now` - The current instant, used to throttle weight exports.
    ///
    /// # Returns
    /// `None` if no step was made since the last tick.
    pub fn tick_at(&mut self, now: Instant) -> Option<Update> {
        let drained = self.session.reports().drain();
        let latest = drained.latest?;

        let model = self.session.model();
        let export_due = self
            .last_export
            .is_none_or(|last| now.saturating_duration_since(last) >= EXPORT_PERIOD);

        let state = match &model {
            Some(model) if export_due => {
                self.last_export = Some(now);
                Some(model.to_state())
            }
            _ => None,
        };

        let frame = model.and_then(|model| {
            render::render_map(&model, self.map_size, self.map_size)
                .inspect_err(|e| warn!(session = self.session.id().to_string(); "failed to render map: {e}"))
                .ok()
        });

        let reply = Reply::StepResult {
            model: state,
            metrics: StepMetrics {
                loss: latest.loss,
                step: drained.steps,
            },
        };

        Some(Update { reply, frame })
    }

    /// Forgets the last export, so the next update carries the weights.
    pub fn reset(&mut self) {
        self.last_export = None;
    }
}
