use std::sync::Arc;

use comms::{
    Command, MapFrame, Reply,
    msg::ArchitectureSynced,
    specs::{ArchitectureSpec, ConfigPatch, DataPoint, ModelState, StepMetrics},
};
use log::{debug, info, warn};
use machine_learning::{
    arch::{Architecture, Network},
    dataset::{self, Distribution},
    optimization,
    training::{Batch, Trainer},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    Result,
    broadcast::{Broadcaster, Update},
    configs::TrainingConfig,
    render,
    session::{self, Session},
};

/// The amount of points of every generated dataset.
pub const GENERATED_SAMPLES: usize = 200;

/// The most classes a generated dataset can have.
pub const MAX_GENERATED_CLASSES: usize = dataset::MAX_CLASSES;

/// A message on its way to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Reply(Reply),
    Frame(MapFrame),
}

/// The server side of a client connection: applies its commands to its own session and
/// forwards the broadcaster's updates.
pub struct Connection {
    session: Arc<Session>,
    broadcaster: Broadcaster,
    outbox: UnboundedSender<Outbound>,
    map_size: u16,
}

impl Connection {
    /// Creates a new `Connection` with a fresh session.
    ///
    /// # Arguments
    /// * `map_size` - The edge of the classification map grid.
    /// * `outbox` - Where the messages for the client are sent to.
    pub fn new(map_size: u16, outbox: UnboundedSender<Outbound>) -> Self {
        let session = Arc::new(Session::new());

        Self {
            broadcaster: Broadcaster::new(Arc::clone(&session), map_size),
            session,
            outbox,
            map_size,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Sends the server's version and author.
    pub fn greet(&self) {
        self.send(Reply::Config {
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: env!("CARGO_PKG_AUTHORS").to_string(),
        });
    }

    /// Handles a text message from the client.
    ///
    /// Undecodable messages and failed commands are logged, unknown message types are ignored.
    pub async fn handle_text(&mut self, text: &str) {
        let command = match Command::parse(text) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                warn!(session = self.session.id().to_string(); "undecodable message: {e}");
                return;
            }
        };

        if let Err(e) = self.handle(command).await {
            warn!(session = self.session.id().to_string(); "command failed: {e}");
        }
    }

    /// Applies a command to the session.
    pub async fn handle(&mut self, command: Command) -> Result<()> {
        debug!(session = self.session.id().to_string(); "handling {command:?}");

        match command {
            Command::StartTraining => {
                self.session.start()?;
            }
            Command::StopTraining => {
                self.session.stop().await;
            }
            Command::Reset => self.reset().await?,
            Command::UpdateConfig { payload } => self.update_config(&payload),
            Command::UpdateData { data } => self.update_data(data).await?,
            Command::UpdateArchitecture { payload } => self.update_architecture(payload).await?,
            Command::GenerateData {
                distribution,
                num_classes,
            } => self.generate_data(&distribution, num_classes).await?,
            Command::TrainStep {
                config,
                model,
                data,
            } => self.train_step(config, model, data)?,
        }

        Ok(())
    }

    /// Runs a broadcaster tick, forwarding its update if there's one.
    pub fn tick(&mut self) {
        let Some(Update { reply, frame }) = self.broadcaster.tick() else {
            return;
        };

        self.send(reply);
        if let Some(frame) = frame {
            self.send(frame);
        }
    }

    /// Stops the session's worker, must be called once the client is gone.
    pub async fn close(&self) {
        self.session.stop().await;
    }

    fn update_config(&self, patch: &ConfigPatch) {
        if let Err(e) = self.session.update_config(patch) {
            self.send(Reply::error(e.to_string()));
        }
    }

    /// Rebuilds the model with the session's architecture, the last one staged through
    /// `update_config` or applied through `update_architecture`, `[10, 5]` otherwise.
    async fn reset(&mut self) -> Result<()> {
        self.session.stop().await;
        self.session.reset_counters();
        self.broadcaster.reset();
        self.session.reset_model()
    }

    async fn update_data(&mut self, data: Vec<DataPoint>) -> Result<()> {
        if let Err(e) = dataset::check_labels(&data) {
            self.send(Reply::error(e.to_string()));
            return Ok(());
        }

        self.replace_data(data).await
    }

    /// Pauses training, swaps the dataset, adapts the output layer and resumes.
    async fn replace_data(&mut self, data: Vec<DataPoint>) -> Result<()> {
        let was_active = self.session.stop().await;

        self.session.set_data(data);
        self.session.adapt_output()?;

        if was_active {
            self.session.start()?;
        }

        Ok(())
    }

    async fn update_architecture(&mut self, spec: ArchitectureSpec) -> Result<()> {
        let arch = match Architecture::try_from(&spec) {
            Ok(arch) => arch,
            Err(e) => {
                self.send(Reply::error(e.to_string()));
                return Ok(());
            }
        };

        self.session.stop().await;
        let model = self.session.change_architecture(arch)?;

        self.send(Reply::ArchitectureSynced {
            payload: ArchitectureSynced {
                hidden_layers: model.hidden_layers().to_vec(),
            },
        });

        Ok(())
    }

    async fn generate_data(&mut self, distribution: &str, num_classes: usize) -> Result<()> {
        let distribution: Distribution = match distribution.parse() {
            Ok(distribution) => distribution,
            Err(e) => {
                self.send(Reply::error(e.to_string()));
                return Ok(());
            }
        };

        let num_classes = num_classes.clamp(1, MAX_GENERATED_CLASSES);
        let data = distribution.generate(GENERATED_SAMPLES, num_classes, &mut rand::rng())?;

        self.replace_data(data.clone()).await?;
        self.send(Reply::DataGenerated { data });
        Ok(())
    }

    /// Trains a copy of the given model for a single step, without touching the session.
    fn train_step(
        &self,
        config: Option<ConfigPatch>,
        state: Option<ModelState>,
        data: Option<Vec<DataPoint>>,
    ) -> Result<()> {
        let (Some(config), Some(state), Some(data)) = (config, state, data) else {
            debug!(session = self.session.id().to_string(); "incomplete train_step, dropping");
            return Ok(());
        };

        if data.is_empty() {
            return Ok(());
        }

        if let Err(e) = dataset::check_labels(&data) {
            self.send(Reply::error(e.to_string()));
            return Ok(());
        }

        let mut rng = rand::rng();
        let arch = Architecture::try_from(&config.architecture_over(ArchitectureSpec::default()))?;

        let width = Network::output_dim_of(&state).unwrap_or(dataset::MIN_CLASSES);
        let mut network = Network::random(arch, width, &mut rng)?;
        network.load_state(&state);
        session::resize_output(&mut network, dataset::required_classes(&data), &mut rng)?;

        let hyper = TrainingConfig::default().merged(&config);
        let mut optimizer = optimization::build(
            hyper.optimizer,
            network.size(),
            hyper.learning_rate,
            hyper.regularization,
        );

        let batch = Batch::from_points(&data);
        let loss = match Trainer::new().step(&mut network, &mut *optimizer, &batch, &mut rng) {
            Ok(loss) => loss,
            Err(e) => {
                warn!(session = self.session.id().to_string(); "dropping train_step: {e}");
                return Ok(());
            }
        };

        self.send(Reply::StepResult {
            model: Some(network.to_state()),
            metrics: StepMetrics { loss, step: 1 },
        });
        self.send(render::render_map(&network, self.map_size, self.map_size)?);
        Ok(())
    }

    fn send(&self, msg: impl Into<Outbound>) {
        if self.outbox.send(msg.into()).is_err() {
            debug!(session = self.session.id().to_string(); "client gone, dropping message");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Reached without `close` when the connection's task dies.
        if self.session.cancel() {
            info!(session = self.session.id().to_string(); "connection dropped, worker cancelled");
        }
    }
}

impl From<Reply> for Outbound {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}

impl From<MapFrame> for Outbound {
    fn from(frame: MapFrame) -> Self {
        Self::Frame(frame)
    }
}
