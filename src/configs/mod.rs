mod server;
mod training;

pub use server::ServerConfig;
pub use training::TrainingConfig;
