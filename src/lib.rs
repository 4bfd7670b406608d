pub mod broadcast;
pub mod configs;
pub mod connection;
mod error;
pub mod render;
pub mod server;
pub mod session;

pub use error::{PlaygroundErr, Result};
