pub mod activations;
mod architecture;
pub mod loss;
mod network;

pub use architecture::Architecture;
pub use network::{INPUT_DIM, Network};
