pub mod arch;
pub mod dataset;
pub mod error;
pub mod initialization;
pub mod optimization;
pub mod training;
mod wire;

pub use error::{MlErr, Result};
