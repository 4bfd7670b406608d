mod dataset;
mod model;
mod training;

pub use dataset::DataPoint;
pub use model::{ActivationSpec, ArchitectureSpec, ModelState};
pub use training::{ConfigPatch, OptimizerSpec, StepMetrics};
