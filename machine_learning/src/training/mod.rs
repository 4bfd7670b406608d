mod batch;
mod trainer;

pub use batch::Batch;
pub use trainer::Trainer;
