//! The per-connection training session: shared state, background worker, optimizer reuse and
//! output layer adaptation.

mod adapter;
mod optimizer_cache;
mod reports;
mod state;
mod training;

pub use adapter::{rebuild, resize_output};
pub use optimizer_cache::OptimizerCache;
pub use reports::{Drained, LossReport, REPORT_CAPACITY, ReportQueue};
pub use state::{Session, Snapshot};
pub use training::{BUSY_SLEEP, IDLE_SLEEP, JOIN_TIMEOUT};
