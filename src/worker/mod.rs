//! Worker-side capabilities consumed by the coordinator.

mod types;

pub use types::{Worker, WorkerResult};
