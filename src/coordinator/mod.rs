//! Coordinator: global annealing schedule and seed rebalancing rounds.
//!
//! The coordinator (participant 0) never searches itself. Each round it
//! cools the shared temperature, gathers the pending seed counts of all
//! workers, and moves seeds from overloaded to underloaded workers so that
//! slow and fast workers finish together. Once no seeds are left anywhere,
//! the worker holding the shortest tour writes the result.

mod config;
mod runner;
#[cfg(test)]
mod scripted;
mod selector;
mod types;

pub use config::CoordinatorConfig;
pub use runner::{Coordinator, RoundOrchestrator};
pub use selector::FinalSelector;
pub use types::{CoordinatorResult, RoundOutcome, RoundReport, RunSummary};
