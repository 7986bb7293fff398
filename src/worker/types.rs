//! Core trait for annealing workers.

use std::io::{self, Write};

use crate::balance::WorkerId;

/// A participant running its own annealing search over a budget of seeds.
///
/// The coordinator never looks inside the search; it only sees the pending
/// count, moves seeds between workers, and reads the best length once the
/// population has converged.
///
/// # Examples
///
/// ```
/// use std::io::{self, Write};
/// use u_distanneal::worker::Worker;
///
/// struct Countdown { pending: u64 }
///
/// impl Worker for Countdown {
///     fn pending(&self) -> u64 { self.pending }
///     fn anneal(&mut self, _temperature: f64) { self.pending = self.pending.saturating_sub(1); }
///     fn donate(&mut self, amount: u64) { self.pending -= amount; }
///     fn receive(&mut self, amount: u64) { self.pending += amount; }
///     fn best_length(&self) -> f64 { 0.0 }
///     fn output(&self, out: &mut dyn Write) -> io::Result<()> { writeln!(out, "done") }
/// }
/// ```
pub trait Worker: Send {
    /// Seeds not yet processed.
    fn pending(&self) -> u64;

    /// Runs one local search pass at `temperature`, consuming seeds.
    fn anneal(&mut self, temperature: f64);

    /// Hands `amount` seeds to another worker.
    ///
    /// Callers guarantee `amount <= self.pending()`.
    fn donate(&mut self, amount: u64);

    /// Takes ownership of `amount` donated seeds.
    fn receive(&mut self, amount: u64);

    /// Length of the best tour found so far.
    fn best_length(&self) -> f64;

    /// Writes the final result. Only called on the global winner.
    fn output(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Best result reported by one worker at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerResult {
    pub worker_id: WorkerId,
    pub best_length: f64,
}
