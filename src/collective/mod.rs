//! Collective communication substrate.
//!
//! Every call is a blocking rendezvous of the coordinator and all workers.
//! An `Err` from any of them means a participant failed to arrive and the
//! run is aborted; there is no partial-participant recovery.

mod local;

pub use local::LocalCollective;

use crate::balance::{Transfer, WorkerId, WorkerLoad};
use crate::error::Result;
use crate::worker::WorkerResult;

/// Barrier, gather, scatter and buffer synchronization between the
/// coordinator (participant 0) and workers `1..=m`.
pub trait Collective {
    /// Number of workers, excluding the coordinator.
    fn workers(&self) -> usize;

    /// Blocks until every participant has arrived.
    fn barrier(&mut self) -> Result<()>;

    /// Lets every worker finish its pass at `temperature`, then collects one
    /// load per worker. Slot `k` holds worker `k + 1`.
    fn gather_loads(&mut self, temperature: f64) -> Result<Vec<WorkerLoad>>;

    /// Delivers `outboxes[k]` to worker `k + 1`. Each outbox only holds
    /// instructions whose source is that worker.
    fn scatter(&mut self, outboxes: Vec<Vec<Transfer>>) -> Result<()>;

    /// Commits the scattered instructions: donors release seeds, receivers
    /// take them. No worker starts its next pass before this returns.
    fn sync_buffer(&mut self) -> Result<()>;

    /// Collects every worker's best result. Slot `k` holds worker `k + 1`.
    fn gather_results(&mut self) -> Result<Vec<WorkerResult>>;

    /// Asks `winner` to write the final result.
    fn emit_output(&mut self, winner: WorkerId) -> Result<()>;
}
