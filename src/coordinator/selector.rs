//! Global winner selection after convergence.

use log::debug;

use crate::collective::Collective;
use crate::error::{Error, Result};
use crate::worker::WorkerResult;

/// Picks the worker holding the shortest tour and lets it emit the result.
pub struct FinalSelector;

impl FinalSelector {
    /// Returns the first result with the minimum `best_length`, in gather
    /// order. Ties therefore go to the lowest worker id.
    pub fn select(results: &[WorkerResult]) -> Result<WorkerResult> {
        let mut iter = results.iter();
        let mut best = *iter.next().ok_or(Error::NoWorkers)?;
        if best.best_length.is_nan() {
            return Err(Error::invariant(format!(
                "worker {} reported a NaN tour length",
                best.worker_id
            )));
        }

        for result in iter {
            if result.best_length.is_nan() {
                return Err(Error::invariant(format!(
                    "worker {} reported a NaN tour length",
                    result.worker_id
                )));
            }
            if result.best_length < best.best_length {
                best = *result;
            }
        }
        Ok(best)
    }

    /// Barrier, gather of every worker's best result, selection, and output
    /// on the winner.
    pub fn finish<C: Collective + ?Sized>(collective: &mut C) -> Result<WorkerResult> {
        collective.barrier()?;

        let results = collective.gather_results()?;
        if results.len() != collective.workers() {
            return Err(Error::Substrate(format!(
                "gathered {} results from {} workers",
                results.len(),
                collective.workers()
            )));
        }
        for (slot, result) in results.iter().enumerate() {
            if result.worker_id != slot + 1 {
                return Err(Error::invariant(format!(
                    "result slot {} holds worker {}",
                    slot + 1,
                    result.worker_id
                )));
            }
        }
        let winner = Self::select(&results)?;
        debug!(worker = winner.worker_id, length = winner.best_length; "winner selected");

        collective.emit_output(winner.worker_id)?;
        Ok(winner)
    }
}
