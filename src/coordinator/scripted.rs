//! Scripted in-memory substrate for coordinator tests.

use std::collections::VecDeque;

use crate::balance::{Transfer, WorkerId, WorkerLoad};
use crate::collective::Collective;
use crate::error::{Error, Result};
use crate::worker::WorkerResult;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Barrier,
    Gather(f64),
    Scatter(Vec<Vec<Transfer>>),
    Sync,
    Results,
    Emit(WorkerId),
}

/// Replays one load vector per gather and records every call.
pub(crate) struct ScriptedCollective {
    workers: usize,
    loads: VecDeque<Vec<u64>>,
    lengths: Vec<f64>,
    result_ids: Option<Vec<WorkerId>>,
    pub(crate) calls: Vec<Call>,
    /// Fail the `n`-th barrier (1-based).
    pub(crate) fail_barrier: Option<usize>,
    barriers: usize,
}

impl ScriptedCollective {
    pub(crate) fn new(workers: usize, loads: Vec<Vec<u64>>) -> Self {
        Self {
            workers,
            loads: loads.into(),
            lengths: vec![0.0; workers],
            result_ids: None,
            calls: Vec::new(),
            fail_barrier: None,
            barriers: 0,
        }
    }

    pub(crate) fn with_lengths(mut self, lengths: Vec<f64>) -> Self {
        self.lengths = lengths;
        self
    }

    /// Reports results under these ids instead of `slot + 1`.
    pub(crate) fn with_result_ids(mut self, ids: Vec<WorkerId>) -> Self {
        self.result_ids = Some(ids);
        self
    }

    pub(crate) fn gathers(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Gather(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Collective for ScriptedCollective {
    fn workers(&self) -> usize {
        self.workers
    }

    fn barrier(&mut self) -> Result<()> {
        self.barriers += 1;
        self.calls.push(Call::Barrier);
        if self.fail_barrier == Some(self.barriers) {
            return Err(Error::Substrate("participant missing at barrier".into()));
        }
        Ok(())
    }

    fn gather_loads(&mut self, temperature: f64) -> Result<Vec<WorkerLoad>> {
        self.calls.push(Call::Gather(temperature));
        let counts = self
            .loads
            .pop_front()
            .ok_or_else(|| Error::Substrate("script exhausted".into()))?;
        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(slot, pending)| WorkerLoad::new(slot + 1, pending))
            .collect())
    }

    fn scatter(&mut self, outboxes: Vec<Vec<Transfer>>) -> Result<()> {
        self.calls.push(Call::Scatter(outboxes));
        Ok(())
    }

    fn sync_buffer(&mut self) -> Result<()> {
        self.calls.push(Call::Sync);
        Ok(())
    }

    fn gather_results(&mut self) -> Result<Vec<WorkerResult>> {
        self.calls.push(Call::Results);
        Ok(self
            .lengths
            .iter()
            .enumerate()
            .map(|(slot, &best_length)| WorkerResult {
                worker_id: self
                    .result_ids
                    .as_ref()
                    .map_or(slot + 1, |ids| ids[slot]),
                best_length,
            })
            .collect())
    }

    fn emit_output(&mut self, winner: WorkerId) -> Result<()> {
        self.calls.push(Call::Emit(winner));
        Ok(())
    }
}
