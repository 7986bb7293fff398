//! Load vectors and transfer plans.

/// Identifier of a participant. `0` is the coordinator; workers are `1..=m`.
pub type WorkerId = usize;

/// Pending seed count reported by one worker in a gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerLoad {
    /// Reporting worker (`>= 1`).
    pub worker_id: WorkerId,
    /// Seeds the worker still has to process.
    pub pending: u64,
}

impl WorkerLoad {
    pub fn new(worker_id: WorkerId, pending: u64) -> Self {
        Self { worker_id, pending }
    }
}

/// Move `amount` seeds from `source` to `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transfer {
    pub source: WorkerId,
    pub destination: WorkerId,
    /// Always positive.
    pub amount: u64,
}

/// One round's balancing decision: the fair share of every worker and the
/// ordered instructions that realise it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalancePlan {
    /// Target per worker, index `worker_id - 1`.
    pub(crate) targets: Vec<u64>,
    /// Instructions in emission order.
    pub(crate) transfers: Vec<Transfer>,
}

impl BalancePlan {
    /// Targets in worker id order.
    pub fn targets(&self) -> &[u64] {
        &self.targets
    }

    /// Target of a single worker, `None` for ids outside `1..=m`.
    pub fn target(&self, worker_id: WorkerId) -> Option<u64> {
        worker_id
            .checked_sub(1)
            .and_then(|idx| self.targets.get(idx))
            .copied()
    }

    /// All instructions in the order they were emitted.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Total number of seeds that change hands.
    pub fn moved(&self) -> u64 {
        self.transfers.iter().map(|t| t.amount).sum()
    }

    /// Instructions whose source is `worker_id`, in emission order.
    pub fn outbound(&self, worker_id: WorkerId) -> impl Iterator<Item = &Transfer> {
        self.transfers
            .iter()
            .filter(move |t| t.source == worker_id)
    }

    /// Splits the plan into one outbox per worker (index `worker_id - 1`),
    /// the shape a scatter delivers.
    pub fn scatter_buffers(&self) -> Vec<Vec<Transfer>> {
        let mut buffers = vec![Vec::new(); self.targets.len()];
        for transfer in &self.transfers {
            buffers[transfer.source - 1].push(*transfer);
        }
        buffers
    }

    /// Applies every instruction to `loads` in emitted order.
    ///
    /// `loads` must be indexed like the gather that produced this plan.
    pub fn apply(&self, loads: &mut [WorkerLoad]) {
        for t in &self.transfers {
            loads[t.source - 1].pending -= t.amount;
            loads[t.destination - 1].pending += t.amount;
        }
    }
}
