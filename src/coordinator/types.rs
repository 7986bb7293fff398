//! Round reports and run results.

use crate::worker::WorkerResult;

/// What one round observed and did.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundReport {
    /// 1-based round number.
    pub round: usize,
    /// Temperature the workers' passes ran at.
    pub temperature: f64,
    /// Pending seeds summed over the gather.
    pub total_pending: u64,
    /// Instructions issued this round.
    pub transfers: usize,
    /// Seeds moved this round.
    pub moved: u64,
}

/// Outcome of [`RoundOrchestrator::run_round`](super::RoundOrchestrator::run_round).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundOutcome {
    /// Work remains; the plan was scattered and committed.
    Rebalanced(RoundReport),
    /// The gather observed zero pending seeds. Nothing was scattered.
    Converged(RoundReport),
}

impl RoundOutcome {
    pub fn report(&self) -> &RoundReport {
        match self {
            RoundOutcome::Rebalanced(r) | RoundOutcome::Converged(r) => r,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, RoundOutcome::Converged(_))
    }
}

/// Totals of a round loop driven to convergence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    /// Rounds executed, including the converging one.
    pub rounds: usize,
    /// Temperature of the last round.
    pub final_temperature: f64,
    /// Instructions issued over the whole run.
    pub transfers: usize,
    /// Seeds moved over the whole run.
    pub moved: u64,
}

/// Result of a complete coordinated run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinatorResult {
    pub summary: RunSummary,
    /// Worker holding the globally shortest tour.
    pub winner: WorkerResult,
}
