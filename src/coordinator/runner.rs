//! Round loop: temperature schedule plus gather / balance / scatter / sync.
//!
//! # Protocol
//!
//! Every round:
//!
//! 1. Decay the temperature by the configured ratio
//! 2. Gather pending counts (workers finish their pass at that temperature)
//! 3. Zero total: converged, nothing is scattered
//! 4. Otherwise balance, scatter the plan and sync it into the workers
//!
//! The loop is bounded by `max_rounds`, by the temperature reaching the
//! bottom of the `f64` range and, optionally, a stagnation detector on the
//! pending total.

use log::{debug, info, warn};

use super::config::CoordinatorConfig;
use super::selector::FinalSelector;
use super::types::{CoordinatorResult, RoundOutcome, RoundReport, RunSummary};
use crate::balance::LoadBalancer;
use crate::collective::Collective;
use crate::error::{Error, Result};

/// Owned schedule state of the coordinator.
#[derive(Debug, Clone)]
pub struct RoundOrchestrator {
    config: CoordinatorConfig,
    temperature: f64,
    round: usize,
    last_total: Option<u64>,
    stalled: usize,
}

impl RoundOrchestrator {
    /// Creates an orchestrator at the initial temperature.
    pub fn new(config: CoordinatorConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self {
            temperature: config.initial_temperature,
            config,
            round: 0,
            last_total: None,
            stalled: 0,
        })
    }

    /// Temperature of the most recent round (initial temperature before
    /// the first).
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Rounds started so far.
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Runs one round against `collective`.
    pub fn run_round<C: Collective + ?Sized>(&mut self, collective: &mut C) -> Result<RoundOutcome> {
        if let Some(limit) = self.config.max_rounds {
            if self.round >= limit {
                warn!("round limit {limit} reached without convergence");
                return Err(Error::RoundLimit { rounds: self.round });
            }
        }

        // Subnormal products can round back up to the previous value or to
        // zero; either ends the strictly decreasing schedule.
        let next = self.temperature * self.config.ratio;
        if next >= self.temperature || next == 0.0 {
            warn!(
                "temperature {:e} cannot decay further at round {}",
                self.temperature,
                self.round + 1
            );
            return Err(Error::TemperatureUnderflow {
                round: self.round + 1,
            });
        }
        self.temperature = next;
        self.round += 1;

        let loads = collective.gather_loads(self.temperature)?;
        if loads.len() != collective.workers() {
            return Err(Error::Substrate(format!(
                "gathered {} loads from {} workers",
                loads.len(),
                collective.workers()
            )));
        }
        let total = LoadBalancer::total(&loads)?;

        let mut report = RoundReport {
            round: self.round,
            temperature: self.temperature,
            total_pending: total,
            transfers: 0,
            moved: 0,
        };

        if total == 0 {
            debug!(round = self.round; "no pending seeds left");
            return Ok(RoundOutcome::Converged(report));
        }

        self.track_progress(total)?;

        let plan = LoadBalancer::balance(&loads)?;
        report.transfers = plan.transfers().len();
        report.moved = plan.moved();

        collective.scatter(plan.scatter_buffers())?;
        collective.sync_buffer()?;

        debug!(
            round = self.round,
            pending = total,
            transfers = report.transfers,
            moved = report.moved;
            "round rebalanced"
        );
        Ok(RoundOutcome::Rebalanced(report))
    }

    /// Runs rounds until a gather observes zero pending seeds.
    pub fn run<C: Collective + ?Sized>(&mut self, collective: &mut C) -> Result<RunSummary> {
        let mut transfers = 0usize;
        let mut moved = 0u64;

        loop {
            let outcome = self.run_round(collective)?;
            let report = outcome.report();
            transfers += report.transfers;
            moved += report.moved;

            if outcome.is_converged() {
                return Ok(RunSummary {
                    rounds: report.round,
                    final_temperature: report.temperature,
                    transfers,
                    moved,
                });
            }
        }
    }

    fn track_progress(&mut self, total: u64) -> Result<()> {
        let Some(limit) = self.config.stall_rounds else {
            return Ok(());
        };
        match self.last_total {
            Some(last) if total >= last => self.stalled += 1,
            _ => self.stalled = 0,
        }
        self.last_total = Some(total);

        if self.stalled > limit {
            warn!("pending total stuck at {total} for {} rounds", self.stalled);
            return Err(Error::Stalled {
                rounds: self.stalled,
                pending: total,
            });
        }
        Ok(())
    }
}

/// Full coordinator lifecycle: load barrier, round loop, final selection.
pub struct Coordinator;

impl Coordinator {
    /// Drives `collective` from loaded workers to an emitted result.
    pub fn run<C: Collective + ?Sized>(
        config: CoordinatorConfig,
        collective: &mut C,
    ) -> Result<CoordinatorResult> {
        let mut orchestrator = RoundOrchestrator::new(config)?;

        collective.barrier()?;
        info!("finished loading: {} workers", collective.workers());

        let summary = orchestrator.run(collective)?;
        info!(
            "finished computing after {} rounds (T = {:.6}, {} seeds moved)",
            summary.rounds, summary.final_temperature, summary.moved
        );

        let winner = FinalSelector::finish(collective)?;
        info!(
            "worker {} holds the best tour: {}",
            winner.worker_id, winner.best_length
        );

        Ok(CoordinatorResult { summary, winner })
    }
}
