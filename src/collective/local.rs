//! In-process substrate hosting every worker in the coordinator's address
//! space.

use std::io::Write;

use log::{debug, trace};

use super::Collective;
use crate::balance::{Transfer, WorkerId, WorkerLoad};
use crate::error::{Error, Result};
use crate::worker::{Worker, WorkerResult};

/// Runs workers in-process. Local passes execute inside
/// [`gather_loads`](Collective::gather_loads), in parallel with the
/// `parallel` feature.
pub struct LocalCollective<W, O> {
    workers: Vec<W>,
    inbox: Vec<Vec<Transfer>>,
    out: O,
}

impl<W: Worker, O: Write> LocalCollective<W, O> {
    /// Hosts `workers` as participants `1..=workers.len()`; the winner's
    /// output goes to `out`.
    pub fn new(workers: Vec<W>, out: O) -> Result<Self> {
        if workers.is_empty() {
            return Err(Error::NoWorkers);
        }
        let inbox = vec![Vec::new(); workers.len()];
        Ok(Self {
            workers,
            inbox,
            out,
        })
    }

    /// Hosted workers, slot `k` is worker `k + 1`.
    pub fn hosted(&self) -> &[W] {
        &self.workers
    }

    pub fn into_parts(self) -> (Vec<W>, O) {
        (self.workers, self.out)
    }

    fn total(&self) -> u64 {
        self.workers.iter().map(|w| w.pending()).sum()
    }

    fn slot(&self, worker_id: WorkerId) -> Result<usize> {
        if worker_id == 0 || worker_id > self.workers.len() {
            return Err(Error::Substrate(format!(
                "worker {worker_id} is not a participant"
            )));
        }
        Ok(worker_id - 1)
    }

    #[cfg(feature = "parallel")]
    fn run_passes(&mut self, temperature: f64) {
        use rayon::prelude::*;
        self.workers
            .par_iter_mut()
            .for_each(|w| w.anneal(temperature));
    }

    #[cfg(not(feature = "parallel"))]
    fn run_passes(&mut self, temperature: f64) {
        for w in &mut self.workers {
            w.anneal(temperature);
        }
    }
}

impl<W: Worker, O: Write> Collective for LocalCollective<W, O> {
    fn workers(&self) -> usize {
        self.workers.len()
    }

    fn barrier(&mut self) -> Result<()> {
        // All participants share one thread of control.
        trace!("barrier");
        Ok(())
    }

    fn gather_loads(&mut self, temperature: f64) -> Result<Vec<WorkerLoad>> {
        if self.inbox.iter().any(|b| !b.is_empty()) {
            return Err(Error::Substrate(
                "gather issued before scattered instructions were synced".into(),
            ));
        }
        self.run_passes(temperature);
        Ok(self
            .workers
            .iter()
            .enumerate()
            .map(|(slot, w)| WorkerLoad::new(slot + 1, w.pending()))
            .collect())
    }

    fn scatter(&mut self, outboxes: Vec<Vec<Transfer>>) -> Result<()> {
        if self.inbox.iter().any(|b| !b.is_empty()) {
            return Err(Error::Substrate(
                "scatter issued before previous instructions were synced".into(),
            ));
        }
        if outboxes.len() != self.workers.len() {
            return Err(Error::Substrate(format!(
                "scatter of {} outboxes to {} workers",
                outboxes.len(),
                self.workers.len()
            )));
        }
        for (slot, outbox) in outboxes.iter().enumerate() {
            let source = slot + 1;
            for t in outbox {
                if t.source != source {
                    return Err(Error::invariant(format!(
                        "outbox of worker {source} carries a transfer from worker {}",
                        t.source
                    )));
                }
                if t.amount == 0 || t.destination == source {
                    return Err(Error::invariant(format!("degenerate transfer {t:?}")));
                }
                self.slot(t.destination)?;
            }
        }
        self.inbox = outboxes;
        Ok(())
    }

    fn sync_buffer(&mut self) -> Result<()> {
        let before = self.total();
        let inbox = std::mem::replace(&mut self.inbox, vec![Vec::new(); self.workers.len()]);

        for t in inbox.iter().flatten() {
            let src = t.source - 1;
            let dst = t.destination - 1;
            let available = self.workers[src].pending();
            if available < t.amount {
                return Err(Error::invariant(format!(
                    "worker {} asked to donate {} seeds but holds {available}",
                    t.source, t.amount
                )));
            }
            self.workers[src].donate(t.amount);
            self.workers[dst].receive(t.amount);
        }

        let after = self.total();
        if before != after {
            return Err(Error::invariant(format!(
                "sync changed the seed total from {before} to {after}"
            )));
        }
        debug!(total = after; "buffer synced");
        Ok(())
    }

    fn gather_results(&mut self) -> Result<Vec<WorkerResult>> {
        Ok(self
            .workers
            .iter()
            .enumerate()
            .map(|(slot, w)| WorkerResult {
                worker_id: slot + 1,
                best_length: w.best_length(),
            })
            .collect())
    }

    fn emit_output(&mut self, winner: WorkerId) -> Result<()> {
        let slot = self.slot(winner)?;
        self.workers[slot].output(&mut self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{Coordinator, CoordinatorConfig};
    use crate::tsp::{TspInstance, TspWorker, TspWorkerConfig};
    use std::io;
    use std::sync::Arc;

    /// Consumes a fixed number of seeds per pass.
    struct Countdown {
        pending: u64,
        rate: u64,
        length: f64,
        passes: Vec<f64>,
    }

    impl Countdown {
        fn new(pending: u64, rate: u64, length: f64) -> Self {
            Self {
                pending,
                rate,
                length,
                passes: Vec::new(),
            }
        }
    }

    impl Worker for Countdown {
        fn pending(&self) -> u64 {
            self.pending
        }
        fn anneal(&mut self, temperature: f64) {
            self.passes.push(temperature);
            self.pending = self.pending.saturating_sub(self.rate);
        }
        fn donate(&mut self, amount: u64) {
            self.pending -= amount;
        }
        fn receive(&mut self, amount: u64) {
            self.pending += amount;
        }
        fn best_length(&self) -> f64 {
            self.length
        }
        fn output(&self, out: &mut dyn Write) -> io::Result<()> {
            writeln!(out, "best {}", self.length)
        }
    }

    fn transfer(source: WorkerId, destination: WorkerId, amount: u64) -> Transfer {
        Transfer {
            source,
            destination,
            amount,
        }
    }

    #[test]
    fn test_empty_population_rejected() {
        let result = LocalCollective::<Countdown, _>::new(Vec::new(), Vec::<u8>::new());
        assert!(matches!(result, Err(Error::NoWorkers)));
    }

    #[test]
    fn test_gather_runs_one_pass_per_worker() {
        let workers = vec![Countdown::new(5, 2, 1.0), Countdown::new(1, 2, 1.0)];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        let loads = c.gather_loads(7.5).unwrap();

        assert_eq!(loads, vec![WorkerLoad::new(1, 3), WorkerLoad::new(2, 0)]);
        assert!(c.hosted().iter().all(|w| w.passes == vec![7.5]));
    }

    #[test]
    fn test_sync_moves_seeds() {
        let workers = vec![Countdown::new(6, 0, 1.0), Countdown::new(0, 0, 1.0)];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        c.scatter(vec![vec![transfer(1, 2, 3)], vec![]]).unwrap();
        c.sync_buffer().unwrap();

        let loads = c.gather_loads(1.0).unwrap();
        assert_eq!(loads, vec![WorkerLoad::new(1, 3), WorkerLoad::new(2, 3)]);
    }

    #[test]
    fn test_gather_before_sync_is_rejected() {
        let workers = vec![Countdown::new(2, 0, 1.0), Countdown::new(0, 0, 1.0)];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        c.scatter(vec![vec![transfer(1, 2, 1)], vec![]]).unwrap();
        assert!(matches!(c.gather_loads(1.0), Err(Error::Substrate(_))));
    }

    #[test]
    fn test_second_scatter_before_sync_is_rejected() {
        let workers = vec![Countdown::new(4, 0, 1.0), Countdown::new(0, 0, 1.0)];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        c.scatter(vec![vec![transfer(1, 2, 2)], vec![]]).unwrap();
        assert!(matches!(
            c.scatter(vec![vec![transfer(1, 2, 1)], vec![]]),
            Err(Error::Substrate(_))
        ));

        // The first plan survives and is the one committed.
        c.sync_buffer().unwrap();
        let loads = c.gather_loads(1.0).unwrap();
        assert_eq!(loads, vec![WorkerLoad::new(1, 2), WorkerLoad::new(2, 2)]);

        // An empty scatter leaves nothing to sync and never blocks the next one.
        c.scatter(vec![vec![], vec![]]).unwrap();
        c.scatter(vec![vec![transfer(1, 2, 1)], vec![]]).unwrap();
    }

    #[test]
    fn test_scatter_validates_outboxes() {
        let workers = vec![Countdown::new(2, 0, 1.0), Countdown::new(0, 0, 1.0)];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        assert!(c.scatter(vec![vec![]]).is_err());
        assert!(c.scatter(vec![vec![], vec![transfer(1, 2, 1)]]).is_err());
        assert!(c.scatter(vec![vec![transfer(1, 2, 0)], vec![]]).is_err());
        assert!(c.scatter(vec![vec![transfer(1, 3, 1)], vec![]]).is_err());
    }

    #[test]
    fn test_overdraft_is_fatal() {
        let workers = vec![Countdown::new(1, 0, 1.0), Countdown::new(0, 0, 1.0)];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        c.scatter(vec![vec![transfer(1, 2, 4)], vec![]]).unwrap();
        assert!(matches!(c.sync_buffer(), Err(Error::Invariant(_))));
    }

    #[test]
    fn test_emit_output_writes_winner_only() {
        let workers = vec![Countdown::new(0, 0, 9.0), Countdown::new(0, 0, 4.0)];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        c.emit_output(2).unwrap();
        assert!(c.emit_output(3).is_err());

        let (_, out) = c.into_parts();
        assert_eq!(String::from_utf8(out).unwrap(), "best 4\n");
    }

    #[test]
    fn test_coordinated_run_drains_every_worker() {
        let workers = vec![
            Countdown::new(30, 1, 8.0),
            Countdown::new(0, 3, 2.0),
            Countdown::new(0, 2, 5.0),
        ];
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();
        let config = CoordinatorConfig::default()
            .with_initial_temperature(10.0)
            .with_ratio(0.9);

        let result = Coordinator::run(config, &mut c).unwrap();

        assert_eq!(result.winner.worker_id, 2);
        assert!(result.summary.moved > 0);
        for w in c.hosted() {
            assert_eq!(w.pending, 0);
            assert!(w.passes.windows(2).all(|p| p[1] < p[0]));
            assert_eq!(w.passes.len(), result.summary.rounds);
        }
        let (_, out) = c.into_parts();
        assert_eq!(String::from_utf8(out).unwrap(), "best 2\n");
    }

    #[test]
    fn test_tsp_population_converges() {
        let points: Vec<(f64, f64)> = (0..10)
            .map(|k| ((k * 7 % 10) as f64, (k * 3 % 10) as f64))
            .collect();
        let instance = Arc::new(TspInstance::from_points("grid", &points).unwrap());
        let config = TspWorkerConfig::default()
            .with_moves_per_seed(1_000)
            .with_seed(3);
        let workers = TspWorker::population(instance, 4, 20, &config).unwrap();
        let mut c = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();

        let result = Coordinator::run(CoordinatorConfig::default(), &mut c).unwrap();

        let best = c
            .hosted()
            .iter()
            .map(|w| w.best_length())
            .fold(f64::INFINITY, f64::min);
        assert_eq!(result.winner.best_length, best);
        assert!(c.hosted().iter().all(|w| w.pending() == 0));

        let (_, out) = c.into_parts();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3 + 10);
    }
}
