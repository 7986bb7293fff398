//! Annealing worker for the TSP.
//!
//! One seed is one batch of block-reversal (2-opt) proposals evaluated at
//! the round temperature with the Metropolis criterion. The worker keeps
//! annealing the same tour across rounds and remembers the best tour seen.

use std::io::{self, Write};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::worker::Worker;

/// Per-worker search parameters.
///
/// # Examples
///
/// ```
/// use u_distanneal::tsp::TspWorkerConfig;
///
/// let config = TspWorkerConfig::default()
///     .with_moves_per_seed(5_000)
///     .with_throughput(2)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TspWorkerConfig {
    /// Proposals evaluated per seed.
    pub moves_per_seed: usize,

    /// Seeds consumed by one pass.
    pub throughput: u64,

    /// Base random seed. Worker `k` uses `seed + k`.
    pub seed: Option<u64>,
}

impl Default for TspWorkerConfig {
    fn default() -> Self {
        Self {
            moves_per_seed: 40_000,
            throughput: 1,
            seed: None,
        }
    }
}

impl TspWorkerConfig {
    pub fn with_moves_per_seed(mut self, n: usize) -> Self {
        self.moves_per_seed = n;
        self
    }

    pub fn with_throughput(mut self, seeds: u64) -> Self {
        self.throughput = seeds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.moves_per_seed == 0 {
            return Err("moves_per_seed must be positive".into());
        }
        if self.throughput == 0 {
            return Err("throughput must be positive".into());
        }
        Ok(())
    }
}

/// Simulated annealing worker over a shared [`TspInstance`].
///
/// [`TspInstance`]: super::TspInstance
#[derive(Debug, Clone)]
pub struct TspWorker {
    instance: Arc<super::TspInstance>,
    config: TspWorkerConfig,
    rng: StdRng,

    tour: Vec<usize>,
    length: f64,
    best_tour: Vec<usize>,
    best_length: f64,

    pending: u64,
    accepted_moves: u64,
    improving_moves: u64,
}

impl TspWorker {
    /// Creates worker `worker_id` holding `pending` seeds, starting from a
    /// random tour.
    pub fn new(
        worker_id: usize,
        instance: Arc<super::TspInstance>,
        pending: u64,
        config: TspWorkerConfig,
    ) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
            None => StdRng::seed_from_u64(rand::random()),
        };

        let mut tour: Vec<usize> = (0..instance.dimension()).collect();
        tour.shuffle(&mut rng);
        let length = instance.tour_length(&tour);

        Ok(Self {
            best_tour: tour.clone(),
            best_length: length,
            instance,
            config,
            rng,
            tour,
            length,
            pending,
            accepted_moves: 0,
            improving_moves: 0,
        })
    }

    /// Builds `workers` workers with ids `1..=workers`. The whole budget of
    /// `seeds` starts on worker 1; the first round spreads it.
    pub fn population(
        instance: Arc<super::TspInstance>,
        workers: usize,
        seeds: u64,
        config: &TspWorkerConfig,
    ) -> Result<Vec<Self>> {
        if workers == 0 {
            return Err(Error::NoWorkers);
        }
        (1..=workers)
            .map(|id| {
                let pending = if id == 1 { seeds } else { 0 };
                Self::new(id, Arc::clone(&instance), pending, config.clone())
            })
            .collect()
    }

    /// Best tour found so far, as 0-based city indices.
    pub fn best_tour(&self) -> &[usize] {
        &self.best_tour
    }

    /// Length of the tour currently being annealed.
    pub fn current_length(&self) -> f64 {
        self.length
    }

    pub fn accepted_moves(&self) -> u64 {
        self.accepted_moves
    }

    pub fn improving_moves(&self) -> u64 {
        self.improving_moves
    }

    /// Processes a single seed at `temperature`.
    fn relax(&mut self, temperature: f64) {
        let n = self.tour.len();
        // Every tour over three or fewer cities has the same length.
        if n < 4 {
            return;
        }

        for _ in 0..self.config.moves_per_seed {
            let a = self.rng.random_range(0..n);
            let mut b = self.rng.random_range(0..n - 1);
            if b >= a {
                b += 1;
            }
            let (p, q) = if a < b { (a, b) } else { (b, a) };
            // Reversing the whole tour leaves its length unchanged.
            if p == 0 && q == n - 1 {
                continue;
            }

            let p1 = (p + n - 1) % n;
            let q1 = (q + 1) % n;
            let (tp, tq, tp1, tq1) = (self.tour[p], self.tour[q], self.tour[p1], self.tour[q1]);
            let d = |i, j| self.instance.distance(i, j);
            let delta = d(tp, tq1) + d(tp1, tq) - d(tp1, tp) - d(tq, tq1);

            // Metropolis acceptance criterion
            let accept = if delta < 0.0 {
                self.improving_moves += 1;
                true
            } else if temperature > 0.0 {
                let probability = (-delta / temperature).exp();
                self.rng.random_range(0.0..1.0) < probability
            } else {
                false
            };

            if accept {
                self.tour[p..=q].reverse();
                self.length += delta;
                self.accepted_moves += 1;

                if self.length < self.best_length {
                    self.best_length = self.length;
                    self.best_tour.copy_from_slice(&self.tour);
                }
            }
        }

        // Resync with the exact length so rounding does not accumulate.
        self.length = self.instance.tour_length(&self.tour);
        if self.length < self.best_length {
            self.best_length = self.length;
            self.best_tour.copy_from_slice(&self.tour);
        }
    }
}

impl Worker for TspWorker {
    fn pending(&self) -> u64 {
        self.pending
    }

    fn anneal(&mut self, temperature: f64) {
        let batch = self.pending.min(self.config.throughput);
        for _ in 0..batch {
            self.relax(temperature);
        }
        self.pending -= batch;
    }

    fn donate(&mut self, amount: u64) {
        self.pending -= amount;
    }

    fn receive(&mut self, amount: u64) {
        self.pending += amount;
    }

    fn best_length(&self) -> f64 {
        self.best_length
    }

    fn output(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "instance: {}", self.instance.name())?;
        writeln!(out, "shortest length: {:.6}", self.best_length)?;
        writeln!(out, "tour:")?;
        for city in &self.best_tour {
            writeln!(out, "{}", city + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsp::TspInstance;

    /// Cities on a circle: the optimum is the polygon perimeter.
    fn circle(n: usize) -> Arc<TspInstance> {
        let points: Vec<(f64, f64)> = (0..n)
            .map(|k| {
                let angle = 2.0 * std::f64::consts::PI * k as f64 / n as f64;
                (10.0 * angle.cos(), 10.0 * angle.sin())
            })
            .collect();
        Arc::new(TspInstance::from_points("circle", &points).unwrap())
    }

    fn perimeter(n: usize) -> f64 {
        let side = 2.0 * 10.0 * (std::f64::consts::PI / n as f64).sin();
        side * n as f64
    }

    fn is_permutation(tour: &[usize], n: usize) -> bool {
        let mut sorted = tour.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    fn config() -> TspWorkerConfig {
        TspWorkerConfig::default()
            .with_moves_per_seed(2_000)
            .with_seed(42)
    }

    #[test]
    fn test_anneal_consumes_throughput() {
        let mut w = TspWorker::new(1, circle(8), 5, config().with_throughput(2)).unwrap();

        w.anneal(10.0);
        assert_eq!(w.pending(), 3);
        w.anneal(10.0);
        w.anneal(10.0);
        assert_eq!(w.pending(), 0);
        w.anneal(10.0);
        assert_eq!(w.pending(), 0);
    }

    #[test]
    fn test_finds_circle_optimum() {
        let n = 12;
        let mut w = TspWorker::new(1, circle(n), 200, config()).unwrap();

        let mut temperature = 10.0;
        while w.pending() > 0 {
            temperature *= 0.95;
            w.anneal(temperature);
        }

        assert!(is_permutation(w.best_tour(), n));
        assert!(
            w.best_length() < perimeter(n) + 1e-6,
            "expected {}, got {}",
            perimeter(n),
            w.best_length()
        );
        assert!(w.improving_moves() > 0);
        assert!(w.accepted_moves() >= w.improving_moves());
    }

    #[test]
    fn test_best_length_matches_best_tour() {
        let instance = circle(15);
        let mut w = TspWorker::new(3, Arc::clone(&instance), 10, config()).unwrap();
        while w.pending() > 0 {
            w.anneal(5.0);
        }

        let exact = instance.tour_length(w.best_tour());
        assert!((exact - w.best_length()).abs() < 1e-6);
        assert!(w.best_length() <= w.current_length() + 1e-9);
    }

    #[test]
    fn test_same_seed_same_search() {
        let run = || {
            let mut w = TspWorker::new(2, circle(10), 4, config()).unwrap();
            while w.pending() > 0 {
                w.anneal(1.0);
            }
            w.best_tour().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_tiny_instances_are_stable() {
        let points = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let instance = Arc::new(TspInstance::from_points("tri", &points).unwrap());
        let mut w = TspWorker::new(1, instance, 2, config()).unwrap();

        w.anneal(1.0);
        w.anneal(1.0);
        assert_eq!(w.pending(), 0);
        assert!(is_permutation(w.best_tour(), 3));
    }

    #[test]
    fn test_donate_and_receive() {
        let mut w = TspWorker::new(1, circle(5), 6, config()).unwrap();
        w.donate(4);
        assert_eq!(w.pending(), 2);
        w.receive(1);
        assert_eq!(w.pending(), 3);
    }

    #[test]
    fn test_population_puts_budget_on_first_worker() {
        let workers = TspWorker::population(circle(6), 3, 9, &config()).unwrap();
        let pending: Vec<u64> = workers.iter().map(|w| w.pending()).collect();
        assert_eq!(pending, vec![9, 0, 0]);
        assert!(TspWorker::population(circle(6), 0, 9, &config()).is_err());
    }

    #[test]
    fn test_output_is_one_based() {
        let w = TspWorker::new(1, circle(4), 0, config()).unwrap();
        let mut out = Vec::<u8>::new();
        w.output(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let cities: Vec<usize> = text
            .lines()
            .skip(3)
            .map(|l| l.parse().unwrap())
            .collect();
        let mut sorted = cities.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4]);
        assert!(text.starts_with("instance: circle\nshortest length: "));
    }

    #[test]
    fn test_invalid_config() {
        let result = TspWorker::new(1, circle(4), 1, config().with_throughput(0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
