use std::{io, path::PathBuf, sync::Arc, time::Instant};

use clap::Parser;
use log::info;

use u_distanneal::{
    collective::LocalCollective,
    coordinator::{Coordinator, CoordinatorConfig},
    tsp::{TspInstance, TspWorker, TspWorkerConfig},
    Result,
};

/// Coordinated simulated annealing over a TSPLIB instance.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TSPLIB file (`EUC_2D` or `EXPLICIT` lower-diagonal)
    instance: PathBuf,
    /// Number of in-process workers
    #[arg(default_value_t = 4)]
    workers: usize,
    /// Seeds in the shared budget, all loaded on worker 1
    #[arg(default_value_t = 64)]
    seeds: u64,
    #[arg(long, env = "SA_INIT_TEMP", default_value_t = 99.0)]
    init_temp: f64,
    /// Geometric decay applied once per round
    #[arg(long, env = "SA_RATIO", default_value_t = 0.999)]
    ratio: f64,
    #[arg(long, env = "SA_MAX_ROUNDS", default_value_t = 1_000_000)]
    max_rounds: usize,
    /// Drop the round limit
    #[arg(long, env = "SA_UNBOUNDED")]
    unbounded: bool,
    /// Abort once the pending total has not fallen for this many rounds
    #[arg(long, env = "SA_STALL_ROUNDS")]
    stall_rounds: Option<usize>,
    /// 2-opt proposals per seed
    #[arg(long, env = "SA_MOVES", default_value_t = 40_000)]
    moves: usize,
    /// Seeds consumed per pass
    #[arg(long, env = "SA_THROUGHPUT", default_value_t = 1)]
    throughput: u64,
    /// Base RNG seed; worker k uses seed + k
    #[arg(long, env = "SA_SEED")]
    seed: Option<u64>,
}

impl Args {
    fn coordinator(&self) -> CoordinatorConfig {
        let mut config = CoordinatorConfig::default()
            .with_initial_temperature(self.init_temp)
            .with_ratio(self.ratio)
            .with_max_rounds(self.max_rounds);
        if self.unbounded {
            config = config.unbounded();
        }
        if let Some(rounds) = self.stall_rounds {
            config = config.with_stall_rounds(rounds);
        }
        config
    }

    fn worker(&self) -> TspWorkerConfig {
        let config = TspWorkerConfig::default()
            .with_moves_per_seed(self.moves)
            .with_throughput(self.throughput);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let instance = Arc::new(TspInstance::load(&args.instance)?);
    info!(
        "{}: {} cities, {} workers, {} seeds",
        instance.name(),
        instance.dimension(),
        args.workers,
        args.seeds
    );

    let population = TspWorker::population(instance, args.workers, args.seeds, &args.worker())?;
    let mut collective = LocalCollective::new(population, io::stdout().lock())?;

    let started = Instant::now();
    let result = Coordinator::run(args.coordinator(), &mut collective)?;

    info!(
        "best length {:.6} from worker {} after {} rounds in {:.2?}",
        result.winner.best_length,
        result.winner.worker_id,
        result.summary.rounds,
        started.elapsed()
    );
    Ok(())
}
