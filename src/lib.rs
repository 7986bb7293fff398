//! Distributed simulated annealing with seed load balancing.
//!
//! A coordinator drives a population of workers, each running its own
//! simulated annealing search over a TSP instance. Work is measured in
//! seeds; workers consume seeds at different rates, so every round the
//! coordinator moves unfinished seeds from overloaded to underloaded
//! workers:
//!
//! - **Balance**: pure fair-share computation and greedy donor → receiver
//!   matching ([`balance::LoadBalancer`]).
//! - **Coordinator**: global temperature schedule, the round loop, and the
//!   final winner selection ([`coordinator::Coordinator`]).
//! - **Collective**: barrier / gather / scatter / sync substrate behind a
//!   trait, with an in-process implementation ([`collective::LocalCollective`]).
//! - **Worker**: what the coordinator needs from a search process
//!   ([`worker::Worker`]).
//! - **TSP**: TSPLIB loading and a 2-opt annealing worker ([`tsp`]).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use u_distanneal::collective::LocalCollective;
//! use u_distanneal::coordinator::{Coordinator, CoordinatorConfig};
//! use u_distanneal::tsp::{TspInstance, TspWorker, TspWorkerConfig};
//!
//! let points = [(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (1.0, 3.0)];
//! let instance = Arc::new(TspInstance::from_points("demo", &points).unwrap());
//! let worker_config = TspWorkerConfig::default().with_moves_per_seed(500).with_seed(1);
//! let workers = TspWorker::population(instance, 3, 12, &worker_config).unwrap();
//!
//! let mut collective = LocalCollective::new(workers, Vec::<u8>::new()).unwrap();
//! let result = Coordinator::run(CoordinatorConfig::default(), &mut collective).unwrap();
//! assert!(result.winner.best_length > 0.0);
//! ```

pub mod balance;
pub mod collective;
pub mod coordinator;
pub mod error;
pub mod tsp;
pub mod worker;

pub use error::{Error, Result};
